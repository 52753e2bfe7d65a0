//! Entity domain types
//!
//! An entity is one controllable/observable attribute of the device. Its
//! kind is a closed enum: each kind carries its own options, state and
//! patch shape, so wire encoding is matched exhaustively instead of
//! branching on a device-class string.

use heapless::String;

use crate::device::DeviceIdentity;
use crate::error::RegistryError;
use crate::{MAX_TOPIC_LEN, topic};

/// RGB color (domain type)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Supported color modes (domain type)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    OnOff,
}

impl ColorMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ColorMode::Rgb => "rgb",
            ColorMode::OnOff => "onoff",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rgb" => Some(ColorMode::Rgb),
            "onoff" => Some(ColorMode::OnOff),
            _ => None,
        }
    }
}

/// Discovery options for a light entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightOptions {
    pub color_mode: bool,
    pub supported_color_modes: &'static [ColorMode],
    pub brightness: bool,
}

impl LightOptions {
    /// RGB light without a brightness channel
    pub const fn rgb() -> Self {
        Self {
            color_mode: true,
            supported_color_modes: &[ColorMode::Rgb],
            brightness: false,
        }
    }
}

/// Light state (domain type)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightState {
    pub on: bool,
    pub brightness: Option<u8>,
    pub color_mode: Option<ColorMode>,
    pub color: Option<RgbColor>,
}

impl LightState {
    pub const fn on() -> Self {
        Self {
            on: true,
            brightness: None,
            color_mode: None,
            color: None,
        }
    }

    pub const fn off() -> Self {
        Self {
            on: false,
            brightness: None,
            color_mode: None,
            color: None,
        }
    }

    #[must_use]
    pub const fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    #[must_use]
    pub const fn with_rgb(mut self, r: u8, g: u8, b: u8) -> Self {
        self.color = Some(RgbColor::new(r, g, b));
        self.color_mode = Some(ColorMode::Rgb);
        self
    }
}

/// Partial light state decoded from a command or produced locally.
/// Unset fields leave the current state untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightPatch {
    pub on: Option<bool>,
    pub brightness: Option<u8>,
    pub color_mode: Option<ColorMode>,
    pub color: Option<RgbColor>,
}

/// Entity kind tag plus per-kind discovery options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityProfile {
    Switch,
    Light(LightOptions),
}

impl EntityProfile {
    /// Wire component tag used in topics and discovery documents.
    pub const fn component(self) -> &'static str {
        match self {
            EntityProfile::Switch => "switch",
            EntityProfile::Light(_) => "light",
        }
    }
}

/// Current state, tagged by entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Switch { on: bool },
    Light(LightState),
}

impl EntityState {
    pub fn is_on(&self) -> bool {
        match self {
            EntityState::Switch { on } => *on,
            EntityState::Light(light) => light.on,
        }
    }

    /// Key-wise merge: set fields overwrite, unset fields are retained.
    /// A patch of the other kind is ignored; the registry never produces
    /// one.
    pub fn merge(&mut self, patch: &EntityPatch) {
        match (self, patch) {
            (EntityState::Switch { on }, EntityPatch::Switch { on: new_on }) => *on = *new_on,
            (EntityState::Light(state), EntityPatch::Light(patch)) => {
                if let Some(on) = patch.on {
                    state.on = on;
                }
                if let Some(brightness) = patch.brightness {
                    state.brightness = Some(brightness);
                }
                if let Some(color_mode) = patch.color_mode {
                    state.color_mode = Some(color_mode);
                }
                if let Some(color) = patch.color {
                    state.color = Some(color);
                }
            }
            _ => {}
        }
    }
}

/// Partial state update, tagged by entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPatch {
    Switch { on: bool },
    Light(LightPatch),
}

/// Construction recipe passed to `Registry::add_entity`.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: EntityKind,
}

/// Kind selector with per-kind options and initial state.
#[derive(Debug, Clone, Copy)]
pub enum EntityKind {
    Switch {
        initial_on: bool,
    },
    Light {
        options: LightOptions,
        initial: LightState,
    },
}

impl EntityDescriptor {
    pub const fn switch(name: &'static str, description: &'static str, initial_on: bool) -> Self {
        Self {
            name,
            description,
            kind: EntityKind::Switch { initial_on },
        }
    }

    pub const fn light(
        name: &'static str,
        description: &'static str,
        options: LightOptions,
        initial: LightState,
    ) -> Self {
        Self {
            name,
            description,
            kind: EntityKind::Light { options, initial },
        }
    }
}

/// One registered entity with its derived topics.
///
/// The three topics are computed once at construction and never change for
/// the lifetime of the entity.
#[derive(Debug, Clone)]
pub struct Entity {
    name: &'static str,
    description: &'static str,
    profile: EntityProfile,
    state: EntityState,
    topic_config: String<MAX_TOPIC_LEN>,
    topic_command: String<MAX_TOPIC_LEN>,
    topic_state: String<MAX_TOPIC_LEN>,
}

impl Entity {
    pub(crate) fn new(
        identity: &DeviceIdentity,
        descriptor: &EntityDescriptor,
    ) -> Result<Self, RegistryError> {
        let (profile, state) = match descriptor.kind {
            EntityKind::Switch { initial_on } => {
                (EntityProfile::Switch, EntityState::Switch { on: initial_on })
            }
            EntityKind::Light { options, initial } => {
                (EntityProfile::Light(options), EntityState::Light(initial))
            }
        };
        let component = profile.component();
        Ok(Self {
            name: descriptor.name,
            description: descriptor.description,
            profile,
            state,
            topic_config: topic::entity_topic(identity, component, descriptor.name, "config")?,
            topic_command: topic::entity_topic(identity, component, descriptor.name, "set")?,
            topic_state: topic::entity_topic(identity, component, descriptor.name, "state")?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn profile(&self) -> EntityProfile {
        self.profile
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    pub fn topic_config(&self) -> &str {
        &self.topic_config
    }

    pub fn topic_command(&self) -> &str {
        &self.topic_command
    }

    pub fn topic_state(&self) -> &str {
        &self.topic_state
    }

    pub(crate) fn apply(&mut self, patch: &EntityPatch) {
        self.state.merge(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_merge_overwrites_set_fields_and_keeps_the_rest() {
        let mut state = EntityState::Light(LightState::on().with_rgb(0, 255, 0));
        state.merge(&EntityPatch::Light(LightPatch {
            brightness: Some(128),
            ..LightPatch::default()
        }));

        let EntityState::Light(light) = state else {
            panic!("kind changed");
        };
        assert!(light.on);
        assert_eq!(light.brightness, Some(128));
        assert_eq!(light.color, Some(RgbColor::new(0, 255, 0)));
        assert_eq!(light.color_mode, Some(ColorMode::Rgb));
    }

    #[test]
    fn switch_merge_replaces_state() {
        let mut state = EntityState::Switch { on: true };
        state.merge(&EntityPatch::Switch { on: false });
        assert!(!state.is_on());
    }

    #[test]
    fn mismatched_patch_kind_is_ignored() {
        let mut state = EntityState::Switch { on: true };
        state.merge(&EntityPatch::Light(LightPatch {
            on: Some(false),
            ..LightPatch::default()
        }));
        assert!(state.is_on());
    }
}
