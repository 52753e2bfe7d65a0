//! Entity set and local intents
//!
//! The clock mirrors three entities: the `power` switch (matrix on/off),
//! the `seconds` switch (show the seconds group) and the `date_rgb` light
//! (date row visibility and tint). This module defines the set, applies
//! local button intents and projects entity state into the flags the
//! display scene consumes.

use log::warn;
use matrixclock_hass::{
    EntityDescriptor, EntityPatch, EntityState, LightOptions, LightState, RegistryError,
};
use matrixclock_link::Outbox;
use smart_leds::RGB8;

use crate::context::EntityRegistry;

pub(crate) const POWER: &str = "power";
pub(crate) const SECONDS: &str = "seconds";
pub(crate) const DATE_RGB: &str = "date_rgb";

const DATE_DEFAULT_COLOR: RGB8 = RGB8::new(0, 255, 0);

/// Register the full entity set. Runs once, on the first established
/// broker session; reconnects go through `advertise_entities` instead.
pub(crate) fn register_entities(
    registry: &mut EntityRegistry,
    out: &mut dyn Outbox,
) -> Result<(), RegistryError> {
    registry.add_entity(&EntityDescriptor::switch(POWER, "Power", true), out)?;
    registry.add_entity(
        &EntityDescriptor::switch(SECONDS, "Show seconds", false),
        out,
    )?;
    registry.add_entity(
        &EntityDescriptor::light(
            DATE_RGB,
            "Date color",
            LightOptions::rgb(),
            LightState::on().with_rgb(0, 255, 0).with_brightness(255),
        ),
        out,
    )?;
    Ok(())
}

/// Intents originating on the device itself.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LocalCommand {
    TogglePower,
}

pub(crate) fn apply_local_command(
    command: LocalCommand,
    registry: &mut EntityRegistry,
    out: &mut dyn Outbox,
) {
    match command {
        LocalCommand::TogglePower => {
            let on = registry
                .entity(POWER)
                .is_some_and(|entity| entity.state().is_on());
            if let Err(error) = registry.update(POWER, &EntityPatch::Switch { on: !on }, out) {
                warn!("entities: power toggle failed: {}", error);
            }
        }
    }
}

/// Entity state projected into what the scene needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SceneFlags {
    pub power_on: bool,
    pub show_seconds: bool,
    pub show_date: bool,
    pub date_color: RGB8,
}

pub(crate) fn scene_flags(registry: &EntityRegistry) -> SceneFlags {
    // Until the entity set is registered (first broker contact), render as
    // if everything were at its defaults
    let power_on = registry
        .entity(POWER)
        .is_none_or(|entity| entity.state().is_on());
    let show_seconds = registry
        .entity(SECONDS)
        .is_some_and(|entity| entity.state().is_on());

    let (show_date, date_color) = match registry.entity(DATE_RGB).map(matrixclock_hass::Entity::state) {
        Some(EntityState::Light(light)) => {
            let color = light
                .color
                .map_or(DATE_DEFAULT_COLOR, |c| RGB8::new(c.r, c.g, c.b));
            (light.on, color)
        }
        _ => (true, DATE_DEFAULT_COLOR),
    };

    SceneFlags {
        power_on,
        show_seconds,
        show_date,
        date_color,
    }
}
