//! Entity registry
//!
//! Owns the fixed set of entities and keeps local state and broker state
//! convergent: discovery announcement on registration and reconnect, state
//! publishes on every local or remote change, command decoding for inbound
//! messages.
//!
//! Every operation is synchronous and runs to completion; wire traffic is
//! emitted into an [`Outbox`] and the async session layer is the single
//! observer of transport failures.

use heapless::Vec;
use log::{debug, warn};
use matrixclock_link::Outbox;

use crate::MAX_DOCUMENT_LEN;
use crate::device::DeviceIdentity;
use crate::discovery;
use crate::entity::{Entity, EntityDescriptor, EntityPatch};
use crate::error::RegistryError;
use crate::payload;
use crate::topic;

/// Registry of up to `N` entities, keyed by name.
///
/// Registry sizes are single-digit in practice, so lookups are linear
/// scans.
pub struct Registry<const N: usize> {
    identity: DeviceIdentity,
    entities: Vec<Entity, N>,
    buf: [u8; MAX_DOCUMENT_LEN],
}

impl<const N: usize> Registry<N> {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            entities: Vec::new(),
            buf: [0u8; MAX_DOCUMENT_LEN],
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Register a new entity: announce it (retained discovery publish plus
    /// command subscribe) and publish its initial state.
    ///
    /// Names must be unique; a duplicate is rejected rather than silently
    /// replacing the existing entity.
    pub fn add_entity(
        &mut self,
        descriptor: &EntityDescriptor,
        out: &mut dyn Outbox,
    ) -> Result<&Entity, RegistryError> {
        if self.entity(descriptor.name).is_some() {
            return Err(RegistryError::DuplicateName);
        }
        let entity = Entity::new(&self.identity, descriptor)?;
        self.entities
            .push(entity)
            .map_err(|_| RegistryError::CapacityExceeded)?;

        let index = self.entities.len() - 1;
        self.configure_at(index, out)?;
        self.publish_state_at(index, out)?;
        debug!("registry: entity '{}' registered", descriptor.name);
        Ok(&self.entities[index])
    }

    /// Re-announce one entity. Idempotent; safe to call any number of
    /// times, which reconnect handling relies on.
    pub fn configure(&mut self, name: &str, out: &mut dyn Outbox) -> Result<(), RegistryError> {
        let index = self.index_of(name).ok_or(RegistryError::UnknownEntity)?;
        self.configure_at(index, out)
    }

    /// Merge `patch` into the entity state and publish the result.
    pub fn update(
        &mut self,
        name: &str,
        patch: &EntityPatch,
        out: &mut dyn Outbox,
    ) -> Result<(), RegistryError> {
        let index = self.index_of(name).ok_or(RegistryError::UnknownEntity)?;
        self.entities[index].apply(patch);
        self.publish_state_at(index, out)
    }

    /// Process one inbound message.
    ///
    /// Messages for topics no entity subscribed to and messages with
    /// malformed payloads are silently discarded; neither is an error
    /// condition, and a decode failure must never take the device down.
    pub fn process_message(&mut self, topic: &str, message: &[u8], out: &mut dyn Outbox) {
        let Some(index) = self
            .entities
            .iter()
            .position(|entity| entity.topic_command() == topic)
        else {
            debug!("registry: no entity for topic '{}', discarded", topic);
            return;
        };

        match payload::decode_command(self.entities[index].profile(), message) {
            Ok(patch) => {
                self.entities[index].apply(&patch);
                if let Err(error) = self.publish_state_at(index, out) {
                    warn!(
                        "registry: state publish for '{}' failed: {}",
                        self.entities[index].name(),
                        error
                    );
                }
            }
            Err(_) => {
                debug!("registry: malformed payload on '{}', discarded", topic);
            }
        }
    }

    /// Re-announce every entity. Run after each reconnect, since the broker
    /// may have discarded retained discovery state while the link was down.
    pub fn advertise_entities(&mut self, out: &mut dyn Outbox) {
        for index in 0..self.entities.len() {
            if let Err(error) = self.configure_at(index, out) {
                warn!(
                    "registry: re-announce of '{}' failed: {}",
                    self.entities[index].name(),
                    error
                );
            }
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|entity| entity.name() == name)
    }

    fn configure_at(&mut self, index: usize, out: &mut dyn Outbox) -> Result<(), RegistryError> {
        let entity = &self.entities[index];
        let full_name = topic::full_name(&self.identity, entity.name())?;
        let len = discovery::encode(&self.identity, entity, &full_name, &mut self.buf)?;
        out.publish(entity.topic_config(), &self.buf[..len], true);
        out.subscribe(entity.topic_command());
        Ok(())
    }

    fn publish_state_at(&mut self, index: usize, out: &mut dyn Outbox) -> Result<(), RegistryError> {
        let entity = &self.entities[index];
        let len = payload::encode_state(entity.state(), &mut self.buf)?;
        out.publish(entity.topic_state(), &self.buf[..len], true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::host_id_from_mac;
    use crate::entity::{EntityState, LightOptions, LightPatch, LightState, RgbColor};
    use heapless::String;

    const MAC: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0x00, 0x00];

    /// Records emitted traffic for assertions.
    #[derive(Default)]
    struct TestOutbox {
        publishes: std::vec::Vec<(String<96>, std::vec::Vec<u8>, bool)>,
        subscribes: std::vec::Vec<String<96>>,
    }

    impl TestOutbox {
        fn publishes_to(&self, topic: &str) -> usize {
            self.publishes
                .iter()
                .filter(|(t, _, _)| t.as_str() == topic)
                .count()
        }

        fn last_payload_to(&self, topic: &str) -> Option<&[u8]> {
            self.publishes
                .iter()
                .rev()
                .find(|(t, _, _)| t.as_str() == topic)
                .map(|(_, payload, _)| payload.as_slice())
        }
    }

    impl Outbox for TestOutbox {
        fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) {
            self.publishes
                .push((String::try_from(topic).unwrap(), payload.to_vec(), retain));
        }

        fn subscribe(&mut self, topic: &str) {
            self.subscribes.push(String::try_from(topic).unwrap());
        }
    }

    fn registry() -> Registry<4> {
        Registry::new(DeviceIdentity::new(host_id_from_mac(&MAC), "ledclock"))
    }

    fn registry_with_power(initial_on: bool) -> (Registry<4>, TestOutbox) {
        let mut registry = registry();
        let mut out = TestOutbox::default();
        registry
            .add_entity(&EntityDescriptor::switch("power", "Power", initial_on), &mut out)
            .unwrap();
        (registry, out)
    }

    #[test]
    fn add_entity_derives_fixed_topics() {
        let (registry, _) = registry_with_power(true);
        let entity = registry.entity("power").unwrap();
        assert_eq!(
            entity.topic_config(),
            "homeassistant/switch/ledclock_aabbccdd_power/config"
        );
        assert_eq!(
            entity.topic_command(),
            "homeassistant/switch/ledclock_aabbccdd_power/set"
        );
        assert_eq!(
            entity.topic_state(),
            "homeassistant/switch/ledclock_aabbccdd_power/state"
        );
    }

    #[test]
    fn topics_survive_state_changes() {
        let (mut registry, mut out) = registry_with_power(true);
        let before: String<96> =
            String::try_from(registry.entity("power").unwrap().topic_state()).unwrap();

        registry
            .update("power", &EntityPatch::Switch { on: false }, &mut out)
            .unwrap();
        registry.process_message(
            "homeassistant/switch/ledclock_aabbccdd_power/set",
            b"ON",
            &mut out,
        );

        assert_eq!(registry.entity("power").unwrap().topic_state(), before.as_str());
    }

    #[test]
    fn add_entity_announces_and_publishes_initial_state() {
        let (_, out) = registry_with_power(true);
        assert_eq!(
            out.publishes_to("homeassistant/switch/ledclock_aabbccdd_power/config"),
            1
        );
        assert_eq!(
            out.subscribes,
            ["homeassistant/switch/ledclock_aabbccdd_power/set"]
        );
        assert_eq!(
            out.last_payload_to("homeassistant/switch/ledclock_aabbccdd_power/state"),
            Some(b"ON".as_slice())
        );
        // Discovery and state publishes are retained
        assert!(out.publishes.iter().all(|(_, _, retain)| *retain));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let (mut registry, mut out) = registry_with_power(true);
        let result = registry.add_entity(
            &EntityDescriptor::switch("power", "Power again", false),
            &mut out,
        );
        assert_eq!(result.err(), Some(RegistryError::DuplicateName));
        assert_eq!(registry.len(), 1);
        // The original entity state is untouched
        assert!(registry.entity("power").unwrap().state().is_on());
    }

    #[test]
    fn switch_command_roundtrip_with_binary_collapse() {
        let (mut registry, mut out) = registry_with_power(false);
        let command_topic = "homeassistant/switch/ledclock_aabbccdd_power/set";
        let state_topic = "homeassistant/switch/ledclock_aabbccdd_power/state";

        registry.process_message(command_topic, b"ON", &mut out);
        assert!(registry.entity("power").unwrap().state().is_on());
        assert_eq!(out.last_payload_to(state_topic), Some(b"ON".as_slice()));

        registry.process_message(command_topic, b"OFF", &mut out);
        assert!(!registry.entity("power").unwrap().state().is_on());
        assert_eq!(out.last_payload_to(state_topic), Some(b"OFF".as_slice()));

        // Any payload other than the ON token collapses to off
        registry.process_message(command_topic, b"on", &mut out);
        assert!(!registry.entity("power").unwrap().state().is_on());
        registry.process_message(command_topic, b"ENABLED", &mut out);
        assert_eq!(out.last_payload_to(state_topic), Some(b"OFF".as_slice()));
    }

    #[test]
    fn power_off_scenario() {
        // One switch entity, initially on; inbound OFF flips the state and
        // publishes the bare token
        let (mut registry, mut out) = registry_with_power(true);
        registry.process_message(
            "homeassistant/switch/ledclock_aabbccdd_power/set",
            b"OFF",
            &mut out,
        );
        assert_eq!(
            registry.entity("power").unwrap().state(),
            &EntityState::Switch { on: false }
        );
        assert_eq!(
            out.last_payload_to("homeassistant/switch/ledclock_aabbccdd_power/state"),
            Some(b"OFF".as_slice())
        );
    }

    #[test]
    fn light_update_merges_and_republishes() {
        let mut registry = registry();
        let mut out = TestOutbox::default();
        registry
            .add_entity(
                &EntityDescriptor::light(
                    "date_rgb",
                    "Date color",
                    LightOptions::rgb(),
                    LightState::on().with_rgb(0, 255, 0),
                ),
                &mut out,
            )
            .unwrap();
        let state_topic = "homeassistant/light/ledclock_aabbccdd_date_rgb/state";
        assert_eq!(
            out.last_payload_to(state_topic),
            Some(br#"{"state":"ON","color_mode":"rgb","color":{"r":0,"g":255,"b":0}}"#.as_slice())
        );

        registry
            .update(
                "date_rgb",
                &EntityPatch::Light(LightPatch {
                    color: Some(RgbColor::new(255, 0, 0)),
                    ..LightPatch::default()
                }),
                &mut out,
            )
            .unwrap();

        // Color replaced, everything else retained
        assert_eq!(
            out.last_payload_to(state_topic),
            Some(br#"{"state":"ON","color_mode":"rgb","color":{"r":255,"g":0,"b":0}}"#.as_slice())
        );

        // Publishing an identical update yields an identical payload
        let before = out.publishes_to(state_topic);
        registry
            .update(
                "date_rgb",
                &EntityPatch::Light(LightPatch {
                    color: Some(RgbColor::new(255, 0, 0)),
                    ..LightPatch::default()
                }),
                &mut out,
            )
            .unwrap();
        assert_eq!(out.publishes_to(state_topic), before + 1);
        assert_eq!(
            out.last_payload_to(state_topic),
            Some(br#"{"state":"ON","color_mode":"rgb","color":{"r":255,"g":0,"b":0}}"#.as_slice())
        );
    }

    #[test]
    fn light_command_updates_state() {
        let mut registry = registry();
        let mut out = TestOutbox::default();
        registry
            .add_entity(
                &EntityDescriptor::light(
                    "date_rgb",
                    "Date color",
                    LightOptions::rgb(),
                    LightState::on().with_rgb(0, 255, 0),
                ),
                &mut out,
            )
            .unwrap();

        registry.process_message(
            "homeassistant/light/ledclock_aabbccdd_date_rgb/set",
            br#"{"state":"ON","color":{"r":10,"g":20,"b":30}}"#,
            &mut out,
        );

        let EntityState::Light(light) = registry.entity("date_rgb").unwrap().state() else {
            panic!("wrong kind");
        };
        assert!(light.on);
        assert_eq!(light.color, Some(RgbColor::new(10, 20, 30)));
    }

    #[test]
    fn unmatched_topic_changes_nothing() {
        let (mut registry, mut out) = registry_with_power(true);
        let published = out.publishes.len();

        registry.process_message("homeassistant/switch/otherdevice_power/set", b"OFF", &mut out);
        registry.process_message("some/random/topic", b"{}", &mut out);

        assert!(registry.entity("power").unwrap().state().is_on());
        assert_eq!(out.publishes.len(), published);
    }

    #[test]
    fn malformed_light_payload_is_discarded() {
        let mut registry = registry();
        let mut out = TestOutbox::default();
        registry
            .add_entity(
                &EntityDescriptor::light(
                    "date_rgb",
                    "Date color",
                    LightOptions::rgb(),
                    LightState::on().with_rgb(0, 255, 0),
                ),
                &mut out,
            )
            .unwrap();
        let published = out.publishes.len();

        registry.process_message(
            "homeassistant/light/ledclock_aabbccdd_date_rgb/set",
            b"\xff{garbage",
            &mut out,
        );

        let EntityState::Light(light) = registry.entity("date_rgb").unwrap().state() else {
            panic!("wrong kind");
        };
        assert_eq!(light.color, Some(RgbColor::new(0, 255, 0)));
        assert_eq!(out.publishes.len(), published);
    }

    #[test]
    fn advertise_entities_reissues_every_config() {
        let (mut registry, mut out) = registry_with_power(true);
        registry
            .add_entity(
                &EntityDescriptor::light(
                    "date_rgb",
                    "Date color",
                    LightOptions::rgb(),
                    LightState::on().with_rgb(0, 255, 0),
                ),
                &mut out,
            )
            .unwrap();

        let mut reconnect_out = TestOutbox::default();
        registry.advertise_entities(&mut reconnect_out);

        assert_eq!(
            reconnect_out.publishes_to("homeassistant/switch/ledclock_aabbccdd_power/config"),
            1
        );
        assert_eq!(
            reconnect_out.publishes_to("homeassistant/light/ledclock_aabbccdd_date_rgb/config"),
            1
        );
        assert_eq!(reconnect_out.subscribes.len(), 2);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut registry: Registry<1> =
            Registry::new(DeviceIdentity::new(host_id_from_mac(&MAC), "ledclock"));
        let mut out = TestOutbox::default();
        registry
            .add_entity(&EntityDescriptor::switch("power", "Power", true), &mut out)
            .unwrap();
        let result =
            registry.add_entity(&EntityDescriptor::switch("second", "Second", true), &mut out);
        assert_eq!(result.err(), Some(RegistryError::CapacityExceeded));
    }
}
