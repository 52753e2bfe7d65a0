//! Home Assistant entity mirroring for the matrixclock firmware
//!
//! This crate keeps a local registry of named, stateful entities convergent
//! with a Home Assistant broker over MQTT discovery. It is structured in
//! three layers:
//!
//! - **Entity model** (`entity`, `device`): tagged entity kinds with typed
//!   state and merge semantics
//! - **Wire layer** (`topic`, `discovery`, `payload`): topic derivation and
//!   the JSON documents Home Assistant expects
//! - **Registry** (`registry`): the entity table with discovery
//!   announcement, state mirroring and inbound command processing
//!
//! The registry performs no I/O itself: every operation emits its wire
//! traffic into a [`matrixclock_link::Outbox`] sink and runs to completion.
//! The session layer drains the sink and owns transport failures.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod device;
pub mod discovery;
pub mod entity;
pub mod error;
pub mod payload;
pub mod registry;
pub mod topic;

pub use device::{DeviceIdentity, HostId, host_id_from_mac};
pub use entity::{
    ColorMode, Entity, EntityDescriptor, EntityKind, EntityPatch, EntityProfile, EntityState,
    LightOptions, LightPatch, LightState, RgbColor,
};
pub use error::RegistryError;
pub use registry::Registry;

/// Maximum length of a derived topic string.
pub const MAX_TOPIC_LEN: usize = 96;

/// Maximum length of `{entity_prefix}_{host_id}_{name}`.
pub const MAX_FULL_NAME_LEN: usize = 48;

/// Scratch buffer size for serialized discovery and state documents.
pub const MAX_DOCUMENT_LEN: usize = 512;
