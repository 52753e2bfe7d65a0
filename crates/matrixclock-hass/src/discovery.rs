//! Discovery documents
//!
//! These types match the JSON document published (retained) to each
//! entity's config topic so Home Assistant can create the entity before it
//! ever receives a command.

use heapless::Vec;
use serde::Serialize;

use crate::device::DeviceIdentity;
use crate::entity::{Entity, EntityProfile};
use crate::error::RegistryError;

/// `device` section shared by every entity of this device.
#[derive(Serialize)]
struct DeviceBlock<'a> {
    identifiers: [&'a str; 1],
    name: &'a str,
    model: &'a str,
    manufacturer: &'a str,
    sw_version: &'a str,
}

/// Full discovery document for one entity.
///
/// Kind-specific options are optional fields skipped when absent, so a
/// switch document carries only the base keys while a light document also
/// announces its color capabilities.
#[derive(Serialize)]
struct DiscoveryDocument<'a> {
    name: &'a str,
    object_id: &'a str,
    unique_id: &'a str,
    device_class: &'a str,
    device: DeviceBlock<'a>,
    schema: &'a str,
    command_topic: &'a str,
    state_topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supported_color_modes: Option<Vec<&'a str, 4>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brightness: Option<bool>,
}

/// Serialize the discovery document for `entity` into `buf`, returning the
/// number of bytes written.
pub(crate) fn encode(
    identity: &DeviceIdentity,
    entity: &Entity,
    full_name: &str,
    buf: &mut [u8],
) -> Result<usize, RegistryError> {
    let (color_mode, supported_color_modes, brightness) = match entity.profile() {
        EntityProfile::Switch => (None, None, None),
        EntityProfile::Light(options) => {
            let mut modes: Vec<&str, 4> = Vec::new();
            for mode in options.supported_color_modes {
                modes.push(mode.as_str()).map_err(|_| RegistryError::Encode)?;
            }
            (
                Some(options.color_mode),
                Some(modes),
                Some(options.brightness),
            )
        }
    };

    let document = DiscoveryDocument {
        name: entity.description(),
        object_id: full_name,
        unique_id: full_name,
        device_class: entity.profile().component(),
        device: DeviceBlock {
            identifiers: [identity.host_id.as_str()],
            name: identity.host_id.as_str(),
            model: identity.model,
            manufacturer: identity.manufacturer,
            sw_version: identity.sw_version,
        },
        schema: "json",
        command_topic: entity.topic_command(),
        state_topic: entity.topic_state(),
        color_mode,
        supported_color_modes,
        brightness,
    };

    serde_json_core::to_slice(&document, buf).map_err(|_| RegistryError::Encode)
}
