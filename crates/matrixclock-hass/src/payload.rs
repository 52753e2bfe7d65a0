//! State and command payload encoding
//!
//! The encoding branch is per entity kind and must be preserved exactly:
//! switch state travels as the bare token `ON`/`OFF`, light state as a JSON
//! document. The inverse applies to inbound commands, with the switch
//! branch collapsing every payload other than `ON` to off.

use serde::{Deserialize, Serialize};

use crate::entity::{
    ColorMode, EntityPatch, EntityProfile, EntityState, LightPatch, RgbColor,
};
use crate::error::RegistryError;

const ON_TOKEN: &str = "ON";
const OFF_TOKEN: &str = "OFF";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RgbDocument {
    r: u8,
    g: u8,
    b: u8,
}

impl From<RgbColor> for RgbDocument {
    fn from(color: RgbColor) -> Self {
        Self {
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

/// Light state document published to the state topic.
#[derive(Serialize)]
struct LightStateDocument<'a> {
    state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    brightness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<RgbDocument>,
}

/// Light command document received on the command topic. Every field is
/// optional; absent fields leave the current state untouched.
#[derive(Debug, Default, Deserialize)]
struct LightCommandDocument<'a> {
    #[serde(default)]
    state: Option<&'a str>,
    #[serde(default)]
    brightness: Option<u8>,
    #[serde(default)]
    color_mode: Option<&'a str>,
    #[serde(default)]
    color: Option<RgbDocument>,
}

/// Payload decode failure; the message is discarded by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedPayload;

/// Encode the current state into `buf`, returning the number of bytes
/// written.
pub(crate) fn encode_state(state: &EntityState, buf: &mut [u8]) -> Result<usize, RegistryError> {
    match state {
        EntityState::Switch { on } => {
            let token = if *on { ON_TOKEN } else { OFF_TOKEN };
            let bytes = token.as_bytes();
            if buf.len() < bytes.len() {
                return Err(RegistryError::Encode);
            }
            buf[..bytes.len()].copy_from_slice(bytes);
            Ok(bytes.len())
        }
        EntityState::Light(light) => {
            let document = LightStateDocument {
                state: if light.on { ON_TOKEN } else { OFF_TOKEN },
                brightness: light.brightness,
                color_mode: light.color_mode.map(ColorMode::as_str),
                color: light.color.map(RgbDocument::from),
            };
            serde_json_core::to_slice(&document, buf).map_err(|_| RegistryError::Encode)
        }
    }
}

/// Decode an inbound command payload with the inverse of the state
/// encoding.
///
/// The switch branch never fails: `ON` means on, anything else means off.
/// The light branch fails on malformed JSON, which the caller treats as a
/// discarded message.
pub(crate) fn decode_command(
    profile: EntityProfile,
    payload: &[u8],
) -> Result<EntityPatch, MalformedPayload> {
    match profile {
        EntityProfile::Switch => Ok(EntityPatch::Switch {
            on: payload == ON_TOKEN.as_bytes(),
        }),
        EntityProfile::Light(_) => {
            let (document, _) = serde_json_core::from_slice::<LightCommandDocument<'_>>(payload)
                .map_err(|_| MalformedPayload)?;
            let on = match document.state {
                Some(token) => Some(token == ON_TOKEN),
                None => None,
            };
            Ok(EntityPatch::Light(LightPatch {
                on,
                brightness: document.brightness,
                color_mode: document.color_mode.and_then(ColorMode::parse),
                color: document.color.map(|c| RgbColor::new(c.r, c.g, c.b)),
            }))
        }
    }
}
