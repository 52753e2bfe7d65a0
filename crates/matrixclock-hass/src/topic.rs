//! Topic derivation
//!
//! All topics follow the discovery convention
//! `{discovery_prefix}/{component}/{entity_prefix}_{host_id}_{name}/{leaf}`
//! with leaves `config` (retained discovery document), `set` (inbound
//! commands) and `state` (retained state publishes).

use core::fmt::Write;
use heapless::String;

use crate::device::DeviceIdentity;
use crate::error::RegistryError;
use crate::{MAX_FULL_NAME_LEN, MAX_TOPIC_LEN};

/// `{entity_prefix}_{host_id}_{name}`, used as object id and unique id.
pub fn full_name(
    identity: &DeviceIdentity,
    name: &str,
) -> Result<String<MAX_FULL_NAME_LEN>, RegistryError> {
    let mut out = String::new();
    write!(
        out,
        "{}_{}_{}",
        identity.entity_prefix, identity.host_id, name
    )
    .map_err(|_| RegistryError::TopicTooLong)?;
    Ok(out)
}

/// One of the three per-entity topics.
pub fn entity_topic(
    identity: &DeviceIdentity,
    component: &str,
    name: &str,
    leaf: &str,
) -> Result<String<MAX_TOPIC_LEN>, RegistryError> {
    let mut out = String::new();
    write!(
        out,
        "{}/{}/{}_{}_{}/{}",
        identity.discovery_prefix, component, identity.entity_prefix, identity.host_id, name, leaf
    )
    .map_err(|_| RegistryError::TopicTooLong)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::host_id_from_mac;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new(
            host_id_from_mac(&[0xaa, 0xbb, 0xcc, 0xdd, 0x01, 0x02]),
            "ledclock",
        )
    }

    #[test]
    fn topic_grammar() {
        let identity = identity();
        assert_eq!(
            entity_topic(&identity, "switch", "power", "config")
                .unwrap()
                .as_str(),
            "homeassistant/switch/ledclock_aabbccdd_power/config"
        );
        assert_eq!(
            entity_topic(&identity, "light", "date_rgb", "set")
                .unwrap()
                .as_str(),
            "homeassistant/light/ledclock_aabbccdd_date_rgb/set"
        );
    }

    #[test]
    fn full_name_grammar() {
        assert_eq!(
            full_name(&identity(), "power").unwrap().as_str(),
            "ledclock_aabbccdd_power"
        );
    }

    #[test]
    fn overlong_name_is_rejected() {
        let long = [b'a'; MAX_TOPIC_LEN];
        let name = core::str::from_utf8(&long).unwrap();
        assert_eq!(
            entity_topic(&identity(), "switch", name, "config"),
            Err(RegistryError::TopicTooLong)
        );
    }
}
