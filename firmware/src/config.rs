//! Compile-time configuration
//!
//! Network credentials come from a `.env` file via `dotenv-build`; every
//! value has a default so the firmware builds without one. Cadence
//! constants live here so the task modules stay free of magic numbers.

use embassy_time::Duration;

pub(crate) const BUILD_VERSION: &str = env!("BUILD_VERSION");

pub(crate) const DEVICE_MANUFACTURER: &str = "matrixclock";
pub(crate) const DEVICE_MODEL: &str = "ledclock-32x16";

/// Prefix for entity object ids and the MQTT client id.
pub(crate) const ENTITY_PREFIX: &str = "ledclock";

// Matrix geometry (serpentine-wired WS2812 panel)
pub(crate) const MATRIX_WIDTH: usize = 32;
pub(crate) const MATRIX_HEIGHT: usize = 16;
pub(crate) const MATRIX_LED_COUNT: usize = MATRIX_WIDTH * MATRIX_HEIGHT;

// Task cadence
pub(crate) const FRAME_INTERVAL: Duration = Duration::from_millis(100);
pub(crate) const IO_POLL_INTERVAL: Duration = Duration::from_millis(10);
pub(crate) const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
pub(crate) const RECONNECT_DELAY: Duration = Duration::from_secs(2);
pub(crate) const BUTTON_POLL_INTERVAL: Duration = Duration::from_millis(10);
pub(crate) const TIME_SYNC_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);
pub(crate) const TIME_SYNC_RETRY: Duration = Duration::from_secs(60);

/// Reconnect failures tolerated before the firmware resets the device.
pub(crate) const MAX_RECONNECT_FAILURES: u8 = 3;

pub(crate) struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

pub(crate) const WIFI: WifiConfig = WifiConfig {
    ssid: value_or(option_env!("WIFI_SSID"), ""),
    password: value_or(option_env!("WIFI_PASSWORD"), ""),
};

pub(crate) struct MqttConfig {
    pub host: &'static str,
    port: &'static str,
    pub username: &'static str,
    pub password: &'static str,
}

impl MqttConfig {
    pub(crate) fn port(&self) -> u16 {
        self.port.parse().unwrap_or(1883)
    }
}

pub(crate) const MQTT: MqttConfig = MqttConfig {
    host: value_or(option_env!("MQTT_HOST"), "homeassistant.local"),
    port: value_or(option_env!("MQTT_PORT"), "1883"),
    username: value_or(option_env!("MQTT_USERNAME"), ""),
    password: value_or(option_env!("MQTT_PASSWORD"), ""),
};

/// Timezone path segment for the worldtimeapi request.
pub(crate) const TIMEZONE: &str = value_or(option_env!("TIMEZONE"), "Europe/London");

const fn value_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(value) => value,
        None => default,
    }
}
