//! Wi-Fi connection and stack runner tasks

use embassy_net::Runner;
use embassy_time::{Duration, Timer};
use log::{info, warn};
use esp_radio::wifi::{
    AuthMethod, ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState,
};

use crate::config;

/// Background task keeping the station associated.
///
/// Connects to the configured network and, whenever the association drops,
/// waits out a short backoff and reconnects.
#[embassy_executor::task]
pub(crate) async fn wifi_connection_task(mut controller: WifiController<'static>) {
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            Timer::after(Duration::from_millis(2000)).await;
        }
        if !matches!(controller.is_started(), Ok(true)) {
            let client_config = if config::WIFI.password.is_empty() {
                ClientConfig::default()
                    .with_ssid(config::WIFI.ssid.into())
                    .with_auth_method(AuthMethod::None)
            } else {
                ClientConfig::default()
                    .with_ssid(config::WIFI.ssid.into())
                    .with_password(config::WIFI.password.into())
            };
            controller
                .set_config(&ModeConfig::Client(client_config))
                .expect("invalid wifi config");
            controller.start_async().await.expect("wifi start failed");
        }

        info!("wifi: connecting to '{}'", config::WIFI.ssid);
        if let Err(error) = controller.connect_async().await {
            warn!("wifi: connect failed: {:?}", error);
            Timer::after(Duration::from_millis(5000)).await;
        }
    }
}

/// Background task for running the network stack
#[embassy_executor::task]
pub(crate) async fn network_runner_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}
