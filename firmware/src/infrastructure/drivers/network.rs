//! Wi-Fi and network stack bring-up
//!
//! STA-mode Wi-Fi through esp-radio plus an embassy-net stack with DHCP.
//! The hostname carries the host id so the device is recognizable on the
//! LAN even before MQTT discovery runs.

use core::fmt::Write as _;
use core::str::FromStr;

use embassy_net::{DhcpConfig, IpAddress, Runner, Stack, StackResources, dns::DnsQueryType};
use embassy_time::{Duration, Timer};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::wifi::{Config as WifiConfig, WifiController, WifiDevice};
use heapless::String;
use static_cell::make_static;

use crate::mk_static;

const MAX_CONNECTIONS: usize = 6;

pub(crate) fn init_network_stack(
    wifi_device: WIFI<'static>,
    host_id: &str,
) -> (
    Stack<'static>,
    Runner<'static, WifiDevice<'static>>,
    WifiController<'static>,
) {
    let radio = &*make_static!(esp_radio::init().expect("radio init failed"));
    let (controller, interfaces) =
        esp_radio::wifi::new(radio, wifi_device, WifiConfig::default()).expect("wifi init failed");

    let mut dhcp_config = DhcpConfig::default();
    dhcp_config.hostname = Some(hostname(host_id));
    let net_config = embassy_net::Config::dhcpv4(dhcp_config);

    let resources = mk_static!(
        StackResources<MAX_CONNECTIONS>,
        StackResources::<MAX_CONNECTIONS>::new()
    );
    let (stack, runner) = embassy_net::new(interfaces.sta, net_config, resources, seed());

    (stack, runner, controller)
}

fn hostname(host_id: &str) -> String<32> {
    let mut name = String::new();
    if write!(name, "{}-{}", crate::config::ENTITY_PREFIX, host_id).is_err() {
        return String::from_str(crate::config::ENTITY_PREFIX).unwrap_or_default();
    }
    name
}

fn seed() -> u64 {
    let rng = Rng::new();
    u64::from(rng.random()) << 32 | u64::from(rng.random())
}

/// Wait for the network link to become active
async fn wait_for_link(stack: Stack<'_>) {
    loop {
        if stack.is_link_up() {
            break;
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}

/// Wait for the network stack to obtain an IPv4 address via DHCP
async fn wait_for_ip(stack: Stack<'_>) -> embassy_net::StaticConfigV4 {
    loop {
        if let Some(config) = stack.config_v4() {
            return config;
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}

/// Wait for full network connectivity (link + IP address)
pub(crate) async fn wait_for_connection(stack: Stack<'_>) -> embassy_net::StaticConfigV4 {
    wait_for_link(stack).await;
    wait_for_ip(stack).await
}

/// Resolves a hostname to an IP address
pub(crate) async fn resolve_host(stack: Stack<'static>, host: &str) -> Result<IpAddress, ()> {
    if let Ok(ip) = host.parse::<embassy_net::Ipv4Address>() {
        return Ok(IpAddress::Ipv4(ip));
    }

    let Ok(addresses) = stack.dns_query(host, DnsQueryType::A).await else {
        return Err(());
    };

    addresses.first().copied().ok_or(())
}
