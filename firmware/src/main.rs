#![no_std]
#![no_main]
#![feature(type_alias_impl_trait)]

mod config;
mod context;
mod controllers;
mod infrastructure;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, timer::timg::TimerGroup};
use matrixclock_hass::{DeviceIdentity, host_id_from_mac};

use crate::context::{AppContext, EntityRegistry};
use crate::infrastructure::drivers::{
    Buttons, MatrixDriver, init_network_stack, wait_for_connection,
};
use crate::infrastructure::tasks::{
    button_task, display_task, link_task, network_runner_task, timesync_task,
    wifi_connection_task,
};

esp_bootloader_esp_idf::esp_app_desc!();

// static_cell::make_static! in main causes a compiler error
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}
pub(crate) use mk_static;

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // Allocate heap memory (64 + 32 KB); the radio stack needs most of it
    esp_alloc::heap_allocator!(
        #[unsafe(link_section = ".dram2_uninit")] size: 64 * 1024
    );
    esp_alloc::heap_allocator!(size: 32 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Every entity topic is namespaced by the host id, so the registry
    // identity is fixed before anything touches the network
    let mac = esp_hal::efuse::Efuse::mac_address();
    let identity = DeviceIdentity::new(host_id_from_mac(&mac), config::ENTITY_PREFIX)
        .with_model(config::DEVICE_MODEL)
        .with_manufacturer(config::DEVICE_MANUFACTURER)
        .with_sw_version(config::BUILD_VERSION);
    let host_id = identity.host_id.clone();
    let ctx = mk_static!(AppContext, AppContext::new(EntityRegistry::new(identity)));

    let matrix = MatrixDriver::new(peripherals.RMT, peripherals.GPIO27);
    spawner.spawn(display_task(ctx, matrix)).ok();

    let buttons = Buttons::new(peripherals.GPIO32, peripherals.GPIO33);
    spawner.spawn(button_task(buttons)).ok();

    let (stack, runner, controller) = init_network_stack(peripherals.WIFI, &host_id);
    spawner.spawn(wifi_connection_task(controller)).ok();
    spawner.spawn(network_runner_task(runner)).ok();

    // Network-dependent tasks wait until the stack has an address
    wait_for_connection(stack).await;
    spawner.spawn(link_task(stack, ctx)).ok();
    spawner.spawn(timesync_task(stack, ctx)).ok();

    loop {
        Timer::after(Duration::from_secs(5)).await;
    }
}
