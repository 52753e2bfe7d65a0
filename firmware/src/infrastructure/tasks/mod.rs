pub(crate) mod buttons;
pub(crate) mod display;
pub(crate) mod link;
pub(crate) mod timesync;
pub(crate) mod wifi;

pub(crate) use buttons::button_task;
pub(crate) use display::display_task;
pub(crate) use link::link_task;
pub(crate) use timesync::timesync_task;
pub(crate) use wifi::{network_runner_task, wifi_connection_task};
