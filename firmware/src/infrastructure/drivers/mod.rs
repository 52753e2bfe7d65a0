pub(crate) mod buttons;
pub(crate) mod matrix;
pub(crate) mod network;

pub(crate) use buttons::{ButtonEvent, Buttons};
pub(crate) use matrix::MatrixDriver;
pub(crate) use network::{init_network_stack, resolve_host, wait_for_connection};
