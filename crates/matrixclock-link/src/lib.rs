//! Broker-link plumbing for the matrixclock firmware
//!
//! This crate contains the transport-agnostic half of the MQTT link:
//!
//! - **`health`**: the connection state machine (unknown/online/offline)
//!   with reconnect counting and fail-fast reset escalation
//! - **`queue`**: the bounded inbound message queue decoupling transport
//!   receive from entity processing
//! - **`outbox`**: the `Outbox` sink trait and its buffered implementation;
//!   synchronous code queues publish/subscribe requests here and the async
//!   session layer drains them to the real client
//!
//! Nothing in this crate performs I/O. The firmware owns the socket and the
//! MQTT client; everything here is pure state that can be exercised on a
//! host toolchain.

#![no_std]

pub mod health;
pub mod outbox;
pub mod queue;

pub use health::{ConnectionState, LinkHealth, RetryDirective};
pub use outbox::{BufferedOutbox, LinkRequest, Outbox};
pub use queue::{Enqueue, InboundMessage, InboundQueue};
