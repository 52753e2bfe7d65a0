//! Connection health state machine
//!
//! Tracks broker connectivity as a tri-state flag and counts consecutive
//! reconnect failures. The device has no persistent backoff budget and no
//! operator intervention path, so after the failure counter passes its
//! threshold the machine directs the caller to perform a full device reset
//! instead of retrying forever. The reset itself is a host-environment hook;
//! this type only returns the directive.

use log::{info, warn};

/// Broker connectivity as observed by the link session.
///
/// Written only by the link session task; everything else (display logic,
/// keepalive scheduling) reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connect attempt has completed yet.
    Unknown,
    /// Last connect or keepalive succeeded.
    Online,
    /// Connect failed or the link was lost.
    Offline,
}

/// What the caller should do after a failed reconnect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDirective {
    /// Wait the reconnect delay and try again.
    Retry,
    /// Too many consecutive failures; restart the device.
    Reset,
}

/// Reconnect bookkeeping for one broker link.
///
/// Transitions:
/// - `Unknown -> Online` / `Unknown -> Offline` on the first attempt
/// - `Online -> Offline` when a keepalive or receive fails
/// - `Offline -> Online` on reconnect success (failure counter resets)
/// - `Offline -> Offline` on reconnect failure (failure counter increments)
///
/// Once the counter exceeds `threshold`, [`LinkHealth::on_connect_failure`]
/// returns [`RetryDirective::Reset`].
#[derive(Debug)]
pub struct LinkHealth {
    state: ConnectionState,
    failures: u8,
    threshold: u8,
}

impl LinkHealth {
    pub const fn new(threshold: u8) -> Self {
        Self {
            state: ConnectionState::Unknown,
            failures: 0,
            threshold,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u8 {
        self.failures
    }

    /// A connect (or reconnect) attempt succeeded.
    ///
    /// The caller must re-advertise every entity after this returns, since
    /// the broker may have discarded retained discovery state while the
    /// link was down.
    pub fn on_connect_success(&mut self) {
        if self.state == ConnectionState::Offline {
            info!("link: back online after {} failed attempts", self.failures);
        }
        self.state = ConnectionState::Online;
        self.failures = 0;
    }

    /// A connect (or reconnect) attempt failed.
    pub fn on_connect_failure(&mut self) -> RetryDirective {
        self.state = ConnectionState::Offline;
        self.failures = self.failures.saturating_add(1);
        if self.failures > self.threshold {
            warn!(
                "link: {} consecutive connect failures, escalating to reset",
                self.failures
            );
            RetryDirective::Reset
        } else {
            warn!(
                "link: connect failed ({}/{} before reset)",
                self.failures,
                self.threshold + 1
            );
            RetryDirective::Retry
        }
    }

    /// The established link died (keepalive ping or receive error).
    ///
    /// Does not touch the failure counter; only failed reconnect attempts
    /// count toward escalation.
    pub fn on_link_lost(&mut self) {
        if self.state != ConnectionState::Offline {
            warn!("link: lost, marking offline");
        }
        self.state = ConnectionState::Offline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown() {
        let health = LinkHealth::new(3);
        assert_eq!(health.state(), ConnectionState::Unknown);
        assert_eq!(health.consecutive_failures(), 0);
    }

    #[test]
    fn initial_connect_success_goes_online() {
        let mut health = LinkHealth::new(3);
        health.on_connect_success();
        assert_eq!(health.state(), ConnectionState::Online);
    }

    #[test]
    fn initial_connect_failure_goes_offline() {
        let mut health = LinkHealth::new(3);
        assert_eq!(health.on_connect_failure(), RetryDirective::Retry);
        assert_eq!(health.state(), ConnectionState::Offline);
    }

    #[test]
    fn ping_failure_marks_offline_without_counting() {
        let mut health = LinkHealth::new(3);
        health.on_connect_success();
        health.on_link_lost();
        assert_eq!(health.state(), ConnectionState::Offline);
        assert_eq!(health.consecutive_failures(), 0);
    }

    #[test]
    fn three_failures_retry_fourth_resets() {
        let mut health = LinkHealth::new(3);
        health.on_connect_success();
        health.on_link_lost();

        let mut resets = 0;
        for attempt in 1..=4 {
            match health.on_connect_failure() {
                RetryDirective::Retry => assert!(attempt <= 3, "escalated late"),
                RetryDirective::Reset => {
                    assert_eq!(attempt, 4, "escalated early");
                    resets += 1;
                }
            }
        }
        assert_eq!(resets, 1);
    }

    #[test]
    fn reconnect_success_resets_counter() {
        let mut health = LinkHealth::new(3);
        health.on_link_lost();
        assert_eq!(health.on_connect_failure(), RetryDirective::Retry);
        assert_eq!(health.on_connect_failure(), RetryDirective::Retry);
        health.on_connect_success();
        assert_eq!(health.state(), ConnectionState::Online);
        assert_eq!(health.consecutive_failures(), 0);

        // A fresh outage starts counting from zero again
        health.on_link_lost();
        assert_eq!(health.on_connect_failure(), RetryDirective::Retry);
        assert_eq!(health.on_connect_failure(), RetryDirective::Retry);
        assert_eq!(health.on_connect_failure(), RetryDirective::Retry);
        assert_eq!(health.on_connect_failure(), RetryDirective::Reset);
    }
}
