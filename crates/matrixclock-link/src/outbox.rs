//! Publish outbox
//!
//! Registry code never performs async I/O. It emits wire traffic into an
//! [`Outbox`] sink and returns; the session layer then drains the buffered
//! requests to the MQTT client and is the single observer of transport
//! errors. This keeps `configure`/`update`/`process_message` synchronous
//! and run-to-completion while the shared entity table is borrowed.

use heapless::{Deque, String, Vec};
use log::warn;

/// Sink for wire traffic emitted by synchronous code.
///
/// All publishes are delivered at least once; `retain` marks the payload to
/// be kept by the broker for late subscribers (discovery and state topics).
pub trait Outbox {
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool);
    fn subscribe(&mut self, topic: &str);
}

/// One queued request, owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRequest<const T: usize, const P: usize> {
    Publish {
        topic: String<T>,
        payload: Vec<u8, P>,
        retain: bool,
    },
    Subscribe {
        topic: String<T>,
    },
}

/// Bounded [`Outbox`] implementation.
///
/// Holds up to `N` requests with topics up to `T` bytes and payloads up to
/// `P` bytes. Requests that do not fit are dropped with a warning; the
/// caller re-announces state on the next cycle anyway, so a dropped request
/// costs staleness, not correctness.
#[derive(Debug, Default)]
pub struct BufferedOutbox<const N: usize, const T: usize, const P: usize> {
    requests: Deque<LinkRequest<T, P>, N>,
    dropped: u32,
}

impl<const N: usize, const T: usize, const P: usize> BufferedOutbox<N, T, P> {
    pub const fn new() -> Self {
        Self {
            requests: Deque::new(),
            dropped: 0,
        }
    }

    /// Remove and return the oldest request.
    pub fn pop(&mut self) -> Option<LinkRequest<T, P>> {
        self.requests.pop_front()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn push(&mut self, request: LinkRequest<T, P>) {
        if self.requests.push_back(request).is_err() {
            self.dropped += 1;
            warn!("outbox: full ({} requests), request dropped", N);
        }
    }
}

impl<const N: usize, const T: usize, const P: usize> Outbox for BufferedOutbox<N, T, P> {
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) {
        let Ok(topic) = String::try_from(topic) else {
            warn!("outbox: topic longer than {} bytes, dropped", T);
            self.dropped += 1;
            return;
        };
        let Ok(payload) = Vec::from_slice(payload) else {
            warn!("outbox: payload longer than {} bytes, dropped", P);
            self.dropped += 1;
            return;
        };
        self.push(LinkRequest::Publish {
            topic,
            payload,
            retain,
        });
    }

    fn subscribe(&mut self, topic: &str) {
        let Ok(topic) = String::try_from(topic) else {
            warn!("outbox: topic longer than {} bytes, dropped", T);
            self.dropped += 1;
            return;
        };
        self.push(LinkRequest::Subscribe { topic });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_drain_in_order() {
        let mut outbox: BufferedOutbox<4, 32, 32> = BufferedOutbox::new();
        outbox.publish("a/config", b"{}", true);
        outbox.subscribe("a/set");
        outbox.publish("a/state", b"ON", true);

        assert!(matches!(
            outbox.pop(),
            Some(LinkRequest::Publish { topic, retain: true, .. }) if topic.as_str() == "a/config"
        ));
        assert!(matches!(
            outbox.pop(),
            Some(LinkRequest::Subscribe { topic }) if topic.as_str() == "a/set"
        ));
        assert!(matches!(
            outbox.pop(),
            Some(LinkRequest::Publish { payload, .. }) if payload.as_slice() == b"ON"
        ));
        assert!(outbox.pop().is_none());
    }

    #[test]
    fn overflow_is_counted() {
        let mut outbox: BufferedOutbox<1, 16, 16> = BufferedOutbox::new();
        outbox.subscribe("one");
        outbox.subscribe("two");
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.dropped(), 1);
    }
}
