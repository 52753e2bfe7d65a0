//! Bounded inbound message queue
//!
//! The transport receive loop must never block on entity processing
//! (discovery parsing, JSON decode), so arrival and processing are
//! decoupled: the session loop pushes every received `(topic, payload)`
//! pair here and a drain step pops one message at a time in strict arrival
//! order.
//!
//! Overflow policy: **drop-newest**. When the queue is full the arriving
//! message is discarded and counted. The backlog keeps its head so the
//! consumer still observes a FIFO prefix of the arrival sequence; a flood
//! costs the flood its own tail.

use heapless::{Deque, String, Vec};
use log::warn;

/// One received message, owned so it outlives the transport's receive
/// buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage<const T: usize, const P: usize> {
    pub topic: String<T>,
    pub payload: Vec<u8, P>,
}

/// Outcome of a push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Stored,
    /// Queue full, or topic/payload exceeded the owned-buffer bounds.
    Dropped,
}

/// Single-producer/single-consumer FIFO with a fixed capacity of `N`
/// messages, topics up to `T` bytes and payloads up to `P` bytes.
#[derive(Debug, Default)]
pub struct InboundQueue<const N: usize, const T: usize, const P: usize> {
    messages: Deque<InboundMessage<T, P>, N>,
    dropped: u32,
}

impl<const N: usize, const T: usize, const P: usize> InboundQueue<N, T, P> {
    pub const fn new() -> Self {
        Self {
            messages: Deque::new(),
            dropped: 0,
        }
    }

    /// Append a message at the tail.
    pub fn push(&mut self, topic: &str, payload: &[u8]) -> Enqueue {
        let Ok(topic) = String::try_from(topic) else {
            warn!("queue: topic longer than {} bytes, dropped", T);
            self.dropped += 1;
            return Enqueue::Dropped;
        };
        let Ok(payload) = Vec::from_slice(payload) else {
            warn!("queue: payload longer than {} bytes, dropped", P);
            self.dropped += 1;
            return Enqueue::Dropped;
        };
        match self.messages.push_back(InboundMessage { topic, payload }) {
            Ok(()) => Enqueue::Stored,
            Err(_) => {
                self.dropped += 1;
                warn!("queue: full ({} messages), newest dropped", N);
                Enqueue::Dropped
            }
        }
    }

    /// Remove and return the oldest message.
    pub fn pop(&mut self) -> Option<InboundMessage<T, P>> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages discarded by the overflow policy since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
