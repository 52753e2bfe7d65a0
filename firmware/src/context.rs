//! Shared application context
//!
//! One typed context object is allocated at boot and passed by reference
//! into every task. The fields encode the cross-task contracts: the link
//! session writes connectivity and entity state, the time-sync task writes
//! the wall clock, the display tick reads all of it and owns the frame
//! counter.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use matrixclock_hass::Registry;
use matrixclock_link::ConnectionState;

pub(crate) const MAX_ENTITIES: usize = 8;

pub(crate) type EntityRegistry = Registry<MAX_ENTITIES>;
pub(crate) type RegistryCell = Mutex<CriticalSectionRawMutex, RefCell<EntityRegistry>>;

/// Atomic tri-state connectivity flag.
///
/// Written only by the link session task; display logic only reads it.
pub(crate) struct ConnectivityCell(AtomicU8);

impl ConnectivityCell {
    const UNKNOWN: u8 = 0;
    const ONLINE: u8 = 1;
    const OFFLINE: u8 = 2;

    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(Self::UNKNOWN))
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        let raw = match state {
            ConnectionState::Unknown => Self::UNKNOWN,
            ConnectionState::Online => Self::ONLINE,
            ConnectionState::Offline => Self::OFFLINE,
        };
        self.0.store(raw, Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> ConnectionState {
        match self.0.load(Ordering::Relaxed) {
            Self::ONLINE => ConnectionState::Online,
            Self::OFFLINE => ConnectionState::Offline,
            _ => ConnectionState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ClockAnchor {
    /// Local civil time (UTC + timezone offset) at the anchor instant.
    local: i64,
    at: Instant,
}

/// Wall clock anchored to the monotonic timer by the time-sync task.
pub(crate) struct WallClock {
    anchor: Mutex<CriticalSectionRawMutex, Cell<Option<ClockAnchor>>>,
}

impl WallClock {
    pub(crate) const fn new() -> Self {
        Self {
            anchor: Mutex::new(Cell::new(None)),
        }
    }

    pub(crate) fn set(&self, unix_utc: i64, offset_seconds: i32) {
        let anchor = ClockAnchor {
            local: unix_utc + i64::from(offset_seconds),
            at: Instant::now(),
        };
        self.anchor.lock(|cell| cell.set(Some(anchor)));
    }

    /// Current local civil time in seconds, or `None` before the first
    /// successful sync.
    pub(crate) fn now_local(&self) -> Option<i64> {
        self.anchor.lock(|cell| {
            cell.get()
                .map(|anchor| anchor.local + anchor.at.elapsed().as_secs() as i64)
        })
    }
}

pub(crate) struct AppContext {
    pub connectivity: ConnectivityCell,
    pub frame: AtomicU32,
    pub entities: RegistryCell,
    pub clock: WallClock,
}

impl AppContext {
    pub(crate) fn new(registry: EntityRegistry) -> Self {
        Self {
            connectivity: ConnectivityCell::new(),
            frame: AtomicU32::new(0),
            entities: Mutex::new(RefCell::new(registry)),
            clock: WallClock::new(),
        }
    }
}
