//! Latest-value snapshot channel.
//!
//! A [`Channel`] is the producer handle, a [`Feed`] the consumer side.
//! The producer overwrites a lock-guarded slot and bumps a sequence
//! counter; the consumer clones the slot out only when the counter moved,
//! so an idle channel costs one atomic load per tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

struct Slot<T> {
    data: T,
    valid: bool,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    seq: AtomicU64,
}

/// Producer handle. Cloneable; the last writer wins.
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone + Default> Channel<T> {
    /// Publish a valid message.
    pub fn send(&self, data: T) {
        self.send_with_valid(data, true);
    }

    /// Publish a message with an explicit validity flag.
    pub fn send_with_valid(&self, data: T, valid: bool) {
        {
            let mut slot = self.shared.slot.lock();
            slot.data = data;
            slot.valid = valid;
        }
        self.shared.seq.fetch_add(1, Ordering::Release);
    }

    /// Number of messages published so far.
    pub fn seq(&self) -> u64 {
        self.shared.seq.load(Ordering::Acquire)
    }

    /// Attach another consumer to this channel (used by tests and by the
    /// outbound side, where collaborators subscribe to supervisor output).
    pub fn subscribe(&self, stale_ticks: u64) -> Feed<T> {
        Feed::attach(self.shared.clone(), stale_ticks, false)
    }
}

/// Consumer side: local copy of the latest message plus liveness state.
pub struct Feed<T> {
    shared: Arc<Shared<T>>,
    data: T,
    valid: bool,
    seen_seq: u64,
    received: bool,
    rcv_frame: u64,
    stale_ticks: u64,
    ignore_alive: bool,
}

/// Create a connected producer/consumer pair.
///
/// `stale_ticks` is the liveness window: the feed counts as alive while the
/// freshest message is at most that many control ticks old.
pub fn channel<T: Clone + Default>(stale_ticks: u64) -> (Channel<T>, Feed<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            data: T::default(),
            valid: false,
        }),
        seq: AtomicU64::new(0),
    });
    let tx = Channel {
        shared: shared.clone(),
    };
    let rx = Feed::attach(shared, stale_ticks, false);
    (tx, rx)
}

impl<T: Clone> Feed<T> {
    fn attach(shared: Arc<Shared<T>>, stale_ticks: u64, ignore_alive: bool) -> Self {
        let data = shared.slot.lock().data.clone();
        Self {
            shared,
            data,
            valid: false,
            seen_seq: 0,
            received: false,
            rcv_frame: 0,
            stale_ticks,
            ignore_alive,
        }
    }

    /// Poll the slot; clones out only when a new message arrived.
    /// Returns whether the local snapshot changed.
    pub fn update(&mut self, frame: u64) -> bool {
        let cur = self.shared.seq.load(Ordering::Acquire);
        if cur == self.seen_seq {
            return false;
        }
        {
            let slot = self.shared.slot.lock();
            self.data = slot.data.clone();
            self.valid = slot.valid;
        }
        self.seen_seq = cur;
        self.received = true;
        self.rcv_frame = frame;
        true
    }

    /// Local snapshot of the latest message.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Validity flag of the latest message.
    #[inline]
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Tick on which the latest message was received.
    #[inline]
    pub fn rcv_frame(&self) -> u64 {
        self.rcv_frame
    }

    /// At least one message has ever arrived.
    #[inline]
    pub fn received(&self) -> bool {
        self.received
    }

    /// Exempt this feed from liveness checks (simulation ignore set).
    pub fn set_ignore_alive(&mut self, ignore: bool) {
        self.ignore_alive = ignore;
    }
}

/// Erased liveness/validity view, used to fold over heterogeneous feeds.
/// Feeds in the ignore set pass both checks unconditionally.
pub trait FeedStatus {
    fn alive(&self, frame: u64) -> bool;
    fn valid_or_exempt(&self) -> bool;
}

impl<T: Clone> FeedStatus for Feed<T> {
    fn alive(&self, frame: u64) -> bool {
        self.ignore_alive
            || (self.received && frame.saturating_sub(self.rcv_frame) <= self.stale_ticks)
    }

    fn valid_or_exempt(&self) -> bool {
        self.ignore_alive || self.valid
    }
}
