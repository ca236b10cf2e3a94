//! Single-slot cache cell that never blocks its readers

use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Holds the latest computed value tagged with the sequence number it was
/// computed under.
///
/// [`invalidate`](Self::invalidate) bumps the sequence number. A reader whose
/// sequence matches the stored tag gets the cached value; otherwise it
/// computes a fresh one and publishes it if no invalidation happened in the
/// meantime. The slot is only ever touched through `try_read`/`try_write`, so
/// a busy slot means "compute it yourself", never "wait".
pub struct LockFreeCache<T> {
    seqno: AtomicU64,
    slot: RwLock<Option<(u64, T)>>,
}

impl<T: Clone> LockFreeCache<T> {
    pub fn new() -> Self {
        Self {
            seqno: AtomicU64::new(0),
            slot: RwLock::new(None),
        }
    }

    /// Mark the cached value stale
    pub fn invalidate(&self) {
        self.seqno.fetch_add(1, Ordering::AcqRel);
    }

    /// Current sequence number
    pub fn sequence(&self) -> u64 {
        self.seqno.load(Ordering::Acquire)
    }

    /// Cached value if it is still current
    pub fn peek(&self) -> Option<T> {
        let seq = self.sequence();
        let guard = self.slot.try_read().ok()?;
        match guard.as_ref() {
            Some((tag, value)) if *tag == seq => Some(value.clone()),
            _ => None,
        }
    }

    /// Cached value, or `calculate()` when stale or the slot is busy
    pub fn get_value(&self, calculate: impl FnOnce() -> T) -> T {
        let seq = self.sequence();
        if let Ok(guard) = self.slot.try_read() {
            if let Some((tag, value)) = guard.as_ref() {
                if *tag == seq {
                    return value.clone();
                }
            }
        }
        let value = calculate();
        if let Ok(mut guard) = self.slot.try_write() {
            if self.sequence() == seq {
                *guard = Some((seq, value.clone()));
            }
        }
        value
    }
}

impl<T: Clone> Default for LockFreeCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LockFreeCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeCache")
            .field("seqno", &self.seqno.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
