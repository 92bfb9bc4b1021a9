use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifiers of announcements already claimed for auto-trade.
///
/// The feed is polled on a fixed interval and a slow cycle can overlap the
/// next one, so the membership check and the insert must be one indivisible
/// step; `HashSet::insert` under the mutex is exactly that. A reservation is
/// released only by an explicit [`rollback`](Self::rollback) after a failed
/// order, never by time. The set is process-lifetime state and grows without
/// bound; after a restart the freshness filter rejects anything old enough to
/// have been seen before.
#[derive(Clone, Default)]
pub struct DedupLedger {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the identifier. Returns true when this caller is the first to
    /// claim it; false means some poll cycle already handled (or is
    /// handling) this announcement.
    pub fn try_reserve(&self, identifier: &str) -> bool {
        self.lock().insert(identifier.to_string())
    }

    /// Releases a claim after a failed order attempt so a later poll cycle
    /// may retry. Removing an absent identifier is a no-op.
    pub fn rollback(&self, identifier: &str) {
        self.lock().remove(identifier);
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.lock().contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner.lock().expect("dedup ledger lock poisoned")
    }
}
