//! Table of completion handles that have not settled yet.
//!
//! Both sides race for an entry: the drain claims it to run the thunk, the
//! future removes it when its deadline fires. Whoever removes the entry first
//! owns the settlement.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

/// Result of trying to claim an operation for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// Entry was pending and within its deadline; caller must run the thunk.
    Live,
    /// Entry was pending but its deadline passed; it is removed and must not run.
    Expired,
    /// Entry already settled (timed out or abandoned by its future).
    Gone,
}

#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    entries: Mutex<HashMap<u64, Instant>>,
}

impl PendingTable {
    pub(crate) fn insert(&self, id: u64, deadline: Instant) {
        self.lock().insert(id, deadline);
    }

    /// Removes the entry, returning `true` if it was still pending.
    pub(crate) fn remove(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub(crate) fn claim(&self, id: u64, now: Instant) -> Claim {
        match self.lock().remove(&id) {
            Some(deadline) if now < deadline => Claim::Live,
            Some(_) => Claim::Expired,
            None => Claim::Gone,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Instant>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_claim_is_first_settlement_only() {
        let table = PendingTable::default();
        let now = Instant::now();
        table.insert(1, now + Duration::from_secs(1));

        assert_eq!(table.claim(1, now), Claim::Live);
        assert_eq!(table.claim(1, now), Claim::Gone);
        assert!(!table.remove(1));
    }

    #[test]
    fn test_claim_after_deadline_is_expired() {
        let table = PendingTable::default();
        let now = Instant::now();
        table.insert(7, now);

        assert_eq!(table.claim(7, now), Claim::Expired);
        assert_eq!(table.len(), 0);
    }
}
