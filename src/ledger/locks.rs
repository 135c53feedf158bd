//! Per-account mutexes used to serialize mutations of the same account.

use {
    crate::{ledger::error::LedgerError, models::AccountId},
    dashmap::DashMap,
    std::sync::{Arc, Mutex, MutexGuard},
};

type AccountMutex = Arc<Mutex<()>>;

#[derive(Default)]
pub struct AccountLocks {
    // Handles are only cloned under the shard lock, so an entry whose sole
    // owner is the map has no holder and no waiter.
    locks: DashMap<AccountId, AccountMutex>,
}

impl AccountLocks {
    /// Returns the mutexes for `ids`, sorted by id with duplicates removed.
    pub fn ordered(&self, ids: &[AccountId]) -> LockSet<'_> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let handles = ids
            .into_iter()
            .map(|id| (id, self.locks.entry(id).or_default().value().clone()))
            .collect();

        LockSet {
            locks: &self.locks,
            handles,
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Mutexes for one ledger call. Dropping the set evicts entries nobody else
/// holds, so ids that never existed do not accumulate.
pub struct LockSet<'a> {
    locks: &'a DashMap<AccountId, AccountMutex>,
    handles: Vec<(AccountId, AccountMutex)>,
}

impl LockSet<'_> {
    /// Locks every mutex in ascending id order.
    pub fn acquire(&self) -> Result<Vec<MutexGuard<'_, ()>>, LedgerError> {
        self.handles
            .iter()
            .map(|(_, handle)| {
                handle
                    .lock()
                    .map_err(|_| LedgerError::FailedToAcquireAccountLock)
            })
            .collect()
    }
}

impl Drop for LockSet<'_> {
    fn drop(&mut self) {
        for (id, handle) in self.handles.drain(..) {
            drop(handle);
            self.locks
                .remove_if(&id, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}
