use {
    crate::{
        models::{Account, AccountId, NewAccount},
        persistence::{AccountStore, StoreError, StoreSession},
    },
    std::{
        collections::BTreeMap,
        sync::{Mutex, MutexGuard},
    },
};

struct MemoryState {
    // `None` once an account holds `AccountId::MAX`.
    next_id: Option<AccountId>,
    accounts: BTreeMap<AccountId, Account>,
}

/// In-process store. A session holds the store mutex until it is dropped, so
/// sessions are fully serialized.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: Mutex::new(MemoryState {
                next_id: Some(1),
                accounts: BTreeMap::new(),
            }),
        }
    }
}

impl AccountStore for MemoryStore {
    type Session<'a> = MemorySession<'a>;

    fn begin(&self) -> Result<Self::Session<'_>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::FailedToAcquireStoreLock)?;
        let next_id = state.next_id;

        Ok(MemorySession {
            state,
            next_id,
            staged: BTreeMap::new(),
        })
    }
}

pub struct MemorySession<'a> {
    state: MutexGuard<'a, MemoryState>,
    next_id: Option<AccountId>,
    // `None` marks a staged deletion.
    staged: BTreeMap<AccountId, Option<Account>>,
}

/// Moves the id counter past `used`, the way an AUTOINCREMENT column does.
fn advance(next_id: Option<AccountId>, used: AccountId) -> Option<AccountId> {
    match next_id {
        Some(next) if used < next => Some(next),
        Some(_) => used.checked_add(1),
        None => None,
    }
}

impl StoreSession for MemorySession<'_> {
    fn get(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        match self.staged.get(&id) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.state.accounts.get(&id).cloned()),
        }
    }

    fn insert(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        let id = match account.id {
            Some(id) => id,
            None => self.next_id.ok_or(StoreError::IdSpaceExhausted)?,
        };
        if self.exists(id)? {
            return Err(StoreError::IdTaken(id));
        }
        self.next_id = advance(self.next_id, id);

        let account = account.into_account(id);
        self.staged.insert(id, Some(account.clone()));
        Ok(account)
    }

    fn save(&mut self, account: &Account) -> Result<Account, StoreError> {
        self.next_id = advance(self.next_id, account.id);
        self.staged.insert(account.id, Some(account.clone()));
        Ok(account.clone())
    }

    fn exists(&mut self, id: AccountId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }

    fn delete(&mut self, id: AccountId) -> Result<(), StoreError> {
        if !self.exists(id)? {
            return Err(StoreError::NotFound(id));
        }
        self.staged.insert(id, None);
        Ok(())
    }

    fn list(&mut self) -> Result<Vec<Account>, StoreError> {
        let mut merged = self.state.accounts.clone();
        for (id, staged) in &self.staged {
            match staged {
                Some(account) => merged.insert(*id, account.clone()),
                None => merged.remove(id),
            };
        }
        Ok(merged.into_values().collect())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        for (id, account) in staged {
            match account {
                Some(account) => self.state.accounts.insert(id, account),
                None => self.state.accounts.remove(&id),
            };
        }
        self.state.next_id = self.next_id;
        Ok(())
    }
}
