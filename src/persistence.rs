//! Account storage behind a narrow transactional interface.
//!
//! The ledger never talks to a backend directly: it opens a [`StoreSession`]
//! per call, does its reads and writes through it and commits. Dropping a
//! session without calling [`StoreSession::commit`] discards every write made
//! through it.

pub mod error;
pub mod memory;
pub mod sqlite;

pub use {error::StoreError, memory::MemoryStore, sqlite::SqliteStore};

use crate::models::{Account, AccountId, NewAccount};

/// A source of transactional sessions over account records.
pub trait AccountStore: Send + Sync {
    type Session<'a>: StoreSession
    where
        Self: 'a;

    /// Opens a new session. Sessions are never shared between ledger calls.
    fn begin(&self) -> Result<Self::Session<'_>, StoreError>;
}

/// One transactional scope against the store.
pub trait StoreSession {
    fn get(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Persists a brand new record, assigning the next id when none is given.
    fn insert(&mut self, account: NewAccount) -> Result<Account, StoreError>;

    /// Writes the record under its id, overwriting whatever was there.
    fn save(&mut self, account: &Account) -> Result<Account, StoreError>;

    fn exists(&mut self, id: AccountId) -> Result<bool, StoreError>;

    /// Removes the record. Fails with [`StoreError::NotFound`] when it is absent.
    fn delete(&mut self, id: AccountId) -> Result<(), StoreError>;

    /// All records in ascending id order.
    fn list(&mut self) -> Result<Vec<Account>, StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}
