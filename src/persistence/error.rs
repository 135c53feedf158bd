use {crate::models::AccountId, thiserror::Error};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored balance {value:?} of account {id} is not a valid decimal")]
    CorruptBalance { id: AccountId, value: String },
    #[error("Account {0} is not stored")]
    NotFound(AccountId),
    #[error("Account id {0} is already taken")]
    IdTaken(AccountId),
    #[error("No account ids left to assign")]
    IdSpaceExhausted,
    #[error("Failed to acquire store lock")]
    FailedToAcquireStoreLock,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
