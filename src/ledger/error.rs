use {
    crate::{models::AccountId, persistence::StoreError},
    rust_decimal::Decimal,
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account {0} doesn't exist")]
    AccountNotFound(AccountId),
    #[error("Account {0} already exists")]
    AccountAlreadyExists(AccountId),
    #[error("Insufficient funds in account {id}: available {available}, requested {requested}")]
    InsufficientFunds {
        id: AccountId,
        available: Decimal,
        requested: Decimal,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Failed to acquire account lock")]
    FailedToAcquireAccountLock,
}
