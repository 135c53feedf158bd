use {
    crate::{
        ledger::error::LedgerError,
        models::{Account, AccountId, NewAccount},
    },
    rust_decimal::Decimal,
};

pub trait LedgerInterface {
    /// Opens a new account. A caller-supplied id must not be in use.
    fn create_account(&self, new_account: NewAccount) -> Result<Account, LedgerError>;

    /// Gets a copy of an account by its id.
    fn get_account(&self, id: AccountId) -> Result<Account, LedgerError>;

    /// Credits `amount` to the account and returns its new state.
    fn deposit(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError>;

    /// Debits `amount` from the account and returns its new state.
    fn withdraw(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError>;

    /// Atomically moves `amount` between two accounts, returning `(from, to)`.
    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<(Account, Account), LedgerError>;

    /// All accounts, in the store's enumeration order.
    fn list_accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// Permanently removes an account.
    fn delete_account(&self, id: AccountId) -> Result<(), LedgerError>;
}
