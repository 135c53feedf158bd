//! Ledger module enforcing balance invariants over an [`AccountStore`].
//!
//! The ledger keeps no account data of its own. Every call opens one store
//! session, and mutations hold the mutex of each account they touch for the
//! whole read-check-write, taken in ascending id order.

pub mod error;
pub mod interface;
pub mod locks;

use {
    crate::{
        ledger::{error::LedgerError, interface::LedgerInterface, locks::AccountLocks},
        models::{Account, AccountId, NewAccount},
        persistence::{AccountStore, StoreError, StoreSession},
    },
    rust_decimal::Decimal,
    tracing::{debug, warn},
};

pub struct Ledger<S> {
    store: S,
    locks: AccountLocks,
}

impl<S: AccountStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Ledger {
            store,
            locks: AccountLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn begin(&self) -> Result<S::Session<'_>, LedgerError> {
        self.store.begin().map_err(|e| {
            tracing::error!("Failed to open store session: {}", e);
            LedgerError::from(e)
        })
    }

    /// Runs a read-check-write against a single account under its lock.
    fn mutate_account<F>(&self, id: AccountId, mutate: F) -> Result<Account, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<(), LedgerError>,
    {
        let lock_set = self.locks.ordered(&[id]);
        let _guards = lock_set.acquire()?;

        let mut session = self.begin()?;
        let mut account = session.get(id)?.ok_or(LedgerError::AccountNotFound(id))?;

        mutate(&mut account)?;

        let saved = session.save(&account)?;
        session.commit()?;

        Ok(saved)
    }
}

/// Amounts moved by deposits, withdrawals and transfers must be positive.
fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        warn!("Rejected non-positive amount {}", amount);
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(amount)
}

fn debit(account: &mut Account, amount: Decimal) -> Result<(), LedgerError> {
    if account.balance < amount {
        warn!(
            "Insufficient funds in account {}: {} < {}",
            account.id, account.balance, amount
        );
        return Err(LedgerError::InsufficientFunds {
            id: account.id,
            available: account.balance,
            requested: amount,
        });
    }
    account.balance -= amount;
    Ok(())
}

fn credit(account: &mut Account, amount: Decimal) -> Result<(), LedgerError> {
    let balance = account
        .balance
        .checked_add(amount)
        .ok_or(LedgerError::InvalidAmount(amount))?;

    // Past 28 significant digits the sum is rounded and part of `amount` is lost.
    let exact = balance.scale() >= account.balance.scale().max(amount.scale())
        && balance.checked_sub(amount) == Some(account.balance);
    if !exact {
        warn!(
            "Rejected credit of {} to account {}: balance {} cannot hold it exactly",
            amount, account.id, account.balance
        );
        return Err(LedgerError::InvalidAmount(amount));
    }

    account.balance = balance;
    Ok(())
}

impl<S: AccountStore> LedgerInterface for Ledger<S> {
    fn create_account(&self, new_account: NewAccount) -> Result<Account, LedgerError> {
        if new_account.balance < Decimal::ZERO {
            warn!("Rejected negative opening balance {}", new_account.balance);
            return Err(LedgerError::InvalidAmount(new_account.balance));
        }

        let lock_set = self.locks.ordered(new_account.id.as_slice());
        let _guards = lock_set.acquire()?;

        let mut session = self.begin()?;

        if let Some(id) = new_account.id {
            if session.exists(id)? {
                warn!("Refusing to overwrite existing account {}", id);
                return Err(LedgerError::AccountAlreadyExists(id));
            }
        }

        let account = session.insert(new_account).map_err(|e| match e {
            StoreError::IdTaken(id) => LedgerError::AccountAlreadyExists(id),
            e => LedgerError::from(e),
        })?;
        session.commit()?;

        debug!("Created account {} for {:?}", account.id, account.holder_name);

        Ok(account)
    }

    fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let mut session = self.begin()?;
        session.get(id)?.ok_or(LedgerError::AccountNotFound(id))
    }

    fn deposit(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        let amount = validate_amount(amount)?;
        let account = self.mutate_account(id, |account| credit(account, amount))?;

        debug!("Deposited {} into account {}", amount, id);

        Ok(account)
    }

    fn withdraw(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        let amount = validate_amount(amount)?;
        let account = self.mutate_account(id, |account| debit(account, amount))?;

        debug!("Withdrew {} from account {}", amount, id);

        Ok(account)
    }

    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<(Account, Account), LedgerError> {
        if from == to {
            warn!("Rejected transfer from account {} to itself", from);
            return Err(LedgerError::InvalidRequest(
                "source and destination accounts must differ".to_string(),
            ));
        }
        let amount = validate_amount(amount)?;

        let lock_set = self.locks.ordered(&[from, to]);
        let _guards = lock_set.acquire()?;

        // Any early return drops the session, which rolls it back.
        let mut session = self.begin()?;

        let mut source = session.get(from)?.ok_or(LedgerError::AccountNotFound(from))?;
        let mut destination = session.get(to)?.ok_or(LedgerError::AccountNotFound(to))?;

        debit(&mut source, amount)?;
        credit(&mut destination, amount)?;

        let source = session.save(&source)?;
        let destination = session.save(&destination)?;
        session.commit()?;

        debug!("Transferred {} from account {} to {}", amount, from, to);

        Ok((source, destination))
    }

    fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let mut session = self.begin()?;
        Ok(session.list()?)
    }

    fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let lock_set = self.locks.ordered(&[id]);
        let _guards = lock_set.acquire()?;

        let mut session = self.begin()?;

        if !session.exists(id)? {
            return Err(LedgerError::AccountNotFound(id));
        }

        session.delete(id)?;
        session.commit()?;

        debug!("Deleted account {}", id);

        Ok(())
    }
}
