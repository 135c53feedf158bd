use prometheus::{Counter, Histogram};

use crate::metrics::handler::{counter, histogram_fast_ops, histogram_slow_ops};
pub mod handler;
lazy_static::lazy_static!(
    pub static ref OPERATIONS_PROCESSED_TOTAL: Counter =
        counter("ledger_operations_processed_total", "Total number of ledger operations that succeeded");

    pub static ref OPERATIONS_FAILED_TOTAL: Counter =
        counter("ledger_operations_failed_total", "Total number of ledger operations that were rejected or failed");

    pub static ref ACCOUNTS_CREATED_TOTAL: Counter =
        counter("accounts_created_total", "Total number of created accounts");

    pub static ref ACCOUNTS_DELETED_TOTAL: Counter =
        counter("accounts_deleted_total", "Total number of deleted accounts");


    pub static ref ACCOUNT_CREATION_TIME_SECONDS: Histogram =
        histogram_slow_ops("account_creation_time_seconds", "Total time spent creating accounts in seconds");

    pub static ref TRANSFER_TIME_SECONDS: Histogram =
        histogram_slow_ops("transfer_time_seconds", "Total time spent transferring funds in seconds");

    pub static ref DEPOSIT_TIME_SECONDS: Histogram =
        histogram_slow_ops("deposit_time_seconds", "Total time spent depositing funds in seconds");

    pub static ref WITHDRAWAL_TIME_SECONDS: Histogram =
        histogram_slow_ops("withdrawal_time_seconds", "Total time spent withdrawing funds in seconds");

    pub static ref DELETION_TIME_SECONDS: Histogram =
        histogram_slow_ops("account_deletion_time_seconds", "Total time spent deleting accounts in seconds");

    pub static ref GET_ACCOUNT_TIME_SECONDS: Histogram =
        histogram_fast_ops("get_account_time_seconds", "Total time spent fetching a single account in seconds");

    pub static ref LIST_ACCOUNTS_TIME_SECONDS: Histogram =
        histogram_fast_ops("list_accounts_time_seconds", "Total time spent listing accounts in seconds");
);

/// Forces every metric into the default registry so `/metrics` lists them
/// before their first observation.
pub fn register_all() {
    lazy_static::initialize(&OPERATIONS_PROCESSED_TOTAL);
    lazy_static::initialize(&OPERATIONS_FAILED_TOTAL);
    lazy_static::initialize(&ACCOUNTS_CREATED_TOTAL);
    lazy_static::initialize(&ACCOUNTS_DELETED_TOTAL);
    lazy_static::initialize(&ACCOUNT_CREATION_TIME_SECONDS);
    lazy_static::initialize(&TRANSFER_TIME_SECONDS);
    lazy_static::initialize(&DEPOSIT_TIME_SECONDS);
    lazy_static::initialize(&WITHDRAWAL_TIME_SECONDS);
    lazy_static::initialize(&DELETION_TIME_SECONDS);
    lazy_static::initialize(&GET_ACCOUNT_TIME_SECONDS);
    lazy_static::initialize(&LIST_ACCOUNTS_TIME_SECONDS);
}
