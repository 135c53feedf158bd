use crate::metrics::{
    ACCOUNT_CREATION_TIME_SECONDS, ACCOUNTS_CREATED_TOTAL, ACCOUNTS_DELETED_TOTAL,
    DELETION_TIME_SECONDS, DEPOSIT_TIME_SECONDS, GET_ACCOUNT_TIME_SECONDS,
    LIST_ACCOUNTS_TIME_SECONDS, OPERATIONS_FAILED_TOTAL, OPERATIONS_PROCESSED_TOTAL,
    TRANSFER_TIME_SECONDS, WITHDRAWAL_TIME_SECONDS,
};

use {
    crate::{
        config::HttpConfig,
        ledger::{error::LedgerError, interface::LedgerInterface},
        measure,
        metrics::handler::render,
        models::{Account, AccountId, NewAccount},
    },
    axum::{
        Json, Router,
        extract::{Path, State},
        http::{StatusCode, header},
        response::{IntoResponse, Response},
        routing::{get, put},
    },
    rust_decimal::Decimal,
    serde::Deserialize,
    serde_json::json,
    std::sync::Arc,
    tokio::net::TcpListener,
    tracing::{error, info, warn},
};

pub type SharedLedger = Arc<dyn LedgerInterface + Send + Sync>;

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to_account_id: AccountId,
    pub amount: Decimal,
}

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError::Ledger(e)
    }
}

fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let e = match self {
            ApiError::Ledger(e) => e,
            ApiError::Internal(message) => {
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message);
            }
        };

        let message = e.to_string();
        match e {
            LedgerError::AccountNotFound(_) => {
                json_error(StatusCode::NOT_FOUND, "not_found", message)
            }
            LedgerError::AccountAlreadyExists(_) => {
                json_error(StatusCode::CONFLICT, "conflict", message)
            }
            LedgerError::InsufficientFunds { .. } => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds", message)
            }
            LedgerError::InvalidRequest(_) => {
                json_error(StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            LedgerError::InvalidAmount(_) => {
                json_error(StatusCode::BAD_REQUEST, "invalid_amount", message)
            }
            LedgerError::StoreUnavailable(_) => {
                json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message)
            }
            LedgerError::FailedToAcquireAccountLock => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        }
    }
}

/// Runs a ledger call on the blocking pool and records its outcome.
async fn call_ledger<T, F>(ledger: SharedLedger, operation: &'static str, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&(dyn LedgerInterface + Send + Sync)) -> Result<T, LedgerError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(ledger.as_ref()))
        .await
        .map_err(|e| {
            error!("Ledger task for {} panicked: {}", operation, e);
            ApiError::Internal(format!("{operation} did not complete"))
        })?;

    match result {
        Ok(value) => {
            OPERATIONS_PROCESSED_TOTAL.inc();
            info!("Successfully processed {} request", operation);
            Ok(value)
        }
        Err(e) => {
            OPERATIONS_FAILED_TOTAL.inc();
            match e {
                LedgerError::StoreUnavailable(_) | LedgerError::FailedToAcquireAccountLock => {
                    error!("Failed to process {} request: {}", operation, e)
                }
                _ => warn!("Rejected {} request: {}", operation, e),
            }
            Err(e.into())
        }
    }
}

async fn create_account(
    State(ledger): State<SharedLedger>,
    Json(new_account): Json<NewAccount>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = call_ledger(ledger, "create_account", move |ledger| {
        measure!(ACCOUNT_CREATION_TIME_SECONDS, {
            ledger.create_account(new_account)
        })
    })
    .await?;

    ACCOUNTS_CREATED_TOTAL.inc();

    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(ledger): State<SharedLedger>,
    Path(id): Path<AccountId>,
) -> Result<Json<Account>, ApiError> {
    let account = call_ledger(ledger, "get_account", move |ledger| {
        measure!(GET_ACCOUNT_TIME_SECONDS, { ledger.get_account(id) })
    })
    .await?;

    Ok(Json(account))
}

async fn list_accounts(State(ledger): State<SharedLedger>) -> Result<Json<Vec<Account>>, ApiError> {
    let accounts = call_ledger(ledger, "list_accounts", |ledger| {
        measure!(LIST_ACCOUNTS_TIME_SECONDS, { ledger.list_accounts() })
    })
    .await?;

    Ok(Json(accounts))
}

async fn delete_account(
    State(ledger): State<SharedLedger>,
    Path(id): Path<AccountId>,
) -> Result<&'static str, ApiError> {
    call_ledger(ledger, "delete_account", move |ledger| {
        measure!(DELETION_TIME_SECONDS, { ledger.delete_account(id) })
    })
    .await?;

    ACCOUNTS_DELETED_TOTAL.inc();

    Ok("Account is deleted successfully!")
}

async fn deposit(
    State(ledger): State<SharedLedger>,
    Path(id): Path<AccountId>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<Account>, ApiError> {
    let account = call_ledger(ledger, "deposit", move |ledger| {
        measure!(DEPOSIT_TIME_SECONDS, { ledger.deposit(id, request.amount) })
    })
    .await?;

    Ok(Json(account))
}

async fn withdraw(
    State(ledger): State<SharedLedger>,
    Path(id): Path<AccountId>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<Account>, ApiError> {
    let account = call_ledger(ledger, "withdraw", move |ledger| {
        measure!(WITHDRAWAL_TIME_SECONDS, { ledger.withdraw(id, request.amount) })
    })
    .await?;

    Ok(Json(account))
}

async fn transfer(
    State(ledger): State<SharedLedger>,
    Path(id): Path<AccountId>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<[Account; 2]>, ApiError> {
    let (from, to) = call_ledger(ledger, "transfer", move |ledger| {
        measure!(TRANSFER_TIME_SECONDS, {
            ledger.transfer(id, request.to_account_id, request.amount)
        })
    })
    .await?;

    Ok(Json([from, to]))
}

async fn metrics() -> Response {
    match render(prometheus::default_registry()) {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::Internal(format!("failed to encode metrics: {e}")).into_response(),
    }
}

pub fn router(ledger: SharedLedger) -> Router {
    crate::metrics::register_all();

    Router::new()
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route("/api/accounts/{id}", get(get_account).delete(delete_account))
        .route("/api/accounts/{id}/add_deposit", put(deposit))
        .route("/api/accounts/{id}/withdraw_deposit", put(withdraw))
        .route("/api/accounts/{id}/transfer_money", put(transfer))
        .route("/metrics", get(metrics))
        .with_state(ledger)
}

pub async fn start_http_service(
    config: HttpConfig,
    ledger: SharedLedger,
    mut shutdown_receiver: tokio::sync::broadcast::Receiver<()>,
) {
    let address = format!("{}:{}", config.address, config.port);
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind HTTP server to {}: {}", address, e);
            return;
        }
    };

    let shutdown = async move {
        shutdown_receiver.recv().await.ok();
        info!("HTTP server is shutting down...");
    };

    info!("Initializing HTTP server at {}", address);

    if let Err(e) = axum::serve(listener, router(ledger))
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!("Error in HTTP server: {}", e);
    }
}
