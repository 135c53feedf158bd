use {
    clap::Parser,
    coffer::{
        config::CofferClientConfig,
        models::{Account, AccountId, NewAccount},
    },
    rand::{Rng, SeedableRng, seq::IndexedRandom},
    rust_decimal::{Decimal, prelude::ToPrimitive},
    serde_json::json,
    std::{sync::Arc, time::Duration},
    tokio::sync::RwLock,
    tracing::{error, info, warn},
};

type WorkerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(version, about = "Load generator for the coffer HTTP API", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = CofferClientConfig::from_file(&args.config)
        .map_err(|e| format!("Failed to load client configuration file: {}", e))?;

    coffer::logging::init_logging(config.debug, &config.log_dir)?;

    let base_url: Arc<str> =
        format!("http://{}:{}/api/accounts", config.http.address, config.http.port).into();
    let account_ids = Arc::new(RwLock::new(Vec::<AccountId>::new()));
    let client = reqwest::Client::new();

    let mut join_handles = Vec::new();
    for i in 0..config.tasks {
        let handle = tokio::spawn(run_worker(
            i,
            client.clone(),
            base_url.clone(),
            account_ids.clone(),
            config.clone(),
        ));
        join_handles.push(handle);
    }

    info!("Starting load generator with {} tasks...", config.tasks);
    for handle in join_handles {
        match handle.await {
            Ok(Err(e)) => error!("One of the worker tasks failed: {}", e),
            Err(e) => error!("One of the worker tasks panicked: {}", e),
            Ok(Ok(())) => {}
        }
    }
    Ok(())
}

async fn fetch_balance(
    client: &reqwest::Client,
    base_url: &str,
    id: AccountId,
) -> Result<Option<Decimal>, reqwest::Error> {
    let response = client.get(format!("{base_url}/{id}")).send().await?;
    if !response.status().is_success() {
        return Ok(None);
    }
    Ok(Some(response.json::<Account>().await?.balance))
}

async fn run_worker(
    worker_id: u32,
    client: reqwest::Client,
    base_url: Arc<str>,
    account_ids: Arc<RwLock<Vec<AccountId>>>,
    config: CofferClientConfig,
) -> WorkerResult {
    let mut rng = rand::rngs::StdRng::from_os_rng();
    let deposit_threshold = config.create_chance + config.deposit_chance;
    let withdraw_threshold = deposit_threshold + config.withdraw_chance;
    let mut created = 0u64;

    loop {
        let operation_chance = rng.random_range(0..100);

        if operation_chance < config.create_chance {
            created += 1;
            let new_account = NewAccount::new(
                format!("worker-{worker_id}-holder-{created}"),
                Decimal::from(rng.random_range(0..1_000)),
            );

            let Ok(response) = client.post(&*base_url).json(&new_account).send().await else {
                continue;
            };

            if response.status().is_success() {
                let account: Account = response.json().await?;
                {
                    account_ids.write().await.push(account.id);
                }
                info!("[Worker {}] Created account: {}", worker_id, account.id);
            }
        } else if operation_chance < withdraw_threshold {
            let Some(id) = ({ account_ids.read().await.choose(&mut rng).cloned() }) else {
                continue;
            };

            let amount = Decimal::from(rng.random_range(100..500));
            let (action, verb) = if operation_chance < deposit_threshold {
                ("add_deposit", "Deposited")
            } else {
                ("withdraw_deposit", "Withdrew")
            };

            let response = client
                .put(format!("{base_url}/{id}/{action}"))
                .json(&json!({ "amount": amount }))
                .send()
                .await;

            match response {
                Ok(r) if r.status().is_success() => {
                    info!("[Worker {}] {} {} for account {}", worker_id, verb, amount, id);
                }
                Ok(r) => {
                    warn!(
                        "[Worker {}] {} of {} on account {} rejected: {}",
                        worker_id,
                        action,
                        amount,
                        id,
                        r.status()
                    );
                }
                Err(e) => warn!("[Worker {}] {} request failed: {}", worker_id, action, e),
            }
        } else {
            let (source_id, dest_id) = {
                let ids_lock = account_ids.read().await;
                if ids_lock.len() < 2 {
                    // Need at least 2 accounts to transfer between
                    continue;
                }
                let sample: Vec<&AccountId> = ids_lock.choose_multiple(&mut rng, 2).collect();
                (*sample[0], *sample[1])
            };

            let Ok(Some(balance)) = fetch_balance(&client, &base_url, source_id).await else {
                continue;
            };

            let whole_units = balance.trunc().to_i64().unwrap_or(0);
            if whole_units < 1 {
                continue;
            }

            let amount_to_transfer = Decimal::from(rng.random_range(1..=whole_units));

            let response = client
                .put(format!("{base_url}/{source_id}/transfer_money"))
                .json(&json!({ "toAccountId": dest_id, "amount": amount_to_transfer }))
                .send()
                .await;

            match response {
                Ok(r) if r.status().is_success() => {
                    info!(
                        "[Worker {}] Transferred {} from {} to {}",
                        worker_id, amount_to_transfer, source_id, dest_id
                    );
                }
                Ok(r) => {
                    warn!(
                        "[Worker {}] Transfer of {} from {} to {} rejected: {}",
                        worker_id,
                        amount_to_transfer,
                        source_id,
                        dest_id,
                        r.status()
                    );
                }
                Err(e) => {
                    warn!(
                        "[Worker {}] Transfer of {} from {} to {} failed: {}",
                        worker_id, amount_to_transfer, source_id, dest_id, e
                    );
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(config.pause_ms)).await;
    }
}
