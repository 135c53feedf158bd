use {
    coffer::{
        http_server::{SharedLedger, router},
        ledger::Ledger,
        persistence::{MemoryStore, SqliteStore},
    },
    reqwest::StatusCode,
    serde_json::{Value, json},
    std::{sync::Arc, time::Duration},
};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(ledger: SharedLedger) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router(ledger)).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn in_memory() -> Self {
        Self::spawn(Arc::new(Ledger::new(MemoryStore::new()))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create(client: &reqwest::Client, server: &TestServer, name: &str, balance: f64) -> Value {
    let res = client
        .post(server.url("/api/accounts"))
        .json(&json!({ "accountHolderName": name, "balance": balance }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn create_and_fetch_account() {
    let server = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let created = create(&client, &server, "John Doe", 1000.0).await;
    assert_eq!(created["accountHolderName"], "John Doe");
    assert_eq!(created["balance"].as_f64(), Some(1000.0));

    let id = created["id"].as_i64().unwrap();
    let res = client
        .get(server.url(&format!("/api/accounts/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_with_taken_id_conflicts() {
    let server = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/accounts"))
        .json(&json!({ "id": 1, "holderName": "John Doe", "balance": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(server.url("/api/accounts"))
        .json(&json!({ "id": 1, "holderName": "Mallory", "balance": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn deposit_and_withdraw() {
    let server = TestServer::in_memory().await;
    let client = reqwest::Client::new();
    let id = create(&client, &server, "John Doe", 1000.0).await["id"]
        .as_i64()
        .unwrap();

    let res = client
        .put(server.url(&format!("/api/accounts/{id}/add_deposit")))
        .json(&json!({ "amount": 200.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["balance"].as_f64(), Some(1200.0));

    let res = client
        .put(server.url(&format!("/api/accounts/{id}/withdraw_deposit")))
        .json(&json!({ "amount": 400.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["balance"].as_f64(), Some(800.0));

    let res = client
        .put(server.url(&format!("/api/accounts/{id}/withdraw_deposit")))
        .json(&json!({ "amount": 5000.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_funds");

    let res = client
        .put(server.url(&format!("/api/accounts/{id}/add_deposit")))
        .json(&json!({ "amount": -5.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_amount");
}

#[tokio::test]
async fn transfer_returns_both_accounts_in_order() {
    let server = TestServer::in_memory().await;
    let client = reqwest::Client::new();
    let a = create(&client, &server, "John Doe", 1000.0).await["id"]
        .as_i64()
        .unwrap();
    let b = create(&client, &server, "Jane Smith", 1500.0).await["id"]
        .as_i64()
        .unwrap();

    let res = client
        .put(server.url(&format!("/api/accounts/{a}/transfer_money")))
        .json(&json!({ "toAccountId": b, "amount": 200.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body[0]["id"].as_i64(), Some(a));
    assert_eq!(body[0]["balance"].as_f64(), Some(800.0));
    assert_eq!(body[1]["id"].as_i64(), Some(b));
    assert_eq!(body[1]["balance"].as_f64(), Some(1700.0));

    let res = client
        .put(server.url(&format!("/api/accounts/{a}/transfer_money")))
        .json(&json!({ "toAccountId": a, "amount": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let res = client
        .put(server.url(&format!("/api/accounts/{a}/transfer_money")))
        .json(&json!({ "toAccountId": 999, "amount": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_and_delete_accounts() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("api.db"), Duration::from_secs(5)).unwrap();
    let server = TestServer::spawn(Arc::new(Ledger::new(store))).await;
    let client = reqwest::Client::new();

    create(&client, &server, "John Doe", 1000.0).await;
    let jane = create(&client, &server, "Jane Smith", 1500.0).await;
    let jane_id = jane["id"].as_i64().unwrap();

    let res = client.get(server.url("/api/accounts")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Value = res.json().await.unwrap();
    assert_eq!(listed[0]["accountHolderName"], "John Doe");
    assert_eq!(listed[1]["accountHolderName"], "Jane Smith");

    let res = client
        .delete(server.url(&format!("/api/accounts/{jane_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Account is deleted successfully!");

    let res = client
        .get(server.url(&format!("/api/accounts/{jane_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(server.url(&format!("/api/accounts/{jane_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let listed: Value = client
        .get(server.url("/api/accounts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn metrics_endpoint_exposes_ledger_counters() {
    let server = TestServer::in_memory().await;
    let client = reqwest::Client::new();
    create(&client, &server, "John Doe", 1.0).await;

    let res = client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = res.text().await.unwrap();
    assert!(text.contains("ledger_operations_processed_total"));
    assert!(text.contains("accounts_created_total"));
}
