#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use bank_api_rust::server::{app_with_policy, AppState};
use bank_api_rust::{ErrorStatusPolicy, InMemoryStore, TokenService};
use serde_json::{json, Value};

pub const TEST_SECRET: &str = "integration-test-secret";
pub use bank_api_rust::middleware::TOKEN_HEADER;

pub struct TestServer {
    pub base_url: String,
    pub tokens: TokenService,
    pub store: Arc<InMemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST /account and return the response body
    pub async fn create_account(&self, first_name: &str, last_name: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/account"))
            .json(&json!({ "firstName": first_name, "lastName": last_name }))
            .send()
            .await?;
        anyhow::ensure!(res.status().is_success(), "create failed: {}", res.status());
        Ok(res.json().await?)
    }

    /// GET /account/:id with an optional token
    pub async fn get_account(&self, id: &Value, token: Option<&str>) -> Result<reqwest::Response> {
        let mut req = self.client.get(self.url(&format!("/account/{}", id)));
        if let Some(token) = token {
            req = req.header(TOKEN_HEADER, token);
        }
        Ok(req.send().await?)
    }
}

/// Start the router on a free port with an empty in-memory store
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with_policy(ErrorStatusPolicy::Flat).await
}

pub async fn spawn_server_with_policy(policy: ErrorStatusPolicy) -> Result<TestServer> {
    let store = Arc::new(InMemoryStore::new());
    let tokens = TokenService::new(TEST_SECRET, chrono::Duration::hours(1))?;
    let state = AppState::new(store.clone(), tokens.clone());
    let app = app_with_policy(state, policy);

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        tokens,
        store,
        client: reqwest::Client::new(),
    })
}
