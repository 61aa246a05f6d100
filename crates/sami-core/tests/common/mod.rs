#![allow(dead_code)]

use std::sync::Arc;

use sami_core::auth::{MemoryTokenStorage, SessionStore};
use sami_core::ApiClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_PREFIX: &str = "/api/v1";

pub fn route(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn user_json() -> Value {
    json!({
        "id": 42,
        "first_name": "Ana",
        "last_name": "Ruiz",
        "email": "user@x.com",
        "role": "supervisor",
        "department": "Logistics",
        "is_active": true
    })
}

pub struct Harness {
    pub server: MockServer,
    pub storage: Arc<MemoryTokenStorage>,
    pub api: ApiClient,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_storage(MemoryTokenStorage::new()).await
    }

    pub async fn with_token(token: &str) -> Self {
        Self::with_storage(MemoryTokenStorage::with_token(token)).await
    }

    async fn with_storage(storage: MemoryTokenStorage) -> Self {
        let server = MockServer::start().await;
        let storage = Arc::new(storage);
        let api = ApiClient::new(format!("{}{}", server.uri(), API_PREFIX), storage.clone())
            .expect("client builds");
        Self {
            server,
            storage,
            api,
        }
    }

    pub fn session(&self) -> SessionStore {
        SessionStore::new(self.api.clone())
    }

    /// A fresh client and store over the same storage, as after a restart
    pub fn reloaded_session(&self) -> SessionStore {
        let api = ApiClient::new(
            format!("{}{}", self.server.uri(), API_PREFIX),
            self.storage.clone(),
        )
        .expect("client builds");
        SessionStore::new(api)
    }

    pub async fn authorization_headers(&self) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|req| {
                req.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }
}
