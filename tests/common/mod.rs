#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

use roster_api::auth::{generate_jwt, AuthError, Claims, GoogleProfile, GoogleVerifier};
use roster_api::config::AppConfig;
use roster_api::database::models::{Project, Role, Stream, User};
use roster_api::database::{Collections, MemoryStore};
use roster_api::{app, AppState};

pub const VALID_TOKEN: &str = "google-token-lead";
pub const STRANGER_TOKEN: &str = "google-token-stranger";
pub const LEAD_EMAIL: &str = "lead@example.com";

/// Accepts two fixed access tokens, rejects everything else
pub struct StubVerifier;

#[async_trait]
impl GoogleVerifier for StubVerifier {
    async fn verify(&self, access_token: &str) -> Result<GoogleProfile, AuthError> {
        let email = match access_token {
            VALID_TOKEN => LEAD_EMAIL,
            STRANGER_TOKEN => "stranger@example.com",
            _ => return Err(AuthError::Rejected("tokeninfo returned 400 Bad Request".into())),
        };
        Ok(GoogleProfile {
            email: email.to_string(),
            aud: None,
            name: None,
        })
    }
}

pub struct Seed {
    pub user: User,
    pub payments: Stream,
    pub lending: Stream,
    pub ledger: Project,
    pub manager: Role,
    pub developer: Role,
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: MemoryStore,
    pub seed: Seed,
    pub config: AppConfig,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve the router in-process on an unused port
    pub async fn spawn() -> Result<Self> {
        let seed = Seed {
            user: User::new(LEAD_EMAIL, "Stream Lead"),
            payments: Stream::new("Payments"),
            lending: Stream::new("Lending"),
            ledger: Project::new("Ledger"),
            manager: Role::new("Project Manager"),
            developer: Role::new("Developer"),
        };
        let store = MemoryStore::with_collections(Collections {
            users: vec![seed.user.clone()],
            streams: vec![seed.payments.clone(), seed.lending.clone()],
            projects: vec![seed.ledger.clone()],
            roles: vec![seed.manager.clone(), seed.developer.clone()],
            ..Default::default()
        });

        let config = AppConfig::development();
        let state = AppState::new(config.clone(), Arc::new(store.clone()), Arc::new(StubVerifier));

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            seed,
            config,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/status")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Session token for the seeded user, signed like the login endpoint would
    pub fn token(&self) -> String {
        let claims = Claims::for_user(&self.seed.user, 1);
        generate_jwt(&claims, &self.config.security).expect("sign test token")
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(self.token())
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(self.token())
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(self.token())
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(self.token())
    }

    /// Create a resource through the API and return its `data` object
    pub async fn create_resource(&self, body: serde_json::Value) -> Result<serde_json::Value> {
        let res = self.post("/resources/create").json(&body).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        let body: serde_json::Value = res.json().await?;
        Ok(body["data"].clone())
    }
}

pub fn resource_body(name: &str, employee_id: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "employeeId": employee_id,
        "email": format!("{}@example.com", name.to_lowercase()),
        "grade": "G4",
        "location": "Pune",
        "virtualTeam": "Core",
        "joinedAt": "2021-06-14",
    })
}
