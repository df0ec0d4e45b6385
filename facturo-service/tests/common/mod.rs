//! Shared scaffolding for integration tests.
//!
//! Tests run against a real PostgreSQL pointed to by `TEST_DATABASE_URL` and
//! skip (early return) when it is not set. Isolation between tests comes from
//! multi-tenancy: every TestApp gets a fresh organization id.

#![allow(dead_code)]

use facturo_service::config::{Config, DatabaseConfig, RedisConfig, ServerConfig};
use facturo_service::startup::Application;
use rust_decimal::Decimal;
use secrecy::Secret;
use serde_json::{json, Value};
use std::str::FromStr;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub organization_id: Uuid,
}

impl TestApp {
    pub async fn spawn() -> Option<Self> {
        let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL is not set; skipping integration test");
            return None;
        };

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(database_url),
                max_connections: 5,
                min_connections: 1,
            },
            redis: RedisConfig { url: None },
            service_name: "facturo-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            client,
            organization_id: Uuid::new_v4(),
        })
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("X-Org-ID", self.organization_id.to_string())
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .header("X-Org-ID", self.organization_id.to_string())
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-Org-ID", self.organization_id.to_string())
            .send()
            .await
            .expect("request failed")
    }

    pub async fn get_as(&self, organization_id: Uuid, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-Org-ID", organization_id.to_string())
            .send()
            .await
            .expect("request failed")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .header("X-Org-ID", self.organization_id.to_string())
            .send()
            .await
            .expect("request failed")
    }

    /// Create a document and return (id, number).
    pub async fn create_document(&self, kind: &str, body: &Value) -> (String, String) {
        let response = self.post(&format!("/documents/{}", kind), body).await;
        assert_eq!(response.status(), 201, "create {} failed", kind);
        let value: Value = response.json().await.expect("invalid json");
        (
            value["id"].as_str().expect("missing id").to_string(),
            value["number"].as_str().expect("missing number").to_string(),
        )
    }

    /// Move a document to a new status, asserting success.
    pub async fn set_status(&self, kind: &str, id: &str, status: &str) {
        let response = self
            .post(
                &format!("/documents/{}/{}/status", kind, id),
                &json!({ "status": status }),
            )
            .await;
        assert_eq!(response.status(), 200, "status change to {} failed", status);
    }
}

/// Line item payload.
pub fn item(name: &str, quantity: &str, unit_price: &str, tax_rate: &str) -> Value {
    json!({
        "name": name,
        "quantity": quantity,
        "unit_price": unit_price,
        "tax_rate_percent": tax_rate,
        "is_service": true
    })
}

/// Document payload with an inline client and the given items.
pub fn document_body(items: Vec<Value>) -> Value {
    json!({
        "new_client": { "client_type": "company", "name": "Acme SARL" },
        "issue_date": "2026-01-15",
        "due_date": "2026-02-15",
        "currency_code": "XOF",
        "items": items
    })
}

/// Parse a JSON string field into a Decimal.
pub fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("expected a string amount")).expect("invalid decimal")
}
