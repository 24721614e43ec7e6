//! Test utilities for khata-core
//!
//! This module provides a mock AI server speaking the Ollama generate API,
//! used for development and integration tests of the AI fallback path.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock AI server for testing and development
pub struct MockAiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Generate endpoint: answers single and batch categorization prompts
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let response = if request.prompt.contains("Transactions:") {
        handle_batch_mock(&request.prompt)
    } else {
        handle_single_mock(&request.prompt)
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// Answer a single-transaction prompt, wrapped in prose to exercise the
/// balanced-brace extraction on the client side
fn handle_single_mock(prompt: &str) -> String {
    let merchant = extract_field(prompt, "- Merchant: ").unwrap_or_default();
    let (category, confidence) = classify_merchant_mock(&merchant);
    format!(
        "Sure, here is the categorization:\n{{\"category\": \"{}\", \"confidence\": {}}}\nHope that helps!",
        category, confidence
    )
}

/// Answer a batch prompt by classifying each numbered "N. Merchant: X," line
fn handle_batch_mock(prompt: &str) -> String {
    let mut items = Vec::new();

    for line in prompt.lines() {
        let line = line.trim();
        let Some(dot) = line.find(". Merchant: ") else {
            continue;
        };
        let Ok(index) = line[..dot].parse::<usize>() else {
            continue;
        };
        let after = &line[dot + 12..];
        let merchant = after.split(',').next().unwrap_or("").trim();
        let (category, confidence) = classify_merchant_mock(merchant);
        items.push(format!(
            "{{\"index\": {}, \"category\": \"{}\", \"confidence\": {}}}",
            index, category, confidence
        ));
    }

    format!("Here you go:\n[{}]", items.join(", "))
}

/// Hardcoded classification patterns for testing/dev purposes
fn classify_merchant_mock(merchant: &str) -> (&'static str, f64) {
    let m = merchant.to_uppercase();

    if m.contains("SWIGGY") || m.contains("ZOMATO") {
        ("FOOD", 0.92)
    } else if m.contains("DUNZO") || m.contains("BIGBASKET") {
        ("GROCERIES", 0.9)
    } else if m.contains("UBER") || m.contains("OLA") {
        ("TRANSPORT", 0.9)
    } else if m.contains("NETFLIX") || m.contains("HOTSTAR") {
        ("ENTERTAINMENT", 0.95)
    } else if m.contains("AMAZON") || m.contains("FLIPKART") {
        ("SHOPPING", 0.88)
    } else if m.contains("IRCTC") || m.contains("INDIGO") {
        ("TRAVEL", 0.9)
    } else {
        ("OTHER", 0.4)
    }
}

/// Extract the text after `marker` up to the end of the line
fn extract_field(prompt: &str, marker: &str) -> Option<String> {
    let start = prompt.find(marker)? + marker.len();
    let rest = &prompt[start..];
    let end = rest.find('\n').unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

// Request/Response types for the mock server

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}
