use axum::{Router, response::Json as ResponseJson, routing::get};
use serde_json::{Value, json};

use crate::AppState;

pub async fn health_check() -> ResponseJson<Value> {
    ResponseJson(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
