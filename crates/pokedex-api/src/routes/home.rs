use axum::Json;

pub const GREETING: &str = "Poke Julio";

pub async fn greeting() -> &'static str {
    GREETING
}

/// Liveness only; does not touch the store.
pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
