mod home;
mod pokemons;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;

use crate::state::AppState;

pub use home::GREETING;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::greeting))
        .route("/healthz", get(home::healthz))
        .route("/pokemons", get(pokemons::list).post(pokemons::create))
        .route(
            "/pokemons/{id}",
            get(pokemons::get)
                .put(pokemons::update)
                .delete(pokemons::delete),
        )
        .route("/pokemons/name/{nom}", get(pokemons::find_by_name))
        .fallback(not_found)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
