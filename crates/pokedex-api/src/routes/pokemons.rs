use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use pokedex_store::{Document, DocumentStore, Filter, FindQuery, Sort, StoreError, Update};

use crate::error::ApiError;
use crate::params::{Pagination, PokemonPage, Radix, parse_int};
use crate::state::AppState;

/// Run a store call on the blocking pool.
async fn with_store<T, F>(state: AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn DocumentStore) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(state.store.as_ref())).await?
}

fn id_filter(raw: &str) -> Result<Filter, ApiError> {
    let id = parse_int(raw, Radix::Decimal).ok_or_else(|| ApiError::InvalidId(raw.to_string()))?;
    Ok(Filter::eq("id", id))
}

/// A body sent without a JSON content type is not parsed and reads as `{}`.
fn body_document(body: Result<Json<Document>, JsonRejection>) -> Result<Document, ApiError> {
    match body {
        Ok(Json(doc)) => Ok(doc),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Document::new()),
        Err(e) => Err(ApiError::InvalidBody(e.body_text())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<PokemonPage>, ApiError> {
    let pagination = Pagination::from_query(&params);
    let skip = pagination.skip();
    tracing::info!(
        page = pagination.page,
        limit = pagination.limit,
        skip = ?skip,
        "listing pokemons"
    );

    with_store(state, move |store| {
        let skip = skip.ok_or_else(|| StoreError::InvalidQuery("skip overflows".into()))?;
        let pokemons = store.find(&FindQuery {
            filter: Filter::All,
            sort: vec![Sort::asc("id")],
            skip: Some(skip),
            limit: Some(pagination.limit),
        })?;
        // Not linked to the find above; may drift under concurrent writes.
        let total = store.count(&Filter::All)?;

        Ok(Json(PokemonPage {
            pokemons,
            page: pagination.page,
            total,
            pages: pagination.pages(total),
        }))
    })
    .await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let filter = id_filter(&id)?;
    with_store(state, move |store| {
        store.find_one(&filter)?.map(Json).ok_or(ApiError::NotFound)
    })
    .await
}

pub async fn find_by_name(
    State(state): State<AppState>,
    Path(nom): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let filter = Filter::contains_ignore_case("name.french", &nom)?;
    with_store(state, move |store| {
        store.find_one(&filter)?.map(Json).ok_or(ApiError::NotFound)
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let doc = body_document(body)?;
    with_store(state, move |store| {
        let created = store.insert_one(doc)?;
        Ok((StatusCode::CREATED, Json(created)))
    })
    .await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<Document>, ApiError> {
    let filter = id_filter(&id)?;
    let doc = body_document(body)?;
    with_store(state, move |store| {
        let update = Update::parse(&doc)?;
        store
            .find_one_and_update(&filter, &update)?
            .map(Json)
            .ok_or(ApiError::NotFound)
    })
    .await
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = id_filter(&id)?;
    with_store(state, move |store| match store.find_one_and_delete(&filter)? {
        Some(_) => Ok(Json(serde_json::json!({ "message": "Pokemon deleted" }))),
        None => Err(ApiError::NotFound),
    })
    .await
}
