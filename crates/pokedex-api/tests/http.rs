use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use pokedex_api::server::app;
use pokedex_api::state::AppState;
use pokedex_store::{Document, DocumentStore, MemoryStore, doc};
use serde_json::{Value, json};
use tower::ServiceExt;

fn pokemon(id: i32) -> Document {
    doc! {
        "id": id,
        "name": {
            "english": format!("Mon{id}"),
            "french": format!("Nom{id}"),
        },
        "type": ["Normal"],
        "base": { "HP": 40 + id, "Attack": 50 },
    }
}

/// Records with ids 1..=20, inserted in reverse so natural order is not id order.
fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_many((1..=20).rev().map(pokemon).collect()).unwrap();
    Arc::new(store)
}

fn named_store() -> Arc<MemoryStore> {
    let store = seeded_store();
    store
        .insert_many(vec![
            doc! { "id": 25, "name": { "english": "Pikachu", "french": "Pikachu" } },
            doc! { "id": 26, "name": { "english": "Raichu", "french": "Raichu" } },
        ])
        .unwrap();
    store
}

fn build_app(store: Arc<MemoryStore>) -> Router {
    app(AppState::new(store))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

fn ids(body: &Value) -> Vec<i64> {
    body["pokemons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

// ── GET / ───────────────────────────────────────────────────────

#[tokio::test]
async fn root_returns_greeting() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String(pokedex_api::routes::GREETING.into()));
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/digimons").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));
}

// ── GET /pokemons ───────────────────────────────────────────────

#[tokio::test]
async fn list_second_page() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons?page=2&limit=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), (10..=18).collect::<Vec<_>>());
    assert_eq!(body["page"], 2);
    assert_eq!(body["total"], 20);
    assert_eq!(body["pages"], 3);
}

#[tokio::test]
async fn list_defaults_to_first_page_of_nine() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), (1..=9).collect::<Vec<_>>());
    assert_eq!(body["page"], 1);
    assert_eq!(body["pages"], 3);
}

#[tokio::test]
async fn list_non_numeric_params_fall_back_to_defaults() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons?page=abc&limit=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(ids(&body).len(), 9);

    let (_, body) = get(&app, "/pokemons?page=0&limit=0").await;
    assert_eq!(body["page"], 1);
    assert_eq!(ids(&body).len(), 9);
}

#[tokio::test]
async fn list_reads_leading_digits() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons?page=3xyz&limit=5.7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 3);
    assert_eq!(ids(&body), (11..=15).collect::<Vec<_>>());
    assert_eq!(body["pages"], 4);
}

#[tokio::test]
async fn list_reads_hex_prefixed_params() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons?page=0x2&limit=0xA").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(ids(&body), (11..=20).collect::<Vec<_>>());
    assert_eq!(body["pages"], 2);

    let (_, body) = get(&app, "/pokemons?page=0x&limit=0x").await;
    assert_eq!(body["page"], 1);
    assert_eq!(ids(&body), (1..=9).collect::<Vec<_>>());
}

#[tokio::test]
async fn get_id_is_read_as_decimal() {
    let app = build_app(seeded_store());
    let (status, _) = get(&app, "/pokemons/0x2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_at_most_limit() {
    let app = build_app(seeded_store());
    for (page, limit) in [(1, 1), (1, 7), (2, 7), (4, 7), (1, 50), (9, 3)] {
        let (status, body) = get(&app, &format!("/pokemons?page={page}&limit={limit}")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(ids(&body).len() <= limit as usize);
        let total = body["total"].as_i64().unwrap();
        assert_eq!(body["pages"].as_i64().unwrap(), (total + limit - 1) / limit);
    }
}

#[tokio::test]
async fn list_past_the_end_is_empty() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons?page=10").await;
    assert_eq!(status, StatusCode::OK);
    assert!(ids(&body).is_empty());
    assert_eq!(body["total"], 20);
}

#[tokio::test]
async fn list_negative_page_is_internal_error() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons?page=-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn list_empty_collection() {
    let app = build_app(Arc::new(MemoryStore::new()));
    let (status, body) = get(&app, "/pokemons").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "pokemons": [], "page": 1, "total": 0, "pages": 0 }));
}

// ── GET /pokemons/{id} ──────────────────────────────────────────

#[tokio::test]
async fn get_by_id() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["name"]["french"], "Nom7");
    assert!(body["_id"].is_string());

    let (_, again) = get(&app, "/pokemons/7").await;
    assert_eq!(again, body);
}

#[tokio::test]
async fn get_missing_id_is_404() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Pokemon not found" }));
}

#[tokio::test]
async fn get_non_numeric_id_is_internal_error() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons/pikachu").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn get_id_with_trailing_text() {
    let app = build_app(seeded_store());
    let (status, body) = get(&app, "/pokemons/12abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 12);
}

// ── GET /pokemons/name/{nom} ────────────────────────────────────

#[tokio::test]
async fn name_lookup_is_case_insensitive_substring() {
    let app = build_app(named_store());
    for query in ["pika", "PIKA", "pikachu", "Kach"] {
        let (status, body) = get(&app, &format!("/pokemons/name/{query}")).await;
        assert_eq!(status, StatusCode::OK, "query {query}");
        assert_eq!(body["id"], 25, "query {query}");
    }
}

#[tokio::test]
async fn name_lookup_returns_first_match() {
    let app = build_app(named_store());
    let (status, body) = get(&app, "/pokemons/name/chu").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 25);
}

#[tokio::test]
async fn name_lookup_decodes_percent_encoding() {
    let store = named_store();
    store
        .insert_one(doc! { "id": 4, "name": { "french": "Salamèche" } })
        .unwrap();
    let app = build_app(store);
    let (status, body) = get(&app, "/pokemons/name/sALAM%C3%88che").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"]["french"], "Salamèche");
}

#[tokio::test]
async fn name_lookup_treats_pattern_characters_literally() {
    let app = build_app(named_store());
    let (status, body) = get(&app, "/pokemons/name/.*").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Pokemon not found" }));
}

#[tokio::test]
async fn name_lookup_missing_is_404() {
    let app = build_app(named_store());
    let (status, _) = get(&app, "/pokemons/name/mewtwo").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── POST /pokemons ──────────────────────────────────────────────

#[tokio::test]
async fn create_then_get() {
    let app = build_app(seeded_store());
    let record = json!({
        "id": 151,
        "name": { "english": "Mew", "french": "Mew" },
        "type": ["Psychic"],
        "base": { "HP": 100 },
        "legendary": true,
    });

    let (status, created) = send(&app, Method::POST, "/pokemons", Some(record.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["_id"].is_string());

    let (status, fetched) = get(&app, "/pokemons/151").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    for (key, value) in record.as_object().unwrap() {
        assert_eq!(&fetched[key], value, "field {key}");
    }
}

#[tokio::test]
async fn create_does_not_check_duplicate_ids() {
    let app = build_app(seeded_store());
    let (status, _) = send(&app, Method::POST, "/pokemons", Some(json!({ "id": 1 }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = get(&app, "/pokemons").await;
    assert_eq!(body["total"], 21);
}

#[tokio::test]
async fn create_with_operator_field_is_internal_error() {
    let app = build_app(seeded_store());
    let (status, body) = send(&app, Method::POST, "/pokemons", Some(json!({ "$where": "1" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn create_rejects_non_object_body() {
    let app = build_app(seeded_store());
    let (status, body) = send(&app, Method::POST, "/pokemons", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid JSON body" }));
}

#[tokio::test]
async fn create_rejects_malformed_json() {
    let app = build_app(seeded_store());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/pokemons")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"id\": "))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

async fn send_untyped(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn create_without_json_content_type_stores_empty_record() {
    let app = build_app(seeded_store());
    let (status, created) = send_untyped(&app, Method::POST, "/pokemons", r#"{"id": 151}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    let fields = created.as_object().unwrap();
    assert_eq!(fields.len(), 1);
    assert!(created["_id"].is_string());

    let (_, body) = get(&app, "/pokemons?limit=50").await;
    assert_eq!(body["total"], 21);
}

// ── PUT /pokemons/{id} ──────────────────────────────────────────

#[tokio::test]
async fn update_replaces_given_fields_only() {
    let app = build_app(seeded_store());
    let (_, before) = get(&app, "/pokemons/1").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/pokemons/1",
        Some(json!({ "name": { "french": "Testeur" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"]["french"], "Testeur");
    assert_eq!(body["id"], before["id"]);
    assert_eq!(body["_id"], before["_id"]);
    assert_eq!(body["type"], before["type"]);
    assert_eq!(body["base"], before["base"]);

    let (_, fetched) = get(&app, "/pokemons/1").await;
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn update_without_json_content_type_is_a_no_op() {
    let app = build_app(seeded_store());
    let (_, before) = get(&app, "/pokemons/1").await;

    let (status, body) = send_untyped(&app, Method::PUT, "/pokemons/1", r#"{"id": 99}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, before);
}

#[tokio::test]
async fn update_with_operators() {
    let app = build_app(seeded_store());
    let (status, body) = send(
        &app,
        Method::PUT,
        "/pokemons/2",
        Some(json!({
            "$set": { "name.french": "Herbizarre" },
            "$inc": { "base.HP": 10 },
            "$unset": { "type": "" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"]["french"], "Herbizarre");
    assert_eq!(body["name"]["english"], "Mon2");
    assert_eq!(body["base"]["HP"], 52);
    assert!(body.get("type").is_none());
}

#[tokio::test]
async fn update_missing_is_404() {
    let app = build_app(seeded_store());
    let (status, body) = send(&app, Method::PUT, "/pokemons/999", Some(json!({ "hp": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Pokemon not found" }));
}

#[tokio::test]
async fn update_unknown_operator_is_internal_error() {
    let app = build_app(seeded_store());
    let (status, _) = send(
        &app,
        Method::PUT,
        "/pokemons/1",
        Some(json!({ "$push": { "type": "Grass" } })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn update_cannot_change_object_id() {
    let app = build_app(seeded_store());
    let (status, _) = send(&app, Method::PUT, "/pokemons/1", Some(json!({ "_id": "stolen" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ── DELETE /pokemons/{id} ───────────────────────────────────────

#[tokio::test]
async fn delete_then_get_is_404() {
    let app = build_app(seeded_store());
    let (status, body) = send(&app, Method::DELETE, "/pokemons/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Pokemon deleted" }));

    let (status, _) = get(&app, "/pokemons/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/pokemons/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Pokemon not found" }));
}

// ── Store failures ──────────────────────────────────────────────

#[tokio::test]
async fn closed_store_yields_internal_errors() {
    let store = seeded_store();
    let app = build_app(Arc::clone(&store));
    store.close().unwrap();

    for uri in ["/pokemons", "/pokemons/1", "/pokemons/name/nom1"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "uri {uri}");
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }
    let (status, _) = send(&app, Method::DELETE, "/pokemons/1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ── CORS ────────────────────────────────────────────────────────

#[tokio::test]
async fn any_origin_is_allowed() {
    let app = build_app(seeded_store());
    let req = Request::builder()
        .uri("/pokemons/1")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/pokemons/1")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(preflight).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
