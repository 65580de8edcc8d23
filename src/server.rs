// File: src/server.rs
//! JSON-over-HTTP surface for the search UI.

use crate::core::engine::MatchEngine;
use crate::core::types::{NewRecord, ProcessedName, SearchFilters, SearchResult};
use crate::error::MatchError;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

type AppState = Arc<MatchEngine>;

pub fn router(engine: Arc<MatchEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/suggest", get(suggest))
        .route("/add-record", post(add_record))
        .route("/add-no-match", post(add_no_match))
        .route("/process-name", post(process_name))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

/// Error body is always `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    Match(MatchError),
    /// The body was not the JSON the route expects.
    Rejected(StatusCode, String),
    /// A blocking task panicked or was cancelled.
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        ApiError::Match(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Match(MatchError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Match(err @ MatchError::StorageUnavailable { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            ApiError::Match(err) => {
                tracing::error!("request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Rejected(status, msg) => (status, msg),
            ApiError::Internal(msg) => {
                tracing::error!("request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(MatchError::validation("Name is required").into());
    }
    Ok(())
}

async fn blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, MatchError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    records: usize,
}

async fn health(State(engine): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", records: engine.len() })
}

/// Filters may come top-level (as the search form sends them) or nested;
/// top-level values win.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "case_type")]
    case_type: Option<String>,
    #[serde(default)]
    filters: Option<SearchFilters>,
}

impl SearchRequest {
    fn filters(&self) -> SearchFilters {
        let nested = self.filters.clone().unwrap_or_default();
        SearchFilters {
            location: self.location.clone().or(nested.location),
            case_type: self.case_type.clone().or(nested.case_type),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultItem {
    id: u64,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name_devanagari: Option<String>,
    age: Option<u32>,
    location: String,
    case_type: String,
    /// The dashboard table reads the snake_case key.
    #[serde(rename = "case_type")]
    case_type_snake: String,
    fir: String,
    confidence: u8,
    similarity: f64,
    roman: String,
    devanagari: String,
}

impl From<&SearchResult> for ResultItem {
    fn from(result: &SearchResult) -> Self {
        let record = &result.record;
        Self {
            id: record.id,
            name: record.name.clone(),
            name_devanagari: record.name_devanagari.clone(),
            age: record.age,
            location: record.location.clone(),
            case_type: record.case_type.clone(),
            case_type_snake: record.case_type.clone(),
            fir: record.fir.clone(),
            confidence: result.confidence,
            similarity: result.similarity,
            roman: record.processed.roman.clone(),
            devanagari: record.processed.devanagari.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<ResultItem>,
}

async fn search(
    State(engine): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(req) = payload?;
    require_name(&req.name)?;
    let results = engine.search(&req.name, &req.filters())?;
    Ok(Json(SearchResponse { results: results.iter().map(ResultItem::from).collect() }))
}

#[derive(Debug, Deserialize)]
struct SuggestParams {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize)]
struct Suggestion {
    name: String,
}

#[derive(Debug, Serialize)]
struct SuggestResponse {
    suggestions: Vec<Suggestion>,
}

async fn suggest(State(engine): State<AppState>, Query(params): Query<SuggestParams>) -> Json<SuggestResponse> {
    let typed = params.name.trim();
    let suggestions = if typed.chars().count() < engine.config().min_suggest_len {
        Vec::new()
    } else {
        engine.suggest(typed).into_iter().map(|name| Suggestion { name }).collect()
    };
    Json(SuggestResponse { suggestions })
}

async fn add_record(
    State(engine): State<AppState>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new) = payload?;
    require_name(&new.name)?;
    let stored = blocking(move || engine.add_record(new)).await?;
    Ok((StatusCode::CREATED, Json(stored.as_ref().clone())))
}

#[derive(Debug, Deserialize)]
struct NoMatchRequest {
    #[serde(default, alias = "name")]
    query: String,
    #[serde(default)]
    filters: SearchFilters,
}

async fn add_no_match(
    State(engine): State<AppState>,
    payload: Result<Json<NoMatchRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    require_name(&req.query)?;
    blocking(move || engine.record_no_match(&req.query, &req.filters)).await?;
    Ok(Json(serde_json::json!({ "status": "recorded" })))
}

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    #[serde(default)]
    name: String,
}

async fn process_name(
    State(engine): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessedName>, ApiError> {
    let Json(req) = payload?;
    require_name(&req.name)?;
    Ok(Json(engine.process(&req.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingConfig;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MatchEngine>) {
        let engine = Arc::new(MatchEngine::new(MatchingConfig::default()).unwrap());
        engine
            .add_record(NewRecord::new("Suresh Kumar").with_location("Indore").with_case_type("Witness").with_age(34))
            .unwrap();
        (router(Arc::clone(&engine)), engine)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn search_returns_scored_results() {
        let (app, _) = app();
        let response = app.oneshot(post_json("/search", json!({ "name": "sursh kumar" }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let first = &body["results"][0];
        assert_eq!(first["name"], "Suresh Kumar");
        assert_eq!(first["caseType"], "Witness");
        assert_eq!(first["case_type"], "Witness");
        assert_eq!(first["age"], 34);
        assert_eq!(first["confidence"], 94);
        assert_eq!(first["devanagari"], "सुरेश कुमार");
    }

    #[tokio::test]
    async fn top_level_filters_are_honored() {
        let (app, _) = app();
        let response = app
            .oneshot(post_json("/search", json!({ "name": "sursh kumar", "location": "Bhopal" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["results"], json!([]));
    }

    #[tokio::test]
    async fn blank_name_is_bad_request() {
        let (app, _) = app();
        let response = app.oneshot(post_json("/search", json!({ "name": "  " }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Name is required" }));
    }

    #[tokio::test]
    async fn suggest_needs_three_chars() {
        let (app, _) = app();
        let short = app
            .clone()
            .oneshot(Request::get("/suggest?name=su").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(short).await, json!({ "suggestions": [] }));

        let long = app.oneshot(Request::get("/suggest?name=sur").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(body_json(long).await, json!({ "suggestions": [{ "name": "suresh kumar" }] }));
    }

    #[tokio::test]
    async fn added_records_are_searchable() {
        let (app, engine) = app();
        let response = app
            .clone()
            .oneshot(post_json("/add-record", json!({ "name": "Vikas Yadav", "location": "Bhopal", "caseFIR": "FIR-9" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let stored = body_json(response).await;
        assert_eq!(stored["id"], 2);
        assert_eq!(stored["fir"], "FIR-9");

        let response = app.oneshot(post_json("/search", json!({ "name": "vikas yadav" }))).await.unwrap();
        assert_eq!(body_json(response).await["results"][0]["confidence"], 100);
        assert_eq!(engine.len(), 2);
    }

    #[tokio::test]
    async fn no_match_is_logged() {
        let (app, engine) = app();
        let response = app
            .oneshot(post_json("/add-no-match", json!({ "query": "vikas", "filters": { "location": "Bhopal" } })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let events = engine.feedback_events().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.query, "vikas");
        assert_eq!(last.filters.location.as_deref(), Some("Bhopal"));
    }

    #[tokio::test]
    async fn process_name_returns_every_form() {
        let (app, _) = app();
        let response = app.oneshot(post_json("/process-name", json!({ "name": "Suresh Kumar" }))).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["normalized"], "suresh kumar");
        assert_eq!(body["devanagari"], "सुरेश कुमार");
        assert_eq!(body["phonetic"], "SRS KMR");
    }

    #[tokio::test]
    async fn health_reports_record_count() {
        let (app, _) = app();
        let response = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(body_json(response).await, json!({ "status": "ok", "records": 1 }));
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_errors() {
        let (app, _) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
        assert!(body_json(response).await["error"].is_string());

        let response = app.oneshot(post_json("/add-record", json!({ "name": "Ram", "age": "old" }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn aliases_are_searchable_over_http() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(post_json("/add-record", json!({ "name": "Shyam Lal", "alternates": ["Bablu"] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(post_json("/search", json!({ "name": "bablu" }))).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["results"][0]["name"], "Shyam Lal");
        assert_eq!(body["results"][0]["confidence"], 100);
    }

    #[test]
    fn storage_errors_map_to_503() {
        let err = ApiError::from(MatchError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk")));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        let err = ApiError::from(MatchError::inconsistency("bad slot"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
