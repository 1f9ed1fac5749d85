//! HTTP JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (status, version, timestamp) |
//! | `GET`  | `/snippets` | List snippets, newest first |
//! | `POST` | `/snippets` | Create a snippet (tags are canonicalized) |
//! | `GET`  | `/snippets/{id}` | Fetch one snippet |
//! | `PUT`  | `/snippets/{id}` | Replace content and tags |
//! | `DELETE` | `/snippets/{id}` | Delete a snippet |
//! | `PUT`  | `/snippets/{id}/theme` | Assign or clear the snippet's theme |
//! | `GET`  | `/search?q=&limit=` | Ranked search with excerpts |
//! | `GET`  | `/tags` | Tag usage counts |
//! | `GET`  | `/themes` | List themes |
//! | `POST` | `/themes` | Create a theme |
//! | `GET`  | `/themes/{id}` | Fetch one theme |
//! | `PUT`  | `/themes/{id}` | Rename or redescribe a theme |
//! | `DELETE` | `/themes/{id}` | Delete a theme |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "q must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Malformed query strings and JSON bodies are `bad_request` too.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use snipvault_core::error::SnipError;
use snipvault_core::models::{
    NewSnippet, NewTheme, SearchResult, Snippet, SnippetPatch, TagCount, Theme, ThemePatch,
};
use snipvault_core::store::SnippetStore;

use crate::config::Config;
use crate::{db, search, snippets, themes};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn SnippetStore>,
}

/// Build the router over any store backend.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/snippets", get(handle_list_snippets).post(handle_create_snippet))
        .route(
            "/snippets/{id}",
            get(handle_get_snippet)
                .put(handle_update_snippet)
                .delete(handle_delete_snippet),
        )
        .route("/snippets/{id}/theme", put(handle_assign_theme))
        .route("/search", get(handle_search))
        .route("/tags", get(handle_tags))
        .route("/themes", get(handle_list_themes).post(handle_create_theme))
        .route(
            "/themes/{id}",
            get(handle_get_theme)
                .put(handle_update_theme)
                .delete(handle_delete_theme),
        )
        .layer(cors)
        .with_state(state)
}

/// Start the server on `[server].bind` backed by the SQLite store.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = db::open_store(config).await?;
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(store),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "server listening");
    println!("snipvault listening on http://{}", config.server.bind);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type that converts into an HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

/// Map service errors onto HTTP statuses by their [`SnipError`] kind.
/// Anything untyped is an internal error.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<SnipError>() {
            Some(SnipError::NotFound { .. }) => AppError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message: err.to_string(),
            },
            Some(SnipError::Validation(_)) | Some(SnipError::Conflict { .. }) => {
                bad_request(err.to_string())
            }
            None => {
                error!(error = %format!("{:#}", err), "request failed");
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "internal",
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;

// ============ Health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ============ Snippets ============

async fn handle_list_snippets(State(state): State<AppState>) -> ApiResult<Vec<Snippet>> {
    Ok(Json(snippets::list_snippets(&*state.store).await?))
}

async fn handle_create_snippet(
    State(state): State<AppState>,
    body: Result<Json<NewSnippet>, JsonRejection>,
) -> Result<(StatusCode, Json<Snippet>), AppError> {
    let Json(input) = body?;
    let snippet = snippets::create_snippet(&*state.store, input).await?;
    Ok((StatusCode::CREATED, Json(snippet)))
}

async fn handle_get_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Snippet> {
    Ok(Json(snippets::get_snippet(&*state.store, &id).await?))
}

async fn handle_update_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SnippetPatch>, JsonRejection>,
) -> ApiResult<Snippet> {
    let Json(patch) = body?;
    Ok(Json(snippets::update_snippet(&*state.store, &id, patch).await?))
}

#[derive(Serialize)]
struct DeletedResponse {
    deleted: bool,
}

async fn handle_delete_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    snippets::delete_snippet(&*state.store, &id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignThemeBody {
    #[serde(default)]
    theme_id: Option<String>,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

async fn handle_assign_theme(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AssignThemeBody>, JsonRejection>,
) -> ApiResult<OkResponse> {
    let Json(body) = body?;
    themes::assign_theme(&*state.store, &id, body.theme_id.as_deref()).await?;
    Ok(Json(OkResponse { ok: true }))
}

// ============ Search & tags ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Vec<SearchResult>> {
    let Query(params) = params?;
    let q = params.q.unwrap_or_default();
    if q.is_empty() {
        return Err(bad_request("q must not be empty"));
    }
    let results = search::search_snippets(&*state.store, &state.config, &q, params.limit).await?;
    Ok(Json(results))
}

async fn handle_tags(State(state): State<AppState>) -> ApiResult<Vec<TagCount>> {
    Ok(Json(search::tag_cloud(&*state.store, &state.config).await?))
}

// ============ Themes ============

async fn handle_list_themes(State(state): State<AppState>) -> ApiResult<Vec<Theme>> {
    Ok(Json(themes::list_themes(&*state.store).await?))
}

async fn handle_create_theme(
    State(state): State<AppState>,
    body: Result<Json<NewTheme>, JsonRejection>,
) -> Result<(StatusCode, Json<Theme>), AppError> {
    let Json(input) = body?;
    let theme = themes::create_theme(&*state.store, input).await?;
    Ok((StatusCode::CREATED, Json(theme)))
}

async fn handle_get_theme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Theme> {
    Ok(Json(themes::get_theme(&*state.store, &id).await?))
}

async fn handle_update_theme(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ThemePatch>, JsonRejection>,
) -> ApiResult<Theme> {
    let Json(patch) = body?;
    Ok(Json(themes::update_theme(&*state.store, &id, patch).await?))
}

async fn handle_delete_theme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    themes::delete_theme(&*state.store, &id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}
