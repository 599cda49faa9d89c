//! API routes

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::components::{ComponentDefinition, ComponentError, RenderedComponent};
use crate::config::dashboard::Suggestion;
use crate::conversation::commands::{run_command, CommandError, CommandOutcome};
use crate::conversation::{ExportError, ExportFormat, Thread};
use crate::market::{MarketQuote, PriceHistory, SearchHit, DEFAULT_HISTORY_DAYS};
use crate::proxy::{ConnectionInfo, ProxyError, ProxyRequest, ProxyStatus};
use crate::watchlist::{WatchlistError, WatchlistSnapshot};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct QuotesQuery {
    /// Comma separated asset ids
    #[serde(default)]
    pub ids: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub name: String,
    #[serde(default)]
    pub props: Value,
}

#[derive(Debug, Deserialize)]
pub struct AddTokenRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub input: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn tambo_proxy(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    state
        .proxy
        .forward(ProxyRequest {
            method,
            path,
            query,
            headers,
            body,
        })
        .await
}

async fn tambo_status(State(state): State<AppState>) -> Json<ProxyStatus> {
    Json(state.proxy.status())
}

async fn tambo_connection(State(state): State<AppState>) -> Json<ConnectionInfo> {
    Json(ConnectionInfo::from_config(&state.config))
}

async fn market_quotes(
    State(state): State<AppState>,
    Query(query): Query<QuotesQuery>,
) -> Json<Vec<MarketQuote>> {
    let ids: Vec<String> = query.ids.split(',').map(str::to_string).collect();
    Json(state.market.quotes(&ids).await)
}

async fn market_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<Option<PriceHistory>> {
    let days = query.days.as_deref().unwrap_or(DEFAULT_HISTORY_DAYS);
    Json(state.market.price_history(&id, days).await)
}

async fn market_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<SearchHit>> {
    Json(state.market.search(&query.query).await)
}

async fn list_components(State(state): State<AppState>) -> Json<Vec<ComponentDefinition>> {
    Json(state.components.definitions().to_vec())
}

async fn render_component(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderedComponent>, ComponentError> {
    let rendered = state
        .components
        .render(&request.name, &request.props)
        .await?;
    Ok(Json(rendered))
}

async fn get_watchlist(State(state): State<AppState>) -> Json<WatchlistSnapshot> {
    Json(state.watchlist.snapshot().await)
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(request): Json<AddTokenRequest>,
) -> Result<Json<WatchlistSnapshot>, WatchlistError> {
    Ok(Json(state.watchlist.add(&request.query).await?))
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WatchlistSnapshot>, WatchlistError> {
    Ok(Json(state.watchlist.remove(&id).await?))
}

async fn chat_suggestions(State(state): State<AppState>) -> Json<Vec<Suggestion>> {
    Json(state.config.dashboard.chat.suggestions.clone())
}

async fn chat_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandOutcome>, CommandError> {
    let outcome = run_command(&request.input, state.market.as_ref()).await?;
    Ok(Json(outcome))
}

async fn chat_export(
    Query(query): Query<ExportQuery>,
    Json(thread): Json<Thread>,
) -> Result<Response, ExportError> {
    let transcript = thread.export(query.format)?;
    tracing::debug!("exporting {} ({} bytes)", transcript.filename, transcript.body.len());

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        transcript.filename.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(transcript.content_type),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        transcript.body,
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/tambo/*path",
            get(tambo_proxy).post(tambo_proxy).delete(tambo_proxy),
        )
        .route("/api/tambo-status", get(tambo_status))
        .route("/api/tambo-connection", get(tambo_connection))
        .route("/api/market/quotes", get(market_quotes))
        .route("/api/market/history/:id", get(market_history))
        .route("/api/market/search", get(market_search))
        .route("/api/components", get(list_components))
        .route("/api/components/render", post(render_component))
        .route("/api/watchlist", get(get_watchlist).post(add_to_watchlist))
        .route("/api/watchlist/:id", delete(remove_from_watchlist))
        .route("/api/chat/suggestions", get(chat_suggestions))
        .route("/api/chat/command", post(chat_command))
        .route("/api/chat/export", post(chat_export))
}
