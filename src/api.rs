//! REST API server for PulseChain
//!
//! Maps HTTP requests onto [`LedgerService`]: the root route reads and extends
//! the chain, `/api/...` exposes lookups, integrity checks, chain replacement
//! and request statistics. Every request is bounded by the `[server]` timeout
//! and size limits.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::blockchain::Block;
use crate::config::ServerConfig;
use crate::error::ChainError;
use crate::service::LedgerService;

const MAX_PAGE_LIMIT: u64 = 100;

/// Shared handler state
pub struct Node {
    pub service: LedgerService,
    api_stats: RwLock<ApiStats>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    blocks_created: u64,
    chains_replaced: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl Node {
    pub fn new(service: LedgerService) -> Self {
        Self {
            service,
            api_stats: RwLock::new(ApiStats::new()),
        }
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            blocks_created: stats.blocks_created,
            chains_replaced: stats.chains_replaced,
            chain_length: self.service.ledger().len() as u64,
            uptime_seconds: uptime,
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Chain(ChainError),
    InvalidInput(String),
    NotFound(String),
    PayloadTooLarge(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Chain(e) => {
                let status = match e {
                    ChainError::InvalidPayload(_) | ChainError::InvalidChain(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ChainError::InvalidBlock(_) | ChainError::Config(_) | ChainError::Io(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Chain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::InvalidInput(rejection.body_text())
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of a block creation request: `{"BPM": 72}`.
#[derive(Debug, Deserialize)]
pub struct CreateBlockRequest {
    #[serde(rename = "BPM", alias = "bpm")]
    pub bpm: i64,
}

#[derive(Serialize)]
pub struct ReplaceResponse {
    pub replaced: bool,
    pub length: u64,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: u64,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub blocks_created: u64,
    pub chains_replaced: u64,
    pub chain_length: u64,
    pub uptime_seconds: u64,
}

#[derive(Deserialize)]
struct PaginationQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    limit: u64,
}

fn default_page() -> u64 {
    0
}
fn default_limit() -> u64 {
    10
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    node.api_stats.write().await.record_request(success);

    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

/// Rejects requests whose header names and values together exceed `max_bytes`.
async fn header_limit_middleware(
    State(max_bytes): State<usize>,
    req: Request,
    next: Next,
) -> Response {
    let header_bytes: usize = req
        .headers()
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum();

    if header_bytes > max_bytes {
        tracing::warn!(header_bytes, max_bytes, "request headers too large");
        return (
            StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Json(ErrorResponse {
                error: format!("Request headers exceed {} bytes", max_bytes),
            }),
        )
            .into_response();
    }

    next.run(req).await
}

// ============================================================================
// API Server
// ============================================================================

/// Build the router with all endpoints
pub fn build_api_router(node: Arc<Node>, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        // Chain read/write
        .route("/", get(get_chain).post(create_block))
        // Lookups
        .route("/api/blockchain/height", get(get_blockchain_height))
        .route("/api/blockchain/blocks", get(get_blocks))
        .route("/api/blockchain/block/:index", get(get_block_by_index))
        // Integrity and fork resolution
        .route("/api/blockchain/validate", get(validate_chain))
        .route("/api/blockchain/replace", post(replace_chain))
        // System
        .route("/api/health", get(health_check))
        .route("/api/stats", get(get_api_stats))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            server.max_header_bytes,
            header_limit_middleware,
        ))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors)
}

/// Bind the configured address and serve until the listener fails.
pub async fn run_api_server(node: Arc<Node>, server: &ServerConfig) -> Result<(), ChainError> {
    let app = build_api_router(node, server);
    let listener = tokio::net::TcpListener::bind(server.bind_addr()).await?;

    tracing::info!(
        addr = %listener.local_addr()?,
        timeout_secs = server.request_timeout_secs,
        max_body_bytes = server.max_body_bytes,
        "api server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn get_chain(State(node): State<Arc<Node>>) -> Json<Vec<Block>> {
    Json(node.service.chain())
}

async fn create_block(
    State(node): State<Arc<Node>>,
    payload: Result<Json<CreateBlockRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let Json(req) = payload?;
    let block = node.service.create_block(req.bpm)?;

    node.api_stats.write().await.blocks_created += 1;

    Ok((StatusCode::CREATED, Json(block)))
}

async fn get_blockchain_height(State(node): State<Arc<Node>>) -> Json<u64> {
    Json(node.service.ledger().len() as u64)
}

async fn get_blocks(
    State(node): State<Arc<Node>>,
    Query(params): Query<PaginationQuery>,
) -> impl IntoResponse {
    let ledger = node.service.ledger();
    let total = ledger.len();

    let limit = params.limit.min(MAX_PAGE_LIMIT);
    let offset = usize::try_from(params.page.saturating_mul(limit)).unwrap_or(usize::MAX);
    let blocks = ledger.blocks_page(offset, limit as usize);

    Json(serde_json::json!({
        "blocks": blocks,
        "total": total,
        "page": params.page,
        "limit": limit
    }))
}

async fn get_block_by_index(
    State(node): State<Arc<Node>>,
    Path(index): Path<u64>,
) -> Result<Json<Block>, ApiError> {
    node.service
        .ledger()
        .block(index)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Block at index {} not found", index)))
}

async fn validate_chain(State(node): State<Arc<Node>>) -> Json<ValidateResponse> {
    let chain = node.service.chain();
    Json(ValidateResponse {
        valid: crate::blockchain::is_chain_valid(&chain),
        length: chain.len() as u64,
    })
}

async fn replace_chain(
    State(node): State<Arc<Node>>,
    payload: Result<Json<Vec<Block>>, JsonRejection>,
) -> Result<Json<ReplaceResponse>, ApiError> {
    let Json(candidate) = payload?;
    let replaced = node.service.merge_chain(candidate);

    if replaced {
        node.api_stats.write().await.chains_replaced += 1;
    }

    Ok(Json(ReplaceResponse {
        replaced,
        length: node.service.ledger().len() as u64,
    }))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_api_stats(State(node): State<Arc<Node>>) -> Json<ApiStatsResponse> {
    Json(node.get_stats().await)
}
