//! Read-only HTTP API over stored records
//!
//! `GET /satellites` and `GET /space-objects`, both paged with `page`
//! (zero-based, default 0) and `limit` (default 100, at most 1000).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::Satellite;
use crate::error::StorageError;
use crate::storage::{load_satellites, load_space_objects, Storage, StoredSpaceObject};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Shared handle; SQLite access is serialized through the lock
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<Storage>>,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    fn resolve(&self) -> (u32, u32) {
        (
            self.page.unwrap_or(0),
            self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        )
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("Request failed: {}", self);
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/satellites", get(list_satellites))
        .route("/space-objects", get(list_space_objects))
        .with_state(state)
}

async fn list_satellites(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Satellite>>, ApiError> {
    let (page, limit) = query.resolve();
    let storage = state.storage.clone();
    let rows = tokio::task::spawn_blocking(move || load_satellites(&storage.lock(), page, limit))
        .await??;
    Ok(Json(rows))
}

async fn list_space_objects(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<StoredSpaceObject>>, ApiError> {
    let (page, limit) = query.resolve();
    let storage = state.storage.clone();
    let rows =
        tokio::task::spawn_blocking(move || load_space_objects(&storage.lock(), page, limit))
            .await??;
    Ok(Json(rows))
}

/// Serve until Ctrl-C
pub async fn serve(bind: SocketAddr, storage: Storage) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    log::info!("Serving on http://{}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(storage)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
