//! Request handlers
//!
//! Each handler decodes the body, runs one store operation on the blocking
//! pool and wraps the result in a [`ConfigResponse`].

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::datastore::ConfigDatastore;
use crate::error::Result;
use crate::model::ConfigItem;

use super::{ApiError, AppState, ConfigResponse};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub applications: usize,
}

const HELP: &str = "\
centralconfig - application configuration service

  POST /config/get            {\"application\", \"machine\"?, \"name\"}
  POST /config/set            {\"application\", \"machine\"?, \"name\", \"value\"}
  POST /config/remove         {\"application\", \"machine\"?, \"name\"}
  POST /config/getall         {\"application\"}
  GET  /config/getall
  GET  /applications/getall
  POST /store/init
  GET  /health
";

/// Endpoint summary: GET /
pub async fn show_help() -> &'static str {
    HELP
}

/// Liveness check: GET /health
///
/// Touches the store so a broken backend shows up as a 500.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let applications = run_store(&state, |store| store.get_all_applications()).await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        applications: applications.len(),
    }))
}

/// Resolve a single item: POST /config/get
pub async fn get_config(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ConfigItem>, JsonRejection>,
) -> ApiResult<Json<ConfigResponse>> {
    let query = decode(payload)?;
    let found = run_store(&state, move |store| store.get(&query)).await?;

    if found.is_empty() {
        return Ok(Json(ConfigResponse::ok(
            "No config item found with that application and name",
            Vec::new(),
        )));
    }
    Ok(Json(ConfigResponse::ok("Config item found", vec![found])))
}

/// Create or overwrite an item: POST /config/set
pub async fn set_config(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ConfigItem>, JsonRejection>,
) -> ApiResult<Json<ConfigResponse>> {
    let item = decode(payload)?;
    let stored = run_store(&state, move |store| store.set(item)).await?;

    Ok(Json(ConfigResponse::ok("Config item updated", vec![stored])))
}

/// Delete an item: POST /config/remove
pub async fn remove_config(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ConfigItem>, JsonRejection>,
) -> ApiResult<Json<ConfigResponse>> {
    let item = decode(payload)?;
    let removed = item.clone();
    run_store(&state, move |store| store.remove(&item)).await?;

    Ok(Json(ConfigResponse::ok("Config item removed", vec![removed])))
}

/// All items of one application: POST /config/getall
pub async fn get_all_for_application(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ConfigItem>, JsonRejection>,
) -> ApiResult<Json<ConfigResponse>> {
    let query = decode(payload)?;
    let items = run_store(&state, move |store| {
        store.get_all_for_application(&query.application)
    })
    .await?;

    if items.is_empty() {
        return Ok(Json(ConfigResponse::ok(
            "No config items found with that application",
            items,
        )));
    }
    Ok(Json(ConfigResponse::ok("Config items found", items)))
}

/// Every item: GET /config/getall
pub async fn get_all_config(State(state): State<AppState>) -> ApiResult<Json<ConfigResponse>> {
    let items = run_store(&state, |store| store.get_all()).await?;

    if items.is_empty() {
        return Ok(Json(ConfigResponse::ok("No config items found", items)));
    }
    Ok(Json(ConfigResponse::ok("Config items found", items)))
}

/// Distinct applications: GET /applications/getall
pub async fn get_all_applications(
    State(state): State<AppState>,
) -> ApiResult<Json<ConfigResponse<String>>> {
    let applications = run_store(&state, |store| store.get_all_applications()).await?;

    if applications.is_empty() {
        return Ok(Json(ConfigResponse::ok("No applications found", applications)));
    }
    Ok(Json(ConfigResponse::ok("Applications found", applications)))
}

/// Create the backing store if missing: POST /store/init
///
/// Never resets existing data; that is only available from the CLI.
pub async fn init_store(State(state): State<AppState>) -> ApiResult<Json<ConfigResponse>> {
    run_store(&state, |store| store.init_store(false)).await?;

    tracing::info!("Store initialized via HTTP");
    Ok(Json(ConfigResponse::ok("Store initialized", Vec::new())))
}

// =============================================================================
// Helpers
// =============================================================================

fn decode(payload: std::result::Result<Json<ConfigItem>, JsonRejection>) -> ApiResult<ConfigItem> {
    payload.map(|Json(item)| item).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::bad_request(rejection.body_text())
    })
}

/// Run a store operation on the blocking pool
async fn run_store<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&dyn ConfigDatastore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| ApiError::internal(format!("Store task failed: {}", e)))?;

    result.map_err(|e| {
        tracing::error!(error = %e, "Store operation failed");
        ApiError::from(e)
    })
}
