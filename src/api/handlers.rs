use super::{ApiError, AppState};
use crate::models::{CuratedPatch, TokenRecord};
use crate::sync::PassOutcome;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde_json::{Value, json};
use tracing::{error, info, warn};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "syncState": state.orchestrator.state(),
        "lastSync": state.orchestrator.last_report().await,
    }))
}

pub async fn list_tokens(State(state): State<AppState>) -> Result<Json<Vec<TokenRecord>>, ApiError> {
    Ok(Json(state.store.list_tokens().await?))
}

pub async fn update_token(
    State(state): State<AppState>,
    Path(token_index): Path<String>,
    Json(patch): Json<CuratedPatch>,
) -> Result<Json<Value>, ApiError> {
    let token_index: i64 = token_index
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid token index"))?;

    if patch.is_empty() {
        return Err(ApiError::BadRequest("No fields to update"));
    }

    let token = state
        .store
        .update_curated(token_index, &patch)
        .await?
        .ok_or(ApiError::NotFound("Token not found"))?;

    info!(token_index, token = %token.name, "✏️ Token updated by admin");

    Ok(Json(json!({
        "message": "Token updated successfully",
        "token": token,
    })))
}

pub async fn trigger_update(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    info!("Manual update requested");
    run_pass(&state).await
}

/// Entry point for external schedulers, authenticated by `CRON_SECRET`.
pub async fn cron(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let Some(secret) = state.cron_secret.as_deref() else {
        warn!("Cron call rejected, CRON_SECRET is not configured");
        return Err(ApiError::Unauthorized);
    };

    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret);

    if !authorized {
        return Err(ApiError::Unauthorized);
    }

    info!("Cron job triggered");
    run_pass(&state).await
}

async fn run_pass(state: &AppState) -> Result<Json<Value>, ApiError> {
    match state.orchestrator.run_sync_pass().await {
        Ok(PassOutcome::Completed(report)) => Ok(Json(json!({
            "message": "Update completed",
            "report": report,
        }))),
        Ok(PassOutcome::Skipped) => Err(ApiError::Conflict("Update already in progress")),
        Err(e) => {
            error!(error = %e, "❌ Update failed");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}
