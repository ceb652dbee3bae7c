//! Ceremony endpoint handlers.
//!
//! Registration failures map to 400, authentication failures to 401, and
//! store failures to 500; the split lives in `AppError::into_response`.

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::webauthn::types::*;

fn required_subject(params: StartParams) -> Result<String, AppError> {
    match params.subject {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(AppError::BadRequest("subject query parameter required".into())),
    }
}

pub async fn register_start(
    State(state): State<AppState>,
    Query(params): Query<StartParams>,
) -> AppResult<Json<RegistrationOptions>> {
    let subject = required_subject(params)?;
    let options = state
        .ceremonies
        .start_registration(&subject)
        .await
        .map_err(AppError::Registration)?;

    Ok(Json(options))
}

pub async fn register_finish(
    State(state): State<AppState>,
    Json(req): Json<RegisterFinishRequest>,
) -> AppResult<Json<Value>> {
    state
        .ceremonies
        .finish_registration(&req.subject, &req.response)
        .await
        .map_err(AppError::Registration)?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn auth_start(
    State(state): State<AppState>,
    Query(params): Query<StartParams>,
) -> AppResult<Json<AuthenticationOptions>> {
    let subject = required_subject(params)?;
    let options = state
        .ceremonies
        .start_authentication(&subject)
        .await
        .map_err(AppError::Authentication)?;

    Ok(Json(options))
}

pub async fn auth_finish(
    State(state): State<AppState>,
    Json(req): Json<AuthFinishRequest>,
) -> AppResult<Json<Value>> {
    state
        .ceremonies
        .finish_authentication(&req.subject, &req.response)
        .await
        .map_err(AppError::Authentication)?;

    Ok(Json(json!({ "ok": true })))
}

/// List a subject's registered credentials (metadata only). The portal
/// uses this to decide whether to offer biometric sign-in.
pub async fn list_credentials(
    State(state): State<AppState>,
    Query(params): Query<StartParams>,
) -> AppResult<Json<Vec<CredentialSummary>>> {
    let subject = required_subject(params)?;
    let credentials = state.ceremonies.credentials().list_for_subject(&subject).await?;

    let summaries = credentials
        .into_iter()
        .map(|c| CredentialSummary {
            id: c.id,
            transports: c.transports.and_then(|t| serde_json::from_str(&t).ok()),
            created_at: c.created_at,
            last_used_at: c.last_used_at,
        })
        .collect();

    Ok(Json(summaries))
}
