use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::chain::Address;
use crate::constants::MISSING_SIGNER_ADDRESS;
use crate::error::BadgeError;
use crate::metrics::{BadgeMetrics, MintMode};
use crate::state::AppState;
use crate::types::{MintResult, MiniAppUser, ProgressRecord, ProgressState};

#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    pub answer: Option<String>,
}

/// Fields are read leniently: a mistyped `address` must not hide a valid
/// `clientTxHash`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub address: Option<Value>,
    pub client_tx_hash: Option<Value>,
}

fn string_field(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => non_empty(Some(s)),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: ProgressRecord,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    pub ok: bool,
    pub tx_hash: String,
    pub progress: ProgressRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub user: MiniAppUser,
    pub progress: ProgressRecord,
}

/// Errors that end a request, rendered as JSON
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    MethodNotAllowed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(MintResult::Failed { error })).into_response()
            }
            ApiError::Internal(error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(MintResult::Failed { error })).into_response()
            }
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({"error": "Method not allowed"})),
            )
                .into_response(),
        }
    }
}

impl From<BadgeError> for ApiError {
    fn from(err: BadgeError) -> Self {
        match err {
            BadgeError::InvalidAddress(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn advance(state: &AppState, user: &MiniAppUser, to: ProgressState) -> Result<ProgressRecord, ApiError> {
    let (progress, moved) = state.store.advance(&user.user_id, to).await?;
    if moved {
        BadgeMetrics::record_transition(to);
    }
    info!(user = %user.user_id, state = %progress.state, "Progress updated");
    Ok(progress)
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "base-badge",
        "version": env!("CARGO_PKG_VERSION"),
        "mintConfigured": state.config.can_mint(),
    }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn intro(
    State(state): State<AppState>,
    user: MiniAppUser,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = advance(&state, &user, ProgressState::IntroCompleted).await?;
    Ok(Json(ProgressResponse { progress }))
}

pub async fn quiz(
    State(state): State<AppState>,
    user: MiniAppUser,
    body: Option<Json<QuizRequest>>,
) -> Result<Json<QuizResponse>, ApiError> {
    let answer = body.and_then(|Json(b)| b.answer);
    let correct = answer.as_deref() == Some(state.config.onboarding.quiz_answer.as_str());
    BadgeMetrics::record_quiz_attempt(correct);

    if !correct {
        return Ok(Json(QuizResponse { correct: false, progress: None }));
    }

    let progress = advance(&state, &user, ProgressState::QuizPassed).await?;
    Ok(Json(QuizResponse { correct: true, progress: Some(progress) }))
}

pub async fn mint(
    State(state): State<AppState>,
    user: MiniAppUser,
    body: Option<Json<MintRequest>>,
) -> Result<Json<MintResponse>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    // The user's wallet already sent the transaction
    if let Some(tx_hash) = string_field(body.client_tx_hash) {
        let progress = advance(&state, &user, ProgressState::NftMinted).await?;
        BadgeMetrics::record_mint(MintMode::Client, true);
        info!(user = %user.user_id, %tx_hash, "Recorded client-side mint");
        return Ok(Json(MintResponse {
            ok: true,
            tx_hash,
            progress,
            mode: Some(MintMode::Client.as_str()),
        }));
    }

    let to = non_empty(user.signer_address.clone())
        .or_else(|| string_field(body.address))
        .ok_or_else(|| ApiError::BadRequest(MISSING_SIGNER_ADDRESS.to_string()))?;
    let to: Address = to.parse()?;

    match state.minter.mint_badge(&to).await {
        MintResult::Minted { tx_hash } => {
            BadgeMetrics::record_mint(MintMode::Backend, true);
            let progress = advance(&state, &user, ProgressState::NftMinted).await?;
            Ok(Json(MintResponse { ok: true, tx_hash, progress, mode: None }))
        }
        MintResult::Failed { error } => {
            BadgeMetrics::record_mint(MintMode::Backend, false);
            warn!(user = %user.user_id, %to, "Mint failed: {}", error);
            Err(ApiError::Internal(error))
        }
    }
}

pub async fn get_state(
    State(state): State<AppState>,
    user: MiniAppUser,
) -> Result<Json<StateResponse>, ApiError> {
    let progress = state.store.get_progress(&user.user_id).await?;
    Ok(Json(StateResponse { user, progress }))
}

pub async fn reset(
    State(state): State<AppState>,
    user: MiniAppUser,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state.store.reset_progress(&user.user_id).await?;
    BadgeMetrics::record_transition(ProgressState::NotStarted);
    info!(user = %user.user_id, "Progress reset");
    Ok(Json(ProgressResponse { progress }))
}
