use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    ai::{
        dto::{AiResponse, AskRequest, ComposeEssayRequest, MinimumTokensResponse},
        metering::{cost_of, ensure_balance, minimum_balance_for, OperationKind},
        models::Model,
        prompt::essay_request,
    },
    auth::extractors::AuthUser,
    error::ApiError,
    state::AppState,
    users::repo::User,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/ask/", post(ask))
        .route("/ai/minimum-tokens-for-ai/", get(minimum_tokens_for_ai))
        .route("/ai/compose/essay/", post(compose_essay))
        .route(
            "/ai/minimum-tokens-for-compose-essay/",
            get(minimum_tokens_for_essay),
        )
}

/// Runs a balance-gated generation call and settles the cost: threshold
/// check, generate, count usage units, atomic debit. Generation is attempted
/// only after the check passes, and a failed generation never debits.
async fn generate_and_settle(
    state: &AppState,
    user_id: i64,
    kind: OperationKind,
    request: &str,
    model: Model,
    system_text: Option<&str>,
) -> Result<AiResponse, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    ensure_balance(&user, kind, &state.config.ai)?;

    let text = state
        .ai
        .generate(request, model, system_text)
        .await
        .map_err(ApiError::Upstream)?;

    let cost = cost_of(&text, model);
    let new_balance = User::debit(&state.db, user_id, cost)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    info!(user_id, cost, new_balance, "generation settled");
    Ok(AiResponse { text, tokens: cost })
}

#[instrument(skip(state, payload))]
pub async fn ask(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AiResponse>, ApiError> {
    let response = generate_and_settle(
        &state,
        user_id,
        OperationKind::Ask,
        &payload.text,
        payload.model,
        None,
    )
    .await?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn compose_essay(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ComposeEssayRequest>,
) -> Result<Json<AiResponse>, ApiError> {
    let request_text = essay_request(&payload);
    let response = generate_and_settle(
        &state,
        user_id,
        OperationKind::Essay,
        &request_text,
        // Essays are pinned to the metered model regardless of client input.
        Model::Gpt4oMini,
        Some(&state.config.ai.essay_system_text),
    )
    .await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn minimum_tokens_for_ai(
    State(state): State<AppState>,
) -> Json<MinimumTokensResponse> {
    Json(MinimumTokensResponse {
        tokens: minimum_balance_for(OperationKind::Ask, &state.config.ai),
    })
}

#[instrument(skip(state))]
pub async fn minimum_tokens_for_essay(
    State(state): State<AppState>,
) -> Json<MinimumTokensResponse> {
    Json(MinimumTokensResponse {
        tokens: minimum_balance_for(OperationKind::Essay, &state.config.ai),
    })
}
