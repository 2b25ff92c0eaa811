use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::{AuthUser, BearerClaims},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        TokenKind,
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            AccessTokenResponse, LoginRequest, RegisterRequest, TokenPairResponse,
            TokensCountResponse, UserSummary,
        },
        repo::User,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register/", post(register))
        .route("/users/login/", post(login))
        .route("/users/refresh/", post(refresh))
        .route("/users/me/tokens/", get(my_tokens))
        .route("/users/me/can_compose_essay/", get(can_compose_essay))
        .route("/users/me/can_request_chatgpt/", get(can_request_chatgpt))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hash).await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserSummary {
            username: user.username,
            email: user.email,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let user = if let Some(email) = payload.email.as_deref().filter(|e| !e.is_empty()) {
        User::find_by_email(&state.db, &email.trim().to_lowercase()).await?
    } else if let Some(username) = payload.username.as_deref().filter(|u| !u.is_empty()) {
        User::find_by_username(&state.db, username).await?
    } else {
        warn!("login without username or email");
        return Err(ApiError::InsufficientIdentifier);
    };

    // Unknown identifier and wrong password collapse into the same error so
    // account existence cannot be probed.
    let user = match user {
        Some(u) => u,
        None => {
            warn!("login with unknown identifier");
            return Err(ApiError::InvalidCredentials);
        }
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

#[instrument(skip(state, bearer))]
pub async fn refresh(
    State(state): State<AppState>,
    bearer: BearerClaims,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let BearerClaims(claims) = bearer;
    claims.require_kind(TokenKind::Refresh)?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(claims.user_id()?)?;
    Ok(Json(AccessTokenResponse { access_token }))
}

#[instrument(skip(state))]
pub async fn my_tokens(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<TokensCountResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(TokensCountResponse {
        tokens_count: user.tokens_count,
    }))
}

#[instrument(skip(state))]
pub async fn can_compose_essay(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<bool>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(user.tokens_count >= state.config.ai.min_tokens_for_essay))
}

#[instrument(skip(state))]
pub async fn can_request_chatgpt(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<bool>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(user.tokens_count >= state.config.ai.min_tokens_for_ai))
}
