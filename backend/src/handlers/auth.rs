// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    events::DomainEvent,
    models::user::{RegisterRequest, SignInRequest},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        html::clean_text,
        jwt::{Claims, sign_jwt},
    },
};

/// Creates an account and signs it in.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the token and the identity.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let account = state
        .users
        .create(
            &payload.email,
            &clean_text(&payload.display_name),
            payload.photo_url.as_deref().unwrap_or_default(),
            hashed_password,
        )
        .await?;

    let identity = account.identity();
    let token = sign_jwt(&identity, &state.config.jwt_secret, state.config.jwt_expiration)?;
    tracing::info!("New account registered: {}", identity.uid);
    state.events.publish(DomainEvent::IdentityChanged {
        uid: Some(identity.uid.clone()),
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "type": "Bearer",
            "user": identity,
        })),
    ))
}

/// Authenticates by email and password and returns a JWT token.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let account = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &account.password_hash)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let identity = account.identity();
    let token = sign_jwt(&identity, &state.config.jwt_secret, state.config.jwt_expiration)?;
    state.events.publish(DomainEvent::IdentityChanged {
        uid: Some(identity.uid.clone()),
    });

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": identity,
    })))
}

/// Signs the caller out. Tokens are stateless, so this only notifies listeners.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    tracing::info!("User {} signed out", claims.sub);
    state
        .events
        .publish(DomainEvent::IdentityChanged { uid: None });
    StatusCode::NO_CONTENT
}

/// The stored account behind the current token.
/// A token whose account no longer exists is rejected.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .users
        .find(&claims.sub)
        .await?
        .ok_or(AppError::AuthError("Account not found".to_string()))?;

    let is_admin = state.admins.is_admin(&account.uid).await;
    Ok(Json(json!({
        "user": account.identity(),
        "isAdmin": is_admin,
    })))
}
