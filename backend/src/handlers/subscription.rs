// src/handlers/subscription.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState, utils::jwt::Claims};

#[derive(Debug, Deserialize)]
pub struct AdminSearchParams {
    pub search: Option<String>,
}

/// Admin ids the caller follows.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    Json(state.subscriptions.admin_ids(&claims.sub).await)
}

/// Follows an admin. Subscribing twice is a no-op.
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(admin_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.admins.find(&admin_id).await?.is_none() {
        return Err(AppError::NotFound("Admin not found".to_string()));
    }

    let updated = state.subscriptions.subscribe(&claims.sub, &admin_id).await;
    Ok(Json(updated))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(admin_id): Path<String>,
) -> impl IntoResponse {
    Json(state.subscriptions.unsubscribe(&claims.sub, &admin_id).await)
}

/// Admin directory, filtered by name or email.
pub async fn list_admins(
    State(state): State<AppState>,
    Query(params): Query<AdminSearchParams>,
) -> impl IntoResponse {
    let search = params.search.as_deref().filter(|s| !s.trim().is_empty());
    Json(state.admins.list(search).await)
}
