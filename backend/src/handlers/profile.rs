// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    services::analytics::{HistorySort, sort_history, user_overview},
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub sort: HistorySort,
}

/// The caller's past attempts, matched by email.
pub async fn my_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let results = state.results.for_user(&claims.email).await;
    Json(sort_history(&results, params.sort))
}

pub async fn overview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let results = state.results.for_user(&claims.email).await;
    Json(user_overview(&results))
}
