// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{AdminRef, CreateQuizRequest, QuestionPayload, Quiz, UpdateAuthCodeRequest},
    services::{
        analytics::{AnalyticsOptions, QuizAnalytics},
        validation::{build_question, check_new_quiz, normalize_auth_code},
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Registers the caller as an admin.
/// Any signed-in user may do this; it is what makes their quizzes publishable.
pub async fn register_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state.admins.register(&claims.identity()).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Drops the caller's admin registration. Their quizzes stay in place.
pub async fn remove_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sync = state.admins.remove(&claims.sub).await;
    Ok(Json(sync))
}

/// Lists the quizzes owned by the calling admin, answers included.
/// Admin only.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.quizzes.owned_by(&claims.sub).await))
}

/// Creates a new quiz owned by the caller.
/// Admin only.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_quiz = check_new_quiz(payload)?;

    let identity = claims.identity();
    let owner = AdminRef {
        uid: identity.uid,
        display_name: identity.display_name,
        photo_url: identity.photo_url,
    };

    let created = state.quizzes.create_quiz(new_quiz, owner).await;
    tracing::info!("Admin {} created quiz {}", claims.sub, created.value.id);

    Ok((StatusCode::CREATED, Json(created)))
}

/// Deletes a quiz.
/// Admin only, owner only.
pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    owned_quiz(&state, &quiz_id, &claims).await?;
    let deleted = state.quizzes.delete_quiz(&quiz_id).await?;
    Ok(Json(deleted))
}

/// Sets or clears (`null` / empty) the access code of a quiz.
pub async fn set_auth_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
    Json(payload): Json<UpdateAuthCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    owned_quiz(&state, &quiz_id, &claims).await?;
    let updated = state
        .quizzes
        .update_auth_code(&quiz_id, normalize_auth_code(payload.auth_code))
        .await?;
    Ok(Json(updated))
}

/// Appends a question after validating it.
pub async fn add_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let question = build_question(payload)?;

    owned_quiz(&state, &quiz_id, &claims).await?;
    let updated = state.quizzes.add_question(&quiz_id, question).await?;
    Ok((StatusCode::CREATED, Json(updated)))
}

/// Replaces the question at `index`.
pub async fn update_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, index)): Path<(String, usize)>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let question = build_question(payload)?;

    owned_quiz(&state, &quiz_id, &claims).await?;
    let updated = state
        .quizzes
        .update_question(&quiz_id, index, question)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, AppError> {
    owned_quiz(&state, &quiz_id, &claims).await?;
    let updated = state.quizzes.delete_question(&quiz_id, index).await?;
    Ok(Json(updated))
}

/// Raw results of a quiz, including theory answers.
pub async fn quiz_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    owned_quiz(&state, &quiz_id, &claims).await?;
    Ok(Json(state.results.for_quiz(&quiz_id).await))
}

/// Aggregated dashboard data for a quiz.
pub async fn quiz_analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    owned_quiz(&state, &quiz_id, &claims).await?;

    let results = state.results.for_quiz(&quiz_id).await;
    let options = AnalyticsOptions {
        top_performers: state.config.top_performers,
        pass_threshold: state.config.pass_threshold,
        offset: state.config.activity_offset,
    };

    Ok(Json(QuizAnalytics::compute(&results, &options)))
}

/// Looks up a quiz and checks the caller owns it.
async fn owned_quiz(state: &AppState, quiz_id: &str, claims: &Claims) -> Result<Quiz, AppError> {
    let quiz = state
        .quizzes
        .find(quiz_id)
        .await
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.admin.uid != claims.sub {
        return Err(AppError::Forbidden(
            "Quiz belongs to another admin".to_string(),
        ));
    }
    Ok(quiz)
}
