// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    events::DomainEvent,
    models::quiz::{PublicQuiz, Question},
    services::session::{QuizSession, Response},
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub code: String,
}

/// Either an option pick (multiple-choice) or free text (theory).
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option_index: Option<usize>,
    pub text: Option<String>,
}

/// Lists quizzes published by the admins the caller follows.
/// Answers and access codes are never part of the listing.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let admin_ids = state.subscriptions.admin_ids(&claims.sub).await;
    let quizzes: Vec<PublicQuiz> = state
        .quizzes
        .visible_to(&admin_ids, params.search.as_deref())
        .await
        .iter()
        .map(PublicQuiz::from)
        .collect();

    Ok(Json(quizzes))
}

/// Starts a new attempt at a quiz. Earlier sessions of the caller are discarded first.
pub async fn begin_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .quizzes
        .find(&quiz_id)
        .await
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    state.sessions.discard_player(&claims.sub).await;

    let session = QuizSession::begin(quiz, claims.identity(), Utc::now())?;
    let view = session.view();
    state.sessions.insert(session).await;

    tracing::info!("User {} started quiz {}", claims.sub, quiz_id);
    state.events.publish(DomainEvent::SessionStarted {
        session_id: view.id,
        quiz_id,
    });

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find_session(&state, session_id, &claims).await?;
    let view = handle.lock().await.view();
    Ok(Json(view))
}

/// Checks the quiz access code. A wrong code leaves the session waiting; retries are allowed.
pub async fn validate_access(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find_session(&state, session_id, &claims).await?;
    let mut session = handle.lock().await;

    session.validate_access(&req.code, Utc::now())?;
    state
        .events
        .publish(DomainEvent::SessionUnlocked { session_id });

    Ok(Json(session.view()))
}

/// Grades the answer to the current question.
///
/// On the last question the session completes and the result is saved.
/// Saving is best effort: the response carries the sync status instead of failing.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find_session(&state, session_id, &claims).await?;

    let (outcome, view, result) = {
        let mut session = handle.lock().await;
        let response = resolve_response(session.current_question(), req)?;
        let outcome = session.submit_answer(response, Utc::now())?;
        let result = session.result().ok().cloned();
        (outcome, session.view(), result)
    };

    let sync = match result {
        Some(result) => {
            state.events.publish(DomainEvent::SessionCompleted {
                session_id,
                score: result.score,
                total: result.total_questions,
            });
            Some(state.results.record(&result).await)
        }
        None => {
            state.events.publish(DomainEvent::SessionAdvanced {
                session_id,
                index: view.current_index,
                score: view.score,
            });
            None
        }
    };

    Ok(Json(json!({
        "correct": outcome.correct,
        "score": outcome.score,
        "completed": outcome.completed,
        "session": view,
        "sync": sync,
    })))
}

/// The final result of a completed session.
pub async fn get_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find_session(&state, session_id, &claims).await?;
    let session = handle.lock().await;
    let result = session.result()?.clone();
    Ok(Json(result))
}

async fn find_session(
    state: &AppState,
    session_id: Uuid,
    claims: &Claims,
) -> Result<std::sync::Arc<tokio::sync::Mutex<QuizSession>>, AppError> {
    state
        .sessions
        .get(session_id, &claims.sub)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))
}

/// Turns the request body into a machine response.
///
/// Option picks are resolved to their correctness here so the client never
/// sees which option is right. Anything the current question cannot take is
/// passed through and rejected by the session itself.
fn resolve_response(question: Option<&Question>, req: AnswerRequest) -> Result<Response, AppError> {
    match (req.option_index, req.text) {
        (Some(index), _) => match question {
            Some(Question::MultipleChoice { options, .. }) => options
                .get(index)
                .map(|option| Response::Choice(option.is_correct))
                .ok_or_else(|| AppError::BadRequest(format!("Option {} does not exist", index))),
            _ => Ok(Response::Choice(false)),
        },
        (None, Some(text)) => Ok(Response::Text(text)),
        (None, None) => Err(AppError::BadRequest(
            "Either option_index or text is required".to_string(),
        )),
    }
}
