// src/services/session.rs

//! Quiz-taking state machine.
//!
//! A [`QuizSession`] walks one player through one quiz:
//! `AwaitingAuth` (only when the quiz has an access code) → `InProgress` →
//! `Completed`. It scores each answer, times the attempt and builds exactly
//! one [`QuizResult`] when the last question is answered.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    quiz::{PublicQuestion, Question, Quiz},
    result::{QuizResult, QuizSnapshot, UserSnapshot},
    user::Identity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingAuth,
    InProgress,
    Completed,
}

/// A player's answer to the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Correctness of the chosen option, resolved by the caller.
    Choice(bool),
    /// Free text for a theory question.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    EmptyQuiz,
    AuthCodeInvalid,
    InvalidTransition {
        state: SessionState,
        operation: &'static str,
    },
    ResponseMismatch {
        expected: &'static str,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuiz => write!(f, "Quiz has no questions"),
            SessionError::AuthCodeInvalid => write!(f, "Invalid access code"),
            SessionError::InvalidTransition { state, operation } => {
                write!(f, "Cannot {} while session is {:?}", operation, state)
            }
            SessionError::ResponseMismatch { expected } => {
                write!(f, "Current question expects {}", expected)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Outcome of a single answer submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub score: u32,
    pub completed: bool,
}

/// Normalised equality used to grade theory answers.
pub fn theory_answer_matches(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// One attempt at a quiz. Ephemeral; only its [`QuizResult`] is persisted.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    quiz: Quiz,
    player: Identity,
    state: SessionState,
    current_index: usize,
    score: u32,
    started_at: Option<DateTime<Utc>>,
    theory_answers: BTreeMap<usize, String>,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Starts an attempt. The timer starts now unless the quiz is gated by an access code.
    pub fn begin(quiz: Quiz, player: Identity, now: DateTime<Utc>) -> Result<Self, SessionError> {
        if quiz.questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }

        let (state, started_at) = if quiz.requires_access_code() {
            (SessionState::AwaitingAuth, None)
        } else {
            (SessionState::InProgress, Some(now))
        };

        Ok(QuizSession {
            id: Uuid::new_v4(),
            quiz,
            player,
            state,
            current_index: 0,
            score: 0,
            started_at,
            theory_answers: BTreeMap::new(),
            result: None,
        })
    }

    /// Checks a candidate access code. Retries are unlimited.
    pub fn validate_access(&mut self, candidate: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.state != SessionState::AwaitingAuth {
            return Err(self.invalid("validate access"));
        }

        if self.quiz.auth_code.as_deref() != Some(candidate) {
            return Err(SessionError::AuthCodeInvalid);
        }

        self.state = SessionState::InProgress;
        self.started_at = Some(now);
        Ok(())
    }

    /// Grades the answer to the current question and advances.
    pub fn submit_answer(
        &mut self,
        response: Response,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.state != SessionState::InProgress {
            return Err(self.invalid("submit an answer"));
        }

        let correct = match (&self.quiz.questions[self.current_index], response) {
            (Question::MultipleChoice { .. }, Response::Choice(correct)) => correct,
            (Question::Theory { correct_answer, .. }, Response::Text(text)) => {
                let correct = theory_answer_matches(&text, correct_answer);
                self.theory_answers.insert(self.current_index, text);
                correct
            }
            (Question::MultipleChoice { .. }, Response::Text(_)) => {
                return Err(SessionError::ResponseMismatch {
                    expected: "an option choice",
                });
            }
            (Question::Theory { .. }, Response::Choice(_)) => {
                return Err(SessionError::ResponseMismatch {
                    expected: "a text answer",
                });
            }
        };

        if correct {
            self.score += 1;
        }

        if self.current_index + 1 < self.quiz.questions.len() {
            self.current_index += 1;
        } else {
            self.complete(now);
        }

        Ok(AnswerOutcome {
            correct,
            score: self.score,
            completed: self.state == SessionState::Completed,
        })
    }

    /// The result built when the session completed. Never re-grades.
    pub fn result(&self) -> Result<&QuizResult, SessionError> {
        self.result.as_ref().ok_or(self.invalid("read the result"))
    }

    fn complete(&mut self, now: DateTime<Utc>) {
        let elapsed_time = self
            .started_at
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0);

        self.state = SessionState::Completed;
        self.result = Some(QuizResult {
            user: UserSnapshot {
                name: non_empty_or(&self.player.display_name, "Anonymous"),
                email: non_empty_or(&self.player.email, "Unknown"),
            },
            quiz: QuizSnapshot {
                id: self.quiz.id.clone(),
                name: self.quiz.name.clone(),
            },
            score: self.score,
            total_questions: self.quiz.questions.len() as u32,
            elapsed_time,
            completed_at: Some(now),
            theory_answers: self.theory_answers.clone(),
        });
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state,
            operation,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn player(&self) -> &Identity {
        &self.player
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// The question awaiting an answer, if the session is in progress.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::InProgress => self.quiz.questions.get(self.current_index),
            _ => None,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            quiz_id: self.quiz.id.clone(),
            quiz_name: self.quiz.name.clone(),
            state: self.state,
            current_index: self.current_index,
            total_questions: self.quiz.questions.len(),
            score: self.score,
            question: self.current_question().map(PublicQuestion::from),
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Snapshot of a session safe to send to the player.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub quiz_id: String,
    pub quiz_name: String,
    pub state: SessionState,
    pub current_index: usize,
    pub total_questions: usize,
    pub score: u32,
    pub question: Option<PublicQuestion>,
}

/// Live sessions, keyed by id.
///
/// Each session sits behind its own mutex so operations on one session run
/// one at a time. Two queued submits can still both advance the index.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Arc<Mutex<QuizSession>>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: QuizSession) -> Arc<Mutex<QuizSession>> {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.lock().await.insert(id, handle.clone());
        handle
    }

    /// Looks up a session owned by `uid`. Sessions of other players are invisible.
    pub async fn get(&self, id: Uuid, uid: &str) -> Option<Arc<Mutex<QuizSession>>> {
        let handle = self.sessions.lock().await.get(&id).cloned()?;
        let owned = handle.lock().await.player().uid == uid;
        owned.then_some(handle)
    }

    pub async fn remove(&self, id: Uuid) {
        self.sessions.lock().await.remove(&id);
    }

    /// Drops every session of a player, finished or not. Called when they
    /// start a new one, so a player holds at most one live session.
    pub async fn discard_player(&self, uid: &str) {
        let handles: Vec<(Uuid, Arc<Mutex<QuizSession>>)> = self
            .sessions
            .lock()
            .await
            .iter()
            .map(|(id, h)| (*id, h.clone()))
            .collect();

        for (id, handle) in handles {
            let session = handle.lock().await;
            if session.player().uid == uid {
                drop(session);
                self.remove(id).await;
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
