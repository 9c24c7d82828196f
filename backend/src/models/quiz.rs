// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::store::{Document, StoreError, encode};

/// One answer option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    #[serde(default)]
    pub text: String,

    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

/// Discriminant of a question as stored in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "theory")]
    Theory,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::Theory => "theory",
        }
    }

    /// Maps a stored discriminant to a kind.
    ///
    /// Records written before theory questions existed carry no `type`, so
    /// anything other than `"theory"` is read as multiple-choice.
    fn from_stored(kind: Option<&str>) -> Self {
        match kind {
            Some("theory") => QuestionKind::Theory,
            _ => QuestionKind::MultipleChoice,
        }
    }
}

/// A quiz question.
///
/// Stored as `{question, type, options[]}` or `{question, type, correctAnswer}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuestionDocument", into = "QuestionDocument")]
pub enum Question {
    MultipleChoice {
        question: String,
        options: Vec<QuizOption>,
    },
    Theory {
        question: String,
        correct_answer: String,
    },
}

impl Question {
    pub fn text(&self) -> &str {
        match self {
            Question::MultipleChoice { question, .. } | Question::Theory { question, .. } => {
                question
            }
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            Question::Theory { .. } => QuestionKind::Theory,
        }
    }
}

/// Loosely typed wire form of [`Question`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct QuestionDocument {
    #[serde(default)]
    question: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<QuizOption>>,

    #[serde(
        rename = "correctAnswer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    correct_answer: Option<String>,
}

impl From<QuestionDocument> for Question {
    fn from(doc: QuestionDocument) -> Self {
        match QuestionKind::from_stored(doc.kind.as_deref()) {
            QuestionKind::MultipleChoice => Question::MultipleChoice {
                question: doc.question,
                options: doc.options.unwrap_or_default(),
            },
            QuestionKind::Theory => Question::Theory {
                question: doc.question,
                correct_answer: doc.correct_answer.unwrap_or_default(),
            },
        }
    }
}

impl From<Question> for QuestionDocument {
    fn from(question: Question) -> Self {
        match question {
            Question::MultipleChoice { question, options } => QuestionDocument {
                question,
                kind: Some(QuestionKind::MultipleChoice.as_str().to_string()),
                options: Some(options),
                correct_answer: None,
            },
            Question::Theory {
                question,
                correct_answer,
            } => QuestionDocument {
                question,
                kind: Some(QuestionKind::Theory.as_str().to_string()),
                options: None,
                correct_answer: Some(correct_answer),
            },
        }
    }
}

/// Snapshot of the admin who owns a quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRef {
    #[serde(default)]
    pub uid: String,

    #[serde(rename = "displayName", default)]
    pub display_name: String,

    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
}

/// A quiz as held in the repository mirror.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub name: String,
    pub description: String,
    pub admin: AdminRef,

    /// Shared secret gating entry; `None` means free access.
    pub auth_code: Option<String>,

    pub questions: Vec<Question>,
}

/// Body of a document in the `quizzes` collection.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QuizDocument {
    name: String,
    description: String,
    admin: AdminRef,
    auth_code: Option<String>,
    questions: Vec<Question>,
}

impl Quiz {
    /// Builds a quiz from a stored document. A missing question list reads as empty.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let body: QuizDocument = doc.decode()?;
        Ok(Quiz {
            id: doc.id.clone(),
            name: body.name,
            description: body.description,
            admin: body.admin,
            auth_code: body.auth_code.filter(|code| !code.is_empty()),
            questions: body.questions,
        })
    }

    /// Serialises the quiz body (everything except the id).
    pub fn to_document(&self) -> Result<Value, StoreError> {
        let body = QuizDocument {
            name: self.name.clone(),
            description: self.description.clone(),
            admin: self.admin.clone(),
            auth_code: self.auth_code.clone(),
            questions: self.questions.clone(),
        };
        encode(&self.id, &body)
    }

    pub fn requires_access_code(&self) -> bool {
        self.auth_code.is_some()
    }
}

/// DTO for listing quizzes to players (no answers, no access code).
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: String,
    pub name: String,
    pub description: String,
    pub admin: AdminRef,
    pub requires_access_code: bool,
    pub question_count: usize,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        PublicQuiz {
            id: quiz.id.clone(),
            name: quiz.name.clone(),
            description: quiz.description.clone(),
            admin: quiz.admin.clone(),
            requires_access_code: quiz.requires_access_code(),
            question_count: quiz.questions.len(),
        }
    }
}

/// DTO for sending a question to a player (excludes correctness data).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(question: &Question) -> Self {
        match question {
            Question::MultipleChoice { question, options } => PublicQuestion {
                question: question.clone(),
                kind: QuestionKind::MultipleChoice,
                options: options.iter().map(|o| o.text.clone()).collect(),
            },
            Question::Theory { question, .. } => PublicQuestion {
                question: question.clone(),
                kind: QuestionKind::Theory,
                options: Vec::new(),
            },
        }
    }
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Quiz name must be between 1 and 200 characters."))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,

    #[serde(rename = "authCode", default)]
    #[validate(length(min = 1, max = 64, message = "Access code must be between 1 and 64 characters."))]
    pub auth_code: Option<String>,
}

/// DTO for setting or clearing a quiz access code.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAuthCodeRequest {
    #[serde(rename = "authCode", default)]
    #[validate(length(min = 1, max = 64, message = "Access code must be between 1 and 64 characters."))]
    pub auth_code: Option<String>,
}

/// DTO for adding or replacing a question. Checked by `services::validation`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionPayload {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,

    /// Defaults to multiple-choice when omitted.
    #[serde(rename = "type", default)]
    pub kind: Option<QuestionKind>,

    #[serde(default)]
    pub options: Vec<QuizOption>,

    #[serde(rename = "correctAnswer", default)]
    #[validate(length(max = 500))]
    pub correct_answer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_question_without_type_is_multiple_choice() {
        let q: Question = serde_json::from_value(json!({
            "question": "2 + 2?",
            "options": [{"text": "4", "isCorrect": true}, {"text": "5", "isCorrect": false}]
        }))
        .unwrap();

        match q {
            Question::MultipleChoice { question, options } => {
                assert_eq!(question, "2 + 2?");
                assert_eq!(options.len(), 2);
                assert!(options[0].is_correct);
            }
            other => panic!("expected multiple-choice, got {:?}", other),
        }
    }

    #[test]
    fn theory_question_uses_wire_field_names() {
        let q = Question::Theory {
            question: "Capital of France?".to_string(),
            correct_answer: "Paris".to_string(),
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(
            value,
            json!({"question": "Capital of France?", "type": "theory", "correctAnswer": "Paris"})
        );
    }

    #[test]
    fn quiz_document_without_questions_reads_as_empty() {
        let doc = Document {
            id: "q1".to_string(),
            data: json!({"name": "Empty", "admin": {"uid": "a1"}, "authCode": null}),
        };
        let quiz = Quiz::from_document(&doc).unwrap();
        assert_eq!(quiz.id, "q1");
        assert!(quiz.questions.is_empty());
        assert!(!quiz.requires_access_code());
    }

    #[test]
    fn public_question_hides_correctness() {
        let q = Question::MultipleChoice {
            question: "Pick".to_string(),
            options: vec![QuizOption {
                text: "A".to_string(),
                is_correct: true,
            }],
        };
        let value = serde_json::to_value(PublicQuestion::from(&q)).unwrap();
        assert_eq!(value, json!({"question": "Pick", "type": "multiple-choice", "options": ["A"]}));
    }
}
