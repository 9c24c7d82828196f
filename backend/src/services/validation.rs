// src/services/validation.rs

//! Authoring rules checked before any store call.

use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{CreateQuizRequest, Question, QuestionKind, QuestionPayload, QuizOption},
    utils::html::clean_text,
};

/// Turns an authoring payload into a well-formed question.
///
/// * question text must not be blank
/// * multiple-choice needs at least one option, no blank option text and at most one correct option
/// * theory needs a non-blank correct answer
pub fn build_question(payload: QuestionPayload) -> Result<Question, AppError> {
    payload.validate()?;

    let question = clean_text(&payload.question);
    if question.is_empty() {
        return Err(AppError::BadRequest("Question text is required".to_string()));
    }

    match payload.kind.unwrap_or(QuestionKind::MultipleChoice) {
        QuestionKind::MultipleChoice => {
            if payload.options.is_empty() {
                return Err(AppError::BadRequest(
                    "Multiple-choice questions require at least one option".to_string(),
                ));
            }

            let options: Vec<QuizOption> = payload
                .options
                .iter()
                .map(|o| QuizOption {
                    text: clean_text(&o.text),
                    is_correct: o.is_correct,
                })
                .collect();

            if options.iter().any(|o| o.text.is_empty()) {
                return Err(AppError::BadRequest("Option text is required".to_string()));
            }

            if options.iter().filter(|o| o.is_correct).count() > 1 {
                return Err(AppError::BadRequest(
                    "Only one option can be marked correct".to_string(),
                ));
            }

            Ok(Question::MultipleChoice { question, options })
        }
        QuestionKind::Theory => {
            // Kept verbatim apart from trimming: it is compared, never rendered.
            let correct_answer = payload
                .correct_answer
                .as_deref()
                .map(|a| a.trim().to_string())
                .unwrap_or_default();

            if correct_answer.is_empty() {
                return Err(AppError::BadRequest(
                    "Theory questions require a correct answer".to_string(),
                ));
            }

            Ok(Question::Theory {
                question,
                correct_answer,
            })
        }
    }
}

/// Checked and cleaned fields of a new quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuiz {
    pub name: String,
    pub description: String,
    pub auth_code: Option<String>,
}

pub fn check_new_quiz(payload: CreateQuizRequest) -> Result<NewQuiz, AppError> {
    payload.validate()?;

    let name = clean_text(&payload.name);
    if name.is_empty() {
        return Err(AppError::BadRequest("Quiz name is required".to_string()));
    }

    Ok(NewQuiz {
        name,
        description: clean_text(&payload.description),
        auth_code: normalize_auth_code(payload.auth_code),
    })
}

/// An empty access code means "no code".
pub fn normalize_auth_code(code: Option<String>) -> Option<String> {
    code.filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(text: &str, is_correct: bool) -> QuizOption {
        QuizOption {
            text: text.to_string(),
            is_correct,
        }
    }

    fn payload(kind: Option<QuestionKind>) -> QuestionPayload {
        QuestionPayload {
            question: "What?".to_string(),
            kind,
            options: vec![option("A", true), option("B", false)],
            correct_answer: None,
        }
    }

    #[test]
    fn missing_type_defaults_to_multiple_choice() {
        let q = build_question(payload(None)).unwrap();
        assert_eq!(q.kind(), QuestionKind::MultipleChoice);
    }

    #[test]
    fn rejects_two_correct_options() {
        let mut p = payload(Some(QuestionKind::MultipleChoice));
        p.options.push(option("C", true));
        assert!(matches!(build_question(p), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rejects_multiple_choice_without_options() {
        let mut p = payload(None);
        p.options.clear();
        assert!(build_question(p).is_err());
    }

    #[test]
    fn rejects_blank_question_text() {
        let mut p = payload(None);
        p.question = "   ".to_string();
        assert!(build_question(p).is_err());
    }

    #[test]
    fn theory_requires_answer() {
        let mut p = payload(Some(QuestionKind::Theory));
        p.correct_answer = Some("  ".to_string());
        assert!(build_question(p.clone()).is_err());

        p.correct_answer = Some("Paris".to_string());
        let q = build_question(p).unwrap();
        assert_eq!(
            q,
            Question::Theory {
                question: "What?".to_string(),
                correct_answer: "Paris".to_string(),
            }
        );
    }

    #[test]
    fn markup_is_stripped_from_text() {
        let mut p = payload(None);
        p.question = "Is <script>alert(1)</script>this safe?".to_string();
        let q = build_question(p).unwrap();
        assert_eq!(q.text(), "Is this safe?");
    }

    #[test]
    fn new_quiz_requires_name_and_drops_empty_code() {
        let err = check_new_quiz(CreateQuizRequest {
            name: String::new(),
            description: String::new(),
            auth_code: None,
        });
        assert!(err.is_err());

        let ok = check_new_quiz(CreateQuizRequest {
            name: "Rust".to_string(),
            description: "Ownership".to_string(),
            auth_code: Some("1234".to_string()),
        })
        .unwrap();
        assert_eq!(ok.auth_code.as_deref(), Some("1234"));
        assert_eq!(normalize_auth_code(Some(String::new())), None);
    }
}
