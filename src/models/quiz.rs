// src/models/quiz.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Kind of a quiz question.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum QuestionKind {
    #[default]
    #[serde(rename = "Multiple Choice")]
    MultipleChoice,
    #[serde(rename = "True/False")]
    TrueFalse,
}

/// A single question, stored inside the quiz's JSONB array.
/// `correct_option_index` must never reach student clients; see
/// `PublicQuizQuestion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option_index: i32,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
}

/// Question payload safe to return to students: the answer key is stripped.
#[derive(Debug, Serialize)]
pub struct PublicQuizQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
}

impl From<QuizQuestion> for PublicQuizQuestion {
    fn from(q: QuizQuestion) -> Self {
        Self {
            question_text: q.question_text,
            options: q.options,
            kind: q.kind,
        }
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub questions: Json<Vec<QuizQuestion>>,
    /// Time allowance in minutes.
    pub timer_limit: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Quiz payload for student clients.
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub questions: Vec<PublicQuizQuestion>,
    pub timer_limit: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Quiz> for PublicQuiz {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id,
            title: quiz.title,
            questions: quiz.questions.0.into_iter().map(Into::into).collect(),
            timer_limit: quiz.timer_limit,
            created_at: quiz.created_at,
        }
    }
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub course_id: i64,

    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,

    #[validate(custom(function = validate_questions))]
    pub questions: Vec<QuizQuestion>,

    #[validate(range(min = 1, message = "timer_limit must be at least one minute."))]
    pub timer_limit: Option<i32>,
}

fn validate_questions(questions: &[QuizQuestion]) -> Result<(), validator::ValidationError> {
    if questions.is_empty() {
        return Err(validator::ValidationError::new("questions_cannot_be_empty"));
    }
    for q in questions {
        if q.question_text.trim().is_empty() {
            return Err(validator::ValidationError::new("question_text_required"));
        }
        if q.options.len() < 2 {
            return Err(validator::ValidationError::new("at_least_two_options"));
        }
        let idx = q.correct_option_index;
        if idx < 0 || idx as usize >= q.options.len() {
            return Err(validator::ValidationError::new(
                "correct_option_index_out_of_range",
            ));
        }
    }
    Ok(())
}

/// DTO for submitting quiz answers.
/// Key: question index within the quiz. Value: chosen option index.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: HashMap<usize, i32>,
}

/// Represents the 'quiz_results' table in the database.
/// Immutable once created; a retake inserts a new row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizResult {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    pub answers: Json<HashMap<usize, i32>>,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}
