// src/handlers/quizzes.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::courses::find_course,
    models::{
        quiz::{CreateQuizRequest, PublicQuiz, Quiz, QuizQuestion, QuizResult, SubmitQuizRequest},
        user::Role,
    },
    utils::jwt::Claims,
};

const QUIZ_COLUMNS: &str = "id, course_id, title, questions, timer_limit, created_at";

/// Number of answers whose chosen option index equals the stored
/// `correct_option_index`. Answers pointing at question indexes the quiz
/// does not have are ignored.
fn calculate_quiz_score(questions: &[QuizQuestion], answers: &HashMap<usize, i32>) -> i32 {
    let mut correct = 0;
    for (question_index, chosen) in answers {
        if let Some(question) = questions.get(*question_index) {
            if *chosen == question.correct_option_index {
                correct += 1;
            }
        }
    }
    correct
}

/// Creates a quiz in a course the caller owns.
/// Tutor/Admin only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let course = find_course(&pool, payload.course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if course.tutor_id != claims.user_id() && claims.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to add quizzes to this course".to_string(),
        ));
    }

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (course_id, title, questions, timer_limit)
         VALUES ($1, $2, $3, $4)
         RETURNING {QUIZ_COLUMNS}"
    ))
    .bind(payload.course_id)
    .bind(payload.title.trim())
    .bind(SqlJson(payload.questions))
    .bind(payload.timer_limit.unwrap_or(30))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Serialize a quiz for the caller: staff see the full questions, students
/// get the answer key stripped.
fn quiz_response(quiz: Quiz, role: Role) -> Response {
    match role {
        Role::Tutor | Role::Admin => Json(quiz).into_response(),
        Role::Student => Json(PublicQuiz::from(quiz)).into_response(),
    }
}

/// Lists the quizzes of a course.
pub async fn list_course_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<Response, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE course_id = $1 ORDER BY created_at DESC"
    ))
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    let response = match claims.role {
        Role::Tutor | Role::Admin => Json(quizzes).into_response(),
        Role::Student => {
            let public: Vec<PublicQuiz> = quizzes.into_iter().map(Into::into).collect();
            Json(public).into_response()
        }
    };

    Ok(response)
}

/// Retrieves a single quiz by ID.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(quiz_response(quiz, claims.role))
}

/// Submits quiz answers and records an immutable result.
/// Student only; requires enrollment in the quiz's course.
///
/// Each call inserts a new result row; retakes are kept side by side.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let student_id = claims.user_id();

    let enrollment = sqlx::query("SELECT id FROM enrollments WHERE student_id = $1 AND course_id = $2")
        .bind(student_id)
        .bind(quiz.course_id)
        .fetch_optional(&pool)
        .await?;

    if enrollment.is_none() {
        return Err(AppError::Forbidden(
            "You must be enrolled in this course to take the quiz".to_string(),
        ));
    }

    let questions = &quiz.questions.0;
    let total_questions = questions.len() as i32;
    let score = calculate_quiz_score(questions, &payload.answers);
    let percentage = if total_questions == 0 {
        0.0
    } else {
        f64::from(score) / f64::from(total_questions) * 100.0
    };

    let result = sqlx::query_as::<_, QuizResult>(
        "INSERT INTO quiz_results (quiz_id, student_id, answers, score, total_questions, percentage)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, quiz_id, student_id, answers, score, total_questions, percentage, submitted_at",
    )
    .bind(quiz.id)
    .bind(student_id)
    .bind(SqlJson(payload.answers))
    .bind(score)
    .bind(total_questions)
    .bind(percentage)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store quiz result: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(result)))
}
