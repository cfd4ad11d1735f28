// src/handlers/enrollments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::enrollment::{EnrollRequest, Enrollment, EnrollmentWithCourse},
    utils::jwt::Claims,
};

/// Enrolls the calling student into a course.
/// Student only. A second enrollment for the same (student, course)
/// pair is rejected with 409.
pub async fn enroll(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id();

    let course = sqlx::query("SELECT id FROM courses WHERE id = $1")
        .bind(payload.course_id)
        .fetch_optional(&pool)
        .await?;

    if course.is_none() {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    let existing = sqlx::query("SELECT id FROM enrollments WHERE student_id = $1 AND course_id = $2")
        .bind(student_id)
        .bind(payload.course_id)
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Already enrolled".to_string()));
    }

    let enrollment = sqlx::query_as::<_, Enrollment>(
        "INSERT INTO enrollments (student_id, course_id)
         VALUES ($1, $2)
         RETURNING id, student_id, course_id, status, enrolled_at",
    )
    .bind(student_id)
    .bind(payload.course_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Backstop for the unique constraint when two requests race.
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("Already enrolled".to_string())
        } else {
            tracing::error!("Failed to create enrollment: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Lists the calling student's enrollments with course data joined.
pub async fn my_enrollments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let enrollments = sqlx::query_as::<_, EnrollmentWithCourse>(
        "SELECT e.id, e.course_id, c.title AS course_title,
                c.description AS course_description, e.status, e.enrolled_at
         FROM enrollments e
         JOIN courses c ON e.course_id = c.id
         WHERE e.student_id = $1
         ORDER BY e.enrolled_at DESC",
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(enrollments))
}

/// Reports whether the caller is enrolled in the given course.
pub async fn check_enrollment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let enrollment = sqlx::query("SELECT id FROM enrollments WHERE student_id = $1 AND course_id = $2")
        .bind(claims.user_id())
        .bind(course_id)
        .fetch_optional(&pool)
        .await?;

    Ok(Json(json!({ "enrolled": enrollment.is_some() })))
}
