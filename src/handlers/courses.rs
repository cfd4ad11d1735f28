// src/handlers/courses.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::{Course, CourseWithTutor, CreateCourseRequest, UpdateCourseRequest},
        user::Role,
    },
    utils::jwt::Claims,
};

const COURSE_COLUMNS: &str = "id, title, description, tutor_id, materials, created_at, updated_at";

pub(crate) async fn find_course(pool: &PgPool, id: i64) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(course)
}

/// Lists all courses with the owning tutor joined in.
pub async fn list_courses(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, CourseWithTutor>(
        "SELECT c.id, c.title, c.description, c.tutor_id,
                u.name AS tutor_name, u.email AS tutor_email,
                c.materials, c.created_at
         FROM courses c
         JOIN users u ON c.tutor_id = u.id
         ORDER BY c.created_at DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(courses))
}

/// Retrieves a single course by ID.
pub async fn get_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = sqlx::query_as::<_, CourseWithTutor>(
        "SELECT c.id, c.title, c.description, c.tutor_id,
                u.name AS tutor_name, u.email AS tutor_email,
                c.materials, c.created_at
         FROM courses c
         JOIN users u ON c.tutor_id = u.id
         WHERE c.id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    Ok(Json(course))
}

/// Creates a new course owned by the calling tutor.
/// Tutor/Admin only.
pub async fn create_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let course = sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (title, description, tutor_id)
         VALUES ($1, $2, $3)
         RETURNING {COURSE_COLUMNS}"
    ))
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(course)))
}

/// Updates a course. Owner or Admin only.
///
/// Title and description are patched; materials in the payload are
/// APPENDED to the existing list, never replacing it.
pub async fn update_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let course = find_course(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if course.tutor_id != claims.user_id() && claims.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to update this course".to_string(),
        ));
    }

    if let Some(title) = payload.title {
        sqlx::query("UPDATE courses SET title = $1, updated_at = NOW() WHERE id = $2")
            .bind(title.trim())
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(description) = payload.description {
        sqlx::query("UPDATE courses SET description = $1, updated_at = NOW() WHERE id = $2")
            .bind(description.trim())
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_materials) = payload.materials {
        sqlx::query(
            "UPDATE courses SET materials = materials || $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(SqlJson(new_materials))
        .bind(id)
        .execute(&pool)
        .await?;
    }

    let updated = find_course(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    Ok(Json(updated))
}
