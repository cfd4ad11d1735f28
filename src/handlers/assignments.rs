// src/handlers/assignments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::courses::find_course,
    models::{
        assignment::{
            Assignment, CreateAssignmentRequest, StudentAssignment, StudentAssignmentRow,
            TutorAssignment,
        },
        user::Role,
    },
    utils::jwt::Claims,
};

const ASSIGNMENT_COLUMNS: &str =
    "id, course_id, title, instructions, deadline, max_points, created_at";

/// Creates an assignment in a course the caller owns.
/// Tutor/Admin only.
pub async fn create_assignment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }

    let course = find_course(&pool, payload.course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if course.tutor_id != claims.user_id() && claims.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to add assignments to this course".to_string(),
        ));
    }

    let instructions = payload
        .instructions
        .map(|i| i.trim().to_string())
        .unwrap_or_default();

    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (course_id, title, instructions, deadline, max_points)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {ASSIGNMENT_COLUMNS}"
    ))
    .bind(payload.course_id)
    .bind(&title)
    .bind(&instructions)
    .bind(payload.deadline)
    .bind(payload.max_points.unwrap_or(100))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create assignment: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Lists the assignments of a course, earliest deadline first.
pub async fn list_course_assignments(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE course_id = $1 ORDER BY deadline ASC"
    ))
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(assignments))
}

/// Retrieves a single assignment by ID.
pub async fn get_assignment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Assignment not found".to_string()))?;

    Ok(Json(assignment))
}

/// Lists assignments across the calling student's enrolled courses,
/// each with the derived status of their own submission (present, grade,
/// late relative to the deadline).
/// Student only.
pub async fn my_assignments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, StudentAssignmentRow>(
        "SELECT a.id, a.course_id, c.title AS course_title, a.title,
                a.instructions, a.deadline, a.max_points,
                s.submission_date, s.grade
         FROM assignments a
         JOIN courses c ON a.course_id = c.id
         JOIN enrollments e ON e.course_id = a.course_id AND e.student_id = $1
         LEFT JOIN submissions s ON s.assignment_id = a.id AND s.student_id = $1
         ORDER BY a.deadline ASC",
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    let assignments: Vec<StudentAssignment> =
        rows.into_iter().map(StudentAssignment::from_row).collect();

    Ok(Json(assignments))
}

/// Lists assignments across the calling tutor's courses with aggregate
/// submission counts and how many still await a grade.
/// Tutor/Admin only.
pub async fn tutor_assignments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    // Subquery counts are cheap here given the index on assignment_id.
    let assignments = sqlx::query_as::<_, TutorAssignment>(
        "SELECT a.id, a.course_id, c.title AS course_title, a.title,
                a.instructions, a.deadline, a.max_points,
                (SELECT COUNT(*) FROM submissions s WHERE s.assignment_id = a.id) AS total_submissions,
                (SELECT COUNT(*) FROM submissions s
                  WHERE s.assignment_id = a.id AND s.grade IS NULL) AS pending_grading
         FROM assignments a
         JOIN courses c ON a.course_id = c.id
         WHERE c.tutor_id = $1
         ORDER BY a.deadline ASC",
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(assignments))
}
