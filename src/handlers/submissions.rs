// src/handlers/submissions.rs

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::submission::{GradeRequest, Submission, SubmissionWithStudent},
    utils::{jwt::Claims, sanitize::strip_tags, upload::store_upload},
};

const SUBMISSION_COLUMNS: &str =
    "id, assignment_id, student_id, file_url, text_entry, submission_date, grade, feedback";

/// Submits (or resubmits) work for an assignment.
/// Student only. Multipart fields: `assignment_id`, optional `text_entry`,
/// optional `file` (pdf/doc/docx/pptx/zip).
///
/// A second submit for the same (assignment, student) pair overwrites the
/// existing row in place; the pair never yields more than one row. A
/// resubmission without a file keeps the previously uploaded one.
pub async fn submit(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut assignment_id: Option<i64> = None;
    let mut text_entry: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        match field.name().unwrap_or("") {
            "assignment_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest("Invalid assignment id".to_string()))?;
                assignment_id = Some(text.parse::<i64>().map_err(|_| {
                    AppError::BadRequest("Invalid assignment id".to_string())
                })?);
            }
            "text_entry" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest("Invalid text entry".to_string()))?;
                text_entry = Some(strip_tags(&text));
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or(AppError::BadRequest("File name is required".to_string()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Failed to read file".to_string()))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let assignment_id =
        assignment_id.ok_or(AppError::BadRequest("assignment_id is required".to_string()))?;

    let assignment = sqlx::query("SELECT id FROM assignments WHERE id = $1")
        .bind(assignment_id)
        .fetch_optional(&pool)
        .await?;

    if assignment.is_none() {
        return Err(AppError::NotFound("Assignment not found".to_string()));
    }

    let file_url = match file {
        Some((filename, bytes)) => {
            Some(store_upload(&config.upload_dir, &filename, &bytes).await?)
        }
        None => None,
    };

    // Single upsert keeps the (assignment, student) pair at one row and
    // stamps the submission date server-side. NULL inputs keep whatever
    // file/text the earlier submission carried.
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (assignment_id, student_id, file_url, text_entry, submission_date)
         VALUES ($1, $2, $3, $4, NOW())
         ON CONFLICT (assignment_id, student_id) DO UPDATE SET
             file_url = COALESCE(EXCLUDED.file_url, submissions.file_url),
             text_entry = COALESCE(EXCLUDED.text_entry, submissions.text_entry),
             submission_date = EXCLUDED.submission_date
         RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(assignment_id)
    .bind(claims.user_id())
    .bind(&file_url)
    .bind(&text_entry)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store submission: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(submission))
}

/// Lists all submissions for an assignment with student info joined.
/// Tutor/Admin only.
pub async fn list_for_assignment(
    State(pool): State<PgPool>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = sqlx::query_as::<_, SubmissionWithStudent>(
        "SELECT s.id, s.assignment_id, s.student_id,
                u.name AS student_name, u.email AS student_email,
                s.file_url, s.text_entry, s.submission_date, s.grade, s.feedback
         FROM submissions s
         JOIN users u ON s.student_id = u.id
         WHERE s.assignment_id = $1
         ORDER BY s.submission_date DESC",
    )
    .bind(assignment_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(submissions))
}

/// Retrieves the caller's own submission for an assignment, or JSON null.
/// Student only.
pub async fn my_submission(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions
         WHERE assignment_id = $1 AND student_id = $2"
    ))
    .bind(assignment_id)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?;

    Ok(Json(submission))
}

/// Records a grade and feedback on a submission.
/// Tutor/Admin only. Overwrites any earlier grade.
pub async fn grade_submission(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let feedback = payload.feedback.map(|f| strip_tags(&f));

    let submission = sqlx::query_as::<_, Submission>(&format!(
        "UPDATE submissions SET grade = $1, feedback = $2
         WHERE id = $3
         RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(payload.grade)
    .bind(&feedback)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    Ok(Json(submission))
}
