// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'submissions' table in the database.
/// At most one row exists per (assignment, student); resubmission
/// overwrites file/text/date in place.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub file_url: Option<String>,
    pub text_entry: Option<String>,
    pub submission_date: chrono::DateTime<chrono::Utc>,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
}

/// DTO for grading a submission.
///
/// The grade is validated non-negative but deliberately NOT clamped to the
/// assignment's max_points; the maximum is a UI hint only.
#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    #[validate(range(min = 0, message = "Grade must not be negative."))]
    pub grade: i32,

    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}

/// DTO for the tutor's per-assignment submission list.
#[derive(Debug, Serialize, FromRow)]
pub struct SubmissionWithStudent {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub file_url: Option<String>,
    pub text_entry: Option<String>,
    pub submission_date: chrono::DateTime<chrono::Utc>,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
}
