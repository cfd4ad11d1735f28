// src/models/enrollment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of enrollment states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

/// Represents the 'enrollments' table in the database.
/// One row per (student, course) pair, enforced by a unique constraint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub status: EnrollmentStatus,
    pub enrolled_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for enrolling into a course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub course_id: i64,
}

/// DTO for the current student's enrollment list, with course data joined.
#[derive(Debug, Serialize, FromRow)]
pub struct EnrollmentWithCourse {
    pub id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub course_description: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: Option<chrono::DateTime<chrono::Utc>>,
}
