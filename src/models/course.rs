// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Kind of a course material entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaterialKind {
    #[serde(rename = "PDF")]
    Pdf,
    Video,
    Link,
}

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

/// A single material entry, stored inside the course's JSONB array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub url: String,
    #[serde(default = "now")]
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tutor_id: i64,

    /// Material entries are appended over time, never replaced wholesale.
    pub materials: Json<Vec<Material>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for course listings, with the owning tutor joined in.
#[derive(Debug, Serialize, FromRow)]
pub struct CourseWithTutor {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tutor_id: i64,
    pub tutor_name: String,
    pub tutor_email: String,
    pub materials: Json<Vec<Material>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required."))]
    pub description: String,
}

/// DTO for updating a course. Materials are appended to the existing list.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,

    pub materials: Option<Vec<Material>>,
}
