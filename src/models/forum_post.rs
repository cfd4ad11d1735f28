// src/models/forum_post.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::user::Role;

/// Represents the 'forum_posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ForumPost {
    pub id: i64,
    pub course_id: i64,
    pub user_id: i64,
    /// Plain text; markup is stripped before storage.
    pub content: String,
    /// Set on replies; top-level posts have no parent.
    pub parent_post_id: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new forum post or reply.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub course_id: i64,

    #[validate(length(
        min = 1,
        max = 5000,
        message = "Content must be between 1 and 5000 characters"
    ))]
    pub content: String,

    /// Optional: the ID of the post being replied to.
    pub parent_post_id: Option<i64>,
}

/// DTO for displaying a post with author info.
#[derive(Debug, Serialize, FromRow)]
pub struct ForumPostResponse {
    pub id: i64,
    pub course_id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub author_role: Role,
    pub content: String,
    pub parent_post_id: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
