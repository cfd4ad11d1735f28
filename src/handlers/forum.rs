// src/handlers/forum.rs

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
    models::forum_post::{CreatePostRequest, ForumPost, ForumPostResponse},
    utils::{jwt::Claims, sanitize::strip_tags},
};

/// Creates a forum post, optionally as a reply.
///
/// Content is reduced to plain text before storage. A reply's parent must
/// exist and belong to the same course.
pub async fn create_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let course = sqlx::query("SELECT id FROM courses WHERE id = $1")
        .bind(payload.course_id)
        .fetch_optional(&pool)
        .await?;

    if course.is_none() {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    if let Some(parent_id) = payload.parent_post_id {
        let parent = sqlx::query_as::<_, ForumPost>(
            "SELECT id, course_id, user_id, content, parent_post_id, created_at
             FROM forum_posts WHERE id = $1",
        )
        .bind(parent_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::BadRequest("Parent post not found".to_string()))?;

        if parent.course_id != payload.course_id {
            return Err(AppError::BadRequest(
                "Parent post belongs to a different course".to_string(),
            ));
        }
    }

    let content = strip_tags(&payload.content).trim().to_string();
    if content.is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }

    let post_id: i64 = sqlx::query_scalar(
        "INSERT INTO forum_posts (course_id, user_id, content, parent_post_id)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(payload.course_id)
    .bind(claims.user_id())
    .bind(&content)
    .bind(payload.parent_post_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create forum post: {:?}", e);
        AppError::from(e)
    })?;

    // Re-read with the author joined so the client can render immediately.
    let post = sqlx::query_as::<_, ForumPostResponse>(
        "SELECT p.id, p.course_id, p.user_id, u.name AS author_name,
                u.role AS author_role, p.content, p.parent_post_id, p.created_at
         FROM forum_posts p
         JOIN users u ON p.user_id = u.id
         WHERE p.id = $1",
    )
    .bind(post_id)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Lists a course's posts, newest first, with author name and role.
pub async fn list_posts(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let posts = sqlx::query_as::<_, ForumPostResponse>(
        "SELECT p.id, p.course_id, p.user_id, u.name AS author_name,
                u.role AS author_role, p.content, p.parent_post_id, p.created_at
         FROM forum_posts p
         JOIN users u ON p.user_id = u.id
         WHERE p.course_id = $1
         ORDER BY p.created_at DESC, p.id DESC",
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(posts))
}
