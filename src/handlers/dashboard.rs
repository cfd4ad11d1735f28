// src/handlers/dashboard.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::{error::AppError, models::user::Role, utils::jwt::Claims};

async fn count(pool: &PgPool, sql: &str, bind_user: Option<i64>) -> Result<i64, AppError> {
    let query = sqlx::query_scalar::<_, i64>(sql);
    let query = match bind_user {
        Some(id) => query.bind(id),
        None => query,
    };
    Ok(query.fetch_one(pool).await?)
}

/// Role-shaped dashboard statistics for the current user.
pub async fn get_dashboard(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let stats = match claims.role {
        Role::Admin => {
            let total_users = count(&pool, "SELECT COUNT(*) FROM users", None).await?;
            let total_courses = count(&pool, "SELECT COUNT(*) FROM courses", None).await?;
            let total_assignments = count(&pool, "SELECT COUNT(*) FROM assignments", None).await?;
            let total_submissions = count(&pool, "SELECT COUNT(*) FROM submissions", None).await?;

            json!({
                "title": "System Overview",
                "total_users": total_users,
                "total_courses": total_courses,
                "total_assignments": total_assignments,
                "total_submissions": total_submissions,
            })
        }
        Role::Tutor => {
            let my_courses = count(
                &pool,
                "SELECT COUNT(*) FROM courses WHERE tutor_id = $1",
                Some(user_id),
            )
            .await?;
            let total_students = count(
                &pool,
                "SELECT COUNT(*) FROM enrollments e
                 JOIN courses c ON e.course_id = c.id
                 WHERE c.tutor_id = $1",
                Some(user_id),
            )
            .await?;
            let pending_grading = count(
                &pool,
                "SELECT COUNT(*) FROM submissions s
                 JOIN assignments a ON s.assignment_id = a.id
                 JOIN courses c ON a.course_id = c.id
                 WHERE c.tutor_id = $1 AND s.grade IS NULL",
                Some(user_id),
            )
            .await?;

            json!({
                "title": "Instructor Dashboard",
                "my_courses": my_courses,
                "total_students": total_students,
                "pending_grading": pending_grading,
            })
        }
        Role::Student => {
            let enrolled_courses = count(
                &pool,
                "SELECT COUNT(*) FROM enrollments WHERE student_id = $1",
                Some(user_id),
            )
            .await?;
            let upcoming_assignments = count(
                &pool,
                "SELECT COUNT(*) FROM assignments a
                 JOIN enrollments e ON e.course_id = a.course_id
                 WHERE e.student_id = $1 AND a.deadline > NOW()",
                Some(user_id),
            )
            .await?;
            let completed_submissions = count(
                &pool,
                "SELECT COUNT(*) FROM submissions WHERE student_id = $1",
                Some(user_id),
            )
            .await?;

            json!({
                "title": "Student Dashboard",
                "enrolled_courses": enrolled_courses,
                "upcoming_assignments": upcoming_assignments,
                "completed_submissions": completed_submissions,
            })
        }
    };

    Ok(Json(stats))
}
