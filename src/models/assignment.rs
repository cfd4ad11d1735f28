// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'assignments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub instructions: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub max_points: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new assignment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    pub course_id: i64,

    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,

    #[validate(length(max = 10000))]
    pub instructions: Option<String>,

    pub deadline: chrono::DateTime<chrono::Utc>,

    #[validate(range(min = 0, message = "max_points must not be negative."))]
    pub max_points: Option<i32>,
}

/// Row shape for the student listing: assignment joined with the course
/// title and the student's own submission, if any.
#[derive(Debug, FromRow)]
pub struct StudentAssignmentRow {
    pub id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub title: String,
    pub instructions: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub max_points: i32,
    pub submission_date: Option<chrono::DateTime<chrono::Utc>>,
    pub grade: Option<i32>,
}

/// Derived status of the student's submission for one assignment.
#[derive(Debug, Serialize)]
pub struct SubmissionStatus {
    pub submission_date: chrono::DateTime<chrono::Utc>,
    pub grade: Option<i32>,
    /// True when the submission landed after the assignment deadline.
    pub is_late: bool,
}

/// DTO for the student's assignment list.
#[derive(Debug, Serialize)]
pub struct StudentAssignment {
    pub id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub title: String,
    pub instructions: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub max_points: i32,
    /// None when the student has not submitted yet.
    pub submission: Option<SubmissionStatus>,
}

impl StudentAssignment {
    pub fn from_row(row: StudentAssignmentRow) -> Self {
        let submission = row.submission_date.map(|date| SubmissionStatus {
            submission_date: date,
            grade: row.grade,
            is_late: date > row.deadline,
        });

        Self {
            id: row.id,
            course_id: row.course_id,
            course_title: row.course_title,
            title: row.title,
            instructions: row.instructions,
            deadline: row.deadline,
            max_points: row.max_points,
            submission,
        }
    }
}

/// DTO for the tutor's assignment list, with submission counts aggregated.
#[derive(Debug, Serialize, FromRow)]
pub struct TutorAssignment {
    pub id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub title: String,
    pub instructions: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub max_points: i32,
    pub total_submissions: i64,
    pub pending_grading: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn row(
        deadline: chrono::DateTime<chrono::Utc>,
        submitted: Option<chrono::DateTime<chrono::Utc>>,
    ) -> StudentAssignmentRow {
        StudentAssignmentRow {
            id: 1,
            course_id: 2,
            course_title: "Algebra".to_string(),
            title: "Homework 1".to_string(),
            instructions: String::new(),
            deadline,
            max_points: 100,
            submission_date: submitted,
            grade: None,
        }
    }

    #[test]
    fn submission_after_deadline_is_late() {
        let deadline = Utc::now();
        let sa = StudentAssignment::from_row(row(deadline, Some(deadline + Duration::hours(1))));
        assert!(sa.submission.unwrap().is_late);
    }

    #[test]
    fn submission_on_or_before_deadline_is_on_time() {
        let deadline = Utc::now();
        let on_time = StudentAssignment::from_row(row(deadline, Some(deadline)));
        assert!(!on_time.submission.unwrap().is_late);

        let early = StudentAssignment::from_row(row(deadline, Some(deadline - Duration::days(1))));
        assert!(!early.submission.unwrap().is_late);
    }

    #[test]
    fn missing_submission_yields_none() {
        let sa = StudentAssignment::from_row(row(Utc::now(), None));
        assert!(sa.submission.is_none());
    }
}
