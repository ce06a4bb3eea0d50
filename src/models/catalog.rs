// src/models/catalog.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::question::PublicQuestion;

/// Represents the 'subjects' table (Toán, Vật lý, Tiếng Anh, ...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,

    /// URL-friendly identifier, unique.
    pub slug: String,

    pub description: Option<String>,
}

/// Represents the 'exams' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub subject_id: i64,
    pub title: String,

    /// Length of one session, in seconds.
    pub duration_seconds: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// An exam together with its questions, answers hidden.
#[derive(Debug, Serialize)]
pub struct ExamDetail {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50), custom(function = validate_slug))]
    pub slug: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    pub subject_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Falls back to the configured default when absent.
    #[validate(range(min = 1, max = 21600))]
    pub duration_seconds: Option<u32>,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(validator::ValidationError::new("invalid_slug"));
    }
    Ok(())
}
