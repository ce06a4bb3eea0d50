// src/handlers/catalog.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        catalog::{Exam, ExamDetail, Subject},
        question::{PublicQuestion, Question},
    },
};

/// Lists all subjects, alphabetically.
pub async fn list_subjects(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects: Vec<Subject> =
        sqlx::query_as("SELECT id, name, slug, description FROM subjects ORDER BY name")
            .fetch_all(&pool)
            .await?;

    Ok(Json(subjects))
}

/// Lists the exams of one subject, newest first.
pub async fn list_exams(
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject: Option<i64> = sqlx::query_scalar("SELECT id FROM subjects WHERE id = ?")
        .bind(subject_id)
        .fetch_optional(&pool)
        .await?;
    if subject.is_none() {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    let exams: Vec<Exam> = sqlx::query_as(
        r#"
        SELECT id, subject_id, title, duration_seconds, created_at
        FROM exams
        WHERE subject_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(subject_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(exams))
}

/// Retrieves an exam with its questions, answers hidden.
pub async fn get_exam(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = fetch_exam(&pool, id).await?;
    let questions = fetch_questions(&pool, id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(ExamDetail { exam, questions }))
}

pub(crate) async fn fetch_exam(pool: &SqlitePool, id: i64) -> Result<Exam, AppError> {
    sqlx::query_as(
        "SELECT id, subject_id, title, duration_seconds, created_at FROM exams WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Exam not found".to_string()))
}

pub(crate) async fn fetch_questions(pool: &SqlitePool, exam_id: i64) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as(
        r#"
        SELECT id, exam_id, content, options, answer, analysis, position
        FROM questions
        WHERE exam_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions of exam {}: {:?}", exam_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(questions)
}
