// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{SqlitePool, types::Json as SqlJson};
use validator::Validate;

use super::catalog::fetch_exam;
use crate::{
    config::Config,
    error::{AppError, conflict_on_unique},
    models::{
        catalog::{CreateExamRequest, CreateSubjectRequest},
        question::CreateQuestionRequest,
    },
    session::SessionRegistry,
    utils::html::clean_html,
};

/// Creates a subject.
/// Admin only.
pub async fn create_subject(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = sqlx::query("INSERT INTO subjects (name, slug, description) VALUES (?, ?, ?)")
        .bind(&payload.name)
        .bind(&payload.slug)
        .bind(&payload.description)
        .execute(&pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Subject '{}' already exists", payload.slug)))?
        .last_insert_rowid();

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Creates an exam under a subject.
/// Admin only.
pub async fn create_exam(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let subject: Option<i64> = sqlx::query_scalar("SELECT id FROM subjects WHERE id = ?")
        .bind(payload.subject_id)
        .fetch_optional(&pool)
        .await?;
    if subject.is_none() {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    let duration = payload.duration_seconds.unwrap_or(config.exam_duration_seconds);

    let id = sqlx::query(
        "INSERT INTO exams (subject_id, title, duration_seconds, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(payload.subject_id)
    .bind(&payload.title)
    .bind(i64::from(duration))
    .bind(Utc::now())
    .execute(&pool)
    .await?
    .last_insert_rowid();

    tracing::info!("Exam {} created ({}s)", id, duration);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "duration_seconds": duration })),
    ))
}

/// Adds a question at the end of an exam.
/// Admin only.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if !payload.answer_is_an_option() {
        return Err(AppError::BadRequest(
            "Answer must be one of the options".to_string(),
        ));
    }
    fetch_exam(&pool, payload.exam_id).await?;

    // Answer goes through the same sanitizer as the options so they still match.
    let options: Vec<String> = payload.options.iter().map(|o| clean_html(o)).collect();
    let answer = clean_html(&payload.answer);
    let content = clean_html(&payload.content);
    let analysis = payload.analysis.as_deref().map(clean_html);

    let position: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM questions WHERE exam_id = ?")
            .bind(payload.exam_id)
            .fetch_one(&pool)
            .await?;

    let id = sqlx::query(
        r#"
        INSERT INTO questions (exam_id, content, options, answer, analysis, position)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.exam_id)
    .bind(content)
    .bind(SqlJson(options))
    .bind(answer)
    .bind(analysis)
    .bind(position)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .last_insert_rowid();

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Deletes a question.
/// Admin only. Refused while an ungraded session has the question loaded.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    State(sessions): State<SessionRegistry>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if sessions.holds_question(id) {
        return Err(AppError::Conflict(format!(
            "Question {} is part of a running session",
            id
        )));
    }

    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
