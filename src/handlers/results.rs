// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use super::catalog::fetch_exam;
use crate::{
    error::AppError,
    models::exam_result::{LeaderboardEntry, ResultHistoryEntry},
    utils::jwt::Claims,
};

/// The caller's submitted exams, newest first.
pub async fn my_results(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let history: Vec<ResultHistoryEntry> = sqlx::query_as(
        r#"
        SELECT
            r.id,
            r.session_id,
            r.exam_id,
            e.title AS exam_title,
            r.score,
            r.total_questions,
            r.grade,
            r.reason,
            r.submitted_at
        FROM exam_results r
        JOIN exams e ON e.id = r.exam_id
        WHERE r.user_id = ?
        ORDER BY r.submitted_at DESC, r.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch result history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(history))
}

/// Top 10 candidates of an exam by best grade.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_exam(&pool, exam_id).await?;

    let leaderboard: Vec<LeaderboardEntry> = sqlx::query_as(
        r#"
        SELECT
            u.username,
            MAX(r.grade) AS best_grade,
            COUNT(*) AS attempts
        FROM exam_results r
        JOIN users u ON u.id = r.user_id
        WHERE r.exam_id = ?
        GROUP BY r.user_id, u.username
        ORDER BY best_grade DESC, u.username
        LIMIT 10
        "#,
    )
    .bind(exam_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}
