// src/services/result_recorder.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{SqlitePool, types::Json};

use crate::{
    error::AppError,
    models::exam_result::ExamResult,
    scoring::calculate_score,
    session::{Submission, SubmissionEndpoint},
};

/// Helper struct for fetching answer keys from the database.
#[derive(sqlx::FromRow)]
struct AnswerKey {
    id: i64,
    answer: String,
}

/// Grades finished sessions against the stored answer key and persists the result.
#[derive(Clone)]
pub struct ResultRecorder {
    pool: SqlitePool,
}

impl ResultRecorder {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Answer key of the questions the session was started with. Questions
    /// added to the exam later are not part of it.
    async fn answer_key(
        &self,
        exam_id: i64,
        question_ids: &[i64],
    ) -> Result<HashMap<i64, String>, AppError> {
        let keys: Vec<AnswerKey> =
            sqlx::query_as("SELECT id, answer FROM questions WHERE exam_id = ?")
                .bind(exam_id)
                .fetch_all(&self.pool)
                .await?;

        let key: HashMap<i64, String> = keys
            .into_iter()
            .filter(|k| question_ids.binary_search(&k.id).is_ok())
            .map(|k| (k.id, k.answer))
            .collect();

        if key.len() != question_ids.len() {
            tracing::warn!(
                "Exam {}: {} of {} session questions have no answer key",
                exam_id,
                question_ids.len() - key.len(),
                question_ids.len()
            );
        }
        Ok(key)
    }
}

#[async_trait]
impl SubmissionEndpoint for ResultRecorder {
    async fn submit(&self, submission: Submission) -> Result<ExamResult, AppError> {
        let key = self
            .answer_key(submission.exam_id, &submission.question_ids)
            .await?;
        let summary = calculate_score(submission.answers.as_map(), &key);

        let session_id = submission.session_id.to_string();
        let reason = submission.reason.as_str();
        let answers = Json(submission.answers);
        let grade = summary.grade_10();

        let id = sqlx::query(
            r#"
            INSERT INTO exam_results
                (session_id, user_id, exam_id, score, total_questions, grade, reason, answers,
                 remaining_seconds, started_at, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session_id)
        .bind(submission.user_id)
        .bind(submission.exam_id)
        .bind(summary.score)
        .bind(summary.total_questions)
        .bind(grade)
        .bind(reason)
        .bind(&answers)
        .bind(i64::from(submission.remaining_seconds))
        .bind(submission.started_at)
        .bind(submission.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store result of session {}: {:?}", session_id, e);
            AppError::from(e)
        })?
        .last_insert_rowid();

        tracing::info!(
            "Session {} graded: {}/{} ({})",
            session_id,
            summary.score,
            summary.total_questions,
            grade
        );

        Ok(ExamResult {
            id,
            session_id,
            user_id: submission.user_id,
            exam_id: submission.exam_id,
            score: summary.score,
            total_questions: summary.total_questions,
            grade,
            reason: reason.to_string(),
            answers,
            remaining_seconds: i64::from(submission.remaining_seconds),
            started_at: submission.started_at,
            submitted_at: submission.submitted_at,
        })
    }
}
