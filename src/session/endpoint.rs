// src/session/endpoint.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{answers::AnswerMap, machine::SubmitReason};
use crate::{error::AppError, models::exam_result::ExamResult};

/// Final answers of a session, produced exactly once when it ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub session_id: Uuid,
    pub exam_id: i64,
    pub user_id: i64,
    /// Questions loaded when the session started, ascending. Grading is
    /// limited to these.
    pub question_ids: Vec<i64>,
    pub answers: AnswerMap,
    pub reason: SubmitReason,
    pub remaining_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

/// Receives finished sessions, grades them and keeps the result.
///
/// Failures belong to the implementation: the session has already moved to
/// `Submitted` by the time `submit` runs and is never rolled back.
#[async_trait]
pub trait SubmissionEndpoint: Send + Sync + 'static {
    async fn submit(&self, submission: Submission) -> Result<ExamResult, AppError>;
}
