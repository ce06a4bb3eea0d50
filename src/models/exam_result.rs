// src/models/exam_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

use crate::{
    error::AppError,
    session::{AnswerMap, SessionSnapshot, SessionState, SubmitReason},
};

/// Represents the 'exam_results' table in the database.
/// One row per submitted session.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub session_id: String,
    pub user_id: i64,
    pub exam_id: i64,

    /// Number of correct answers.
    pub score: i64,
    pub total_questions: i64,

    /// Score on the ten-point scale.
    pub grade: f64,

    /// 'manual' or 'timeout'.
    pub reason: String,

    pub answers: Json<AnswerMap>,

    /// Seconds left on the clock at submission.
    pub remaining_seconds: i64,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

impl ExamResult {
    /// The final state of the session this result was recorded for.
    pub fn session_snapshot(&self) -> Result<SessionSnapshot, AppError> {
        let corrupt = |what: &str| {
            AppError::InternalServerError(format!("Result {} has an invalid {}", self.id, what))
        };

        let id = Uuid::parse_str(&self.session_id).map_err(|_| corrupt("session id"))?;
        let reason: SubmitReason = self.reason.parse().map_err(|_| corrupt("reason"))?;
        let remaining_seconds =
            u32::try_from(self.remaining_seconds).map_err(|_| corrupt("remaining time"))?;

        Ok(SessionSnapshot {
            id,
            exam_id: self.exam_id,
            state: SessionState::Submitted(reason),
            remaining_seconds,
            answers: self.answers.0.clone(),
            started_at: self.started_at,
            submitted_at: Some(self.submitted_at),
        })
    }
}

/// A row of the caller's result history.
#[derive(Debug, Serialize, FromRow)]
pub struct ResultHistoryEntry {
    pub id: i64,
    pub session_id: String,
    pub exam_id: i64,
    pub exam_title: String,
    pub score: i64,
    pub total_questions: i64,
    pub grade: f64,
    pub reason: String,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregated struct for displaying the leaderboard of one exam.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub username: String,
    pub best_grade: f64,
    pub attempts: i64,
}

#[cfg(test)]
impl ExamResult {
    /// A result as an endpoint would return it, without touching the database.
    pub fn fake_for(submission: &crate::session::Submission) -> Self {
        Self {
            id: 0,
            session_id: submission.session_id.to_string(),
            user_id: submission.user_id,
            exam_id: submission.exam_id,
            score: submission.answers.len() as i64,
            total_questions: submission.answers.len() as i64,
            grade: 10.0,
            reason: submission.reason.as_str().to_string(),
            answers: Json(submission.answers.clone()),
            remaining_seconds: i64::from(submission.remaining_seconds),
            started_at: submission.started_at,
            submitted_at: submission.submitted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ExamSession, Transition};

    #[test]
    fn snapshot_restores_the_final_session_state() {
        let options = vec!["A".to_string(), "B".to_string()];
        let mut session = ExamSession::new(5, 9, [(1, options)], 600);
        for _ in 0..40 {
            session.tick();
        }
        session.record_answer(1, "B").unwrap();
        let Transition::Submitted(submission) = session.manual_submit() else {
            panic!("session did not submit");
        };

        let snapshot = ExamResult::fake_for(&submission).session_snapshot().unwrap();

        assert_eq!(snapshot.id, session.id());
        assert_eq!(snapshot.exam_id, 5);
        assert_eq!(snapshot.state, SessionState::Submitted(SubmitReason::Manual));
        assert_eq!(snapshot.remaining_seconds, 560);
        assert_eq!(snapshot.answers.get(1), Some("B"));
        assert_eq!(snapshot.submitted_at, Some(submission.submitted_at));
    }

    #[test]
    fn unreadable_reason_is_an_internal_error() {
        let mut session = ExamSession::new(5, 9, [(1, vec!["A".to_string()])], 600);
        let Transition::Submitted(submission) = session.timeout() else {
            panic!("session did not submit");
        };
        let mut result = ExamResult::fake_for(&submission);
        result.reason = "paused".to_string();

        assert!(matches!(
            result.session_snapshot(),
            Err(AppError::InternalServerError(_))
        ));
    }
}
