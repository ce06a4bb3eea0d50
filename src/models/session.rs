// src/models/session.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{catalog::Exam, exam_result::ExamResult, question::PublicQuestion};
use crate::session::SessionSnapshot;

/// Returned when a candidate starts an exam.
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session: SessionSnapshot,
    pub exam: Exam,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for selecting an option.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    pub question_id: i64,
    #[validate(length(min = 1, max = 500))]
    pub option: String,
}

/// Response to any action on a running session.
///
/// `accepted` is false when the session had already been submitted; the
/// action then had no effect.
#[derive(Debug, Serialize)]
pub struct SessionActionResponse {
    pub accepted: bool,
    pub session: SessionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExamResult>,
}
