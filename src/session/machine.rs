// src/session/machine.rs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{answers::AnswerMap, clock::SessionClock, endpoint::Submission};

/// What ended an exam session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    Timeout,
}

impl SubmitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitReason::Manual => "manual",
            SubmitReason::Timeout => "timeout",
        }
    }
}

impl FromStr for SubmitReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SubmitReason::Manual),
            "timeout" => Ok(SubmitReason::Timeout),
            other => Err(format!("Unknown submit reason '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Submitted(SubmitReason),
}

/// Outcome of applying one event to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A second elapsed and the session is still running.
    Ticked { remaining: u32 },
    /// An answer was stored.
    Recorded,
    /// The session ended; the payload must be handed to the submission endpoint.
    Submitted(Submission),
    /// The event arrived after submission and had no effect.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The question is not part of the exam loaded for this session.
    InvalidQuestionReference(i64),
    /// The option is not one of those offered for the question.
    OptionNotOffered { question_id: i64, option: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidQuestionReference(id) => {
                write!(f, "Question {} is not part of this exam", id)
            }
            SessionError::OptionNotOffered { question_id, option } => {
                write!(f, "'{}' is not an option of question {}", option, question_id)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Serializable view of a session for the countdown UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub exam_id: i64,
    pub state: SessionState,
    pub remaining_seconds: u32,
    pub answers: AnswerMap,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// One timed attempt by a candidate at an exam.
///
/// Every transition checks the state first: once `Submitted` is reached no
/// event mutates the clock or the answers again, and no second `Submission`
/// is ever produced.
#[derive(Debug)]
pub struct ExamSession {
    id: Uuid,
    exam_id: i64,
    user_id: i64,
    /// Offered options per question, fixed when the session starts.
    questions: HashMap<i64, Vec<String>>,
    clock: SessionClock,
    answers: AnswerMap,
    state: SessionState,
    started_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    pub fn new(
        exam_id: i64,
        user_id: i64,
        questions: impl IntoIterator<Item = (i64, Vec<String>)>,
        duration_seconds: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            exam_id,
            user_id,
            questions: questions.into_iter().collect(),
            clock: SessionClock::new(duration_seconds),
            answers: AnswerMap::new(),
            state: SessionState::Active,
            started_at: Utc::now(),
            submitted_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exam_id(&self) -> i64 {
        self.exam_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, SessionState::Submitted(_))
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.clock.remaining()
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn has_question(&self, question_id: i64) -> bool {
        self.questions.contains_key(&question_id)
    }

    /// One second elapsed.
    ///
    /// The timeout is evaluated before the clock could drop below zero: the
    /// tick that takes the clock to zero also submits.
    pub fn tick(&mut self) -> Transition {
        if self.is_submitted() {
            return Transition::Ignored;
        }
        if self.clock.is_exhausted() {
            return self.timeout();
        }

        let remaining = self.clock.decrement();
        if remaining == 0 {
            return self.timeout();
        }
        Transition::Ticked { remaining }
    }

    pub fn timeout(&mut self) -> Transition {
        self.submit(SubmitReason::Timeout)
    }

    pub fn manual_submit(&mut self) -> Transition {
        self.submit(SubmitReason::Manual)
    }

    pub fn record_answer(
        &mut self,
        question_id: i64,
        option: impl Into<String>,
    ) -> Result<Transition, SessionError> {
        if self.is_submitted() {
            return Ok(Transition::Ignored);
        }
        let Some(offered) = self.questions.get(&question_id) else {
            return Err(SessionError::InvalidQuestionReference(question_id));
        };
        let option = option.into();
        if !offered.contains(&option) {
            return Err(SessionError::OptionNotOffered {
                question_id,
                option,
            });
        }

        self.answers.set(question_id, option);
        Ok(Transition::Recorded)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            exam_id: self.exam_id,
            state: self.state,
            remaining_seconds: self.clock.remaining(),
            answers: self.answers.clone(),
            started_at: self.started_at,
            submitted_at: self.submitted_at,
        }
    }

    fn submit(&mut self, reason: SubmitReason) -> Transition {
        if self.is_submitted() {
            return Transition::Ignored;
        }

        let now = Utc::now();
        self.state = SessionState::Submitted(reason);
        self.submitted_at = Some(now);

        let mut question_ids: Vec<i64> = self.questions.keys().copied().collect();
        question_ids.sort_unstable();

        Transition::Submitted(Submission {
            session_id: self.id,
            exam_id: self.exam_id,
            user_id: self.user_id,
            question_ids,
            answers: self.answers.clone(),
            reason,
            remaining_seconds: self.clock.remaining(),
            started_at: self.started_at,
            submitted_at: now,
        })
    }
}
