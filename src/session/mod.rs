// src/session/mod.rs

//! Timed exam sessions.
//!
//! A session counts down from the exam duration and ends in exactly one
//! submission, either when the candidate submits or when the clock runs out.

pub mod answers;
pub mod clock;
pub mod endpoint;
pub mod machine;
pub mod registry;
pub mod runner;

pub use answers::AnswerMap;
pub use clock::SessionClock;
pub use endpoint::{Submission, SubmissionEndpoint};
pub use machine::{ExamSession, SessionError, SessionSnapshot, SessionState, SubmitReason, Transition};
pub use registry::SessionRegistry;
pub use runner::{DispatchStatus, SessionHandle};
