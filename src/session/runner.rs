// src/session/runner.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle, time::Instant};
use uuid::Uuid;

use super::{
    endpoint::{Submission, SubmissionEndpoint},
    machine::{ExamSession, SessionError, SessionSnapshot, Transition},
};
use crate::models::exam_result::ExamResult;

/// Where the single submission of a session currently stands.
#[derive(Debug, Clone)]
pub enum DispatchStatus {
    /// The session is still running.
    NotSubmitted,
    /// Handed to the endpoint, no answer yet.
    Pending,
    Delivered(ExamResult),
    Failed(String),
}

impl DispatchStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, DispatchStatus::Delivered(_) | DispatchStatus::Failed(_))
    }
}

fn lock(session: &Mutex<ExamSession>) -> MutexGuard<'_, ExamSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sends a submission to the endpoint in the background and publishes the outcome.
struct Dispatcher {
    endpoint: Arc<dyn SubmissionEndpoint>,
    status: watch::Sender<DispatchStatus>,
}

impl Dispatcher {
    fn dispatch(self: &Arc<Self>, submission: Submission) {
        tracing::info!(
            "Session {} submitted ({}), {} answers",
            submission.session_id,
            submission.reason.as_str(),
            submission.answers.len()
        );
        self.status.send_replace(DispatchStatus::Pending);

        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let session_id = submission.session_id;
            let status = match dispatcher.endpoint.submit(submission).await {
                Ok(result) => DispatchStatus::Delivered(result),
                Err(e) => {
                    tracing::error!("Submission of session {} failed: {}", session_id, e);
                    DispatchStatus::Failed(e.to_string())
                }
            };
            dispatcher.status.send_replace(status);
        });
    }
}

struct SessionInner {
    id: Uuid,
    exam_id: i64,
    user_id: i64,
    session: Arc<Mutex<ExamSession>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    dispatcher: Arc<Dispatcher>,
    status: watch::Receiver<DispatchStatus>,
}

impl SessionInner {
    fn stop_ticker(&self) {
        let handle = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// A running exam session: the state machine plus its once-per-period tick source.
///
/// Cloning shares the same session. When the last clone is dropped the tick
/// source is cancelled, so an abandoned session stops counting down.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    /// Starts the countdown. Must be called inside a tokio runtime.
    pub fn start(
        session: ExamSession,
        endpoint: Arc<dyn SubmissionEndpoint>,
        period: Duration,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(DispatchStatus::NotSubmitted);
        let dispatcher = Arc::new(Dispatcher {
            endpoint,
            status: status_tx,
        });

        let id = session.id();
        let exam_id = session.exam_id();
        let user_id = session.user_id();
        tracing::info!(
            "Session {} started for user {} on exam {} ({}s)",
            id,
            user_id,
            exam_id,
            session.remaining_seconds()
        );

        let session = Arc::new(Mutex::new(session));
        let ticker = spawn_ticker(Arc::clone(&session), Arc::clone(&dispatcher), period);

        Self {
            inner: Arc::new(SessionInner {
                id,
                exam_id,
                user_id,
                session,
                ticker: Mutex::new(Some(ticker)),
                dispatcher,
                status: status_rx,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn exam_id(&self) -> i64 {
        self.inner.exam_id
    }

    pub fn user_id(&self) -> i64 {
        self.inner.user_id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.inner.session).snapshot()
    }

    pub fn is_submitted(&self) -> bool {
        lock(&self.inner.session).is_submitted()
    }

    /// Whether the question was loaded into this session.
    pub fn has_question(&self, question_id: i64) -> bool {
        lock(&self.inner.session).has_question(question_id)
    }

    /// Returns `Ok(false)` when the session was already submitted.
    pub fn record_answer(
        &self,
        question_id: i64,
        option: impl Into<String>,
    ) -> Result<bool, SessionError> {
        let transition = lock(&self.inner.session).record_answer(question_id, option)?;
        Ok(matches!(transition, Transition::Recorded))
    }

    /// Ends the session on the candidate's request.
    ///
    /// Returns `true` if this call produced the submission, `false` if the
    /// session had already ended.
    pub fn submit(&self) -> bool {
        let submission = {
            let mut session = lock(&self.inner.session);
            match session.manual_submit() {
                Transition::Submitted(submission) => {
                    // Cancelled while the lock is held: no tick can slip in between.
                    self.inner.stop_ticker();
                    submission
                }
                _ => {
                    tracing::debug!("Session {} already submitted", self.inner.id);
                    return false;
                }
            }
        };

        self.inner.dispatcher.dispatch(submission);
        true
    }

    /// Tears the session down without submitting.
    pub fn close(&self) {
        if !self.is_submitted() {
            tracing::info!("Session {} closed before submission", self.inner.id);
        }
        self.inner.stop_ticker();
    }

    pub fn dispatch_status(&self) -> DispatchStatus {
        self.inner.status.borrow().clone()
    }

    /// Waits until the endpoint has answered.
    ///
    /// Never resolves for a session that is closed without being submitted.
    pub async fn wait_for_result(&self) -> DispatchStatus {
        let mut rx = self.inner.status.clone();
        let status = match rx.wait_for(DispatchStatus::is_settled).await {
            Ok(status) => DispatchStatus::clone(&status),
            Err(_) => self.dispatch_status(),
        };
        status
    }
}

fn spawn_ticker(
    session: Arc<Mutex<ExamSession>>,
    dispatcher: Arc<Dispatcher>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);

        loop {
            interval.tick().await;

            let transition = lock(&session).tick();
            match transition {
                Transition::Ticked { .. } => continue,
                Transition::Submitted(submission) => {
                    dispatcher.dispatch(submission);
                    break;
                }
                _ => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, session::endpoint::Submission};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEndpoint {
        calls: AtomicUsize,
        last: Mutex<Option<Submission>>,
    }

    #[async_trait]
    impl SubmissionEndpoint for CountingEndpoint {
        async fn submit(&self, submission: Submission) -> Result<ExamResult, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = ExamResult::fake_for(&submission);
            *self.last.lock().unwrap() = Some(submission);
            Ok(result)
        }
    }

    struct FailingEndpoint;

    #[async_trait]
    impl SubmissionEndpoint for FailingEndpoint {
        async fn submit(&self, _submission: Submission) -> Result<ExamResult, AppError> {
            Err(AppError::InternalServerError("grading backend down".to_string()))
        }
    }

    fn start(duration: u32, endpoint: Arc<dyn SubmissionEndpoint>) -> SessionHandle {
        let options = || vec!["A".to_string(), "B".to_string(), "4".to_string()];
        let questions = [(1, options()), (2, options()), (3, options())];
        let session = ExamSession::new(1, 7, questions, duration);
        SessionHandle::start(session, endpoint, Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second() {
        let endpoint = Arc::new(CountingEndpoint::default());
        let handle = start(600, endpoint.clone());

        tokio::time::sleep(Duration::from_millis(10_500)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.remaining_seconds, 590);
        assert!(!handle.is_submitted());
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_dispatches_exactly_once() {
        let endpoint = Arc::new(CountingEndpoint::default());
        let handle = start(600, endpoint.clone());
        handle.record_answer(1, "4").unwrap();

        tokio::time::sleep(Duration::from_secs(605)).await;
        let status = handle.wait_for_result().await;

        assert!(matches!(status, DispatchStatus::Delivered(_)));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.snapshot().remaining_seconds, 0);

        let sent = endpoint.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.reason, crate::session::SubmitReason::Timeout);
        assert_eq!(sent.answers.get(1), Some("4"));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_cancels_the_countdown() {
        let endpoint = Arc::new(CountingEndpoint::default());
        let handle = start(600, endpoint.clone());

        tokio::time::sleep(Duration::from_millis(100_500)).await;
        assert!(handle.submit());
        assert!(!handle.submit());

        tokio::time::sleep(Duration::from_secs(1000)).await;
        handle.wait_for_result().await;

        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.snapshot().remaining_seconds, 500);
        let sent = endpoint.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.reason, crate::session::SubmitReason::Manual);
    }

    #[tokio::test(start_paused = true)]
    async fn answers_after_submission_are_ignored() {
        let endpoint = Arc::new(CountingEndpoint::default());
        let handle = start(600, endpoint.clone());

        assert_eq!(handle.record_answer(1, "A"), Ok(true));
        handle.submit();
        assert_eq!(handle.record_answer(2, "B"), Ok(false));

        handle.wait_for_result().await;
        let sent = endpoint.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.answers.len(), 1);
        assert_eq!(handle.snapshot().answers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_stops_ticks_without_submitting() {
        let endpoint = Arc::new(CountingEndpoint::default());
        let handle = start(5, endpoint.clone());

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.close();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(handle.snapshot().remaining_seconds, 3);
        assert!(!handle.is_submitted());
        assert!(matches!(handle.dispatch_status(), DispatchStatus::NotSubmitted));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_last_handle_stops_ticks() {
        let endpoint = Arc::new(CountingEndpoint::default());
        let handle = start(3, endpoint.clone());
        drop(handle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn endpoint_failure_keeps_session_submitted() {
        let handle = start(600, Arc::new(FailingEndpoint));
        handle.submit();

        let status = handle.wait_for_result().await;
        match status {
            DispatchStatus::Failed(msg) => assert!(msg.contains("grading backend down")),
            other => panic!("unexpected status: {:?}", other),
        }
        assert!(handle.is_submitted());
        assert!(!handle.submit());
    }
}
