// src/handlers/session.rs

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use super::catalog::{fetch_exam, fetch_questions};
use crate::{
    error::AppError,
    models::{
        exam_result::ExamResult,
        question::PublicQuestion,
        session::{RecordAnswerRequest, SessionActionResponse, StartSessionResponse},
    },
    session::{DispatchStatus, ExamSession, SessionHandle},
    state::AppState,
    utils::jwt::Claims,
};

/// How long `submit` waits for the grade before answering without it.
const RESULT_WAIT: Duration = Duration::from_secs(2);

/// A session of the caller: still in memory, or already graded and swept.
enum OwnedSession {
    Live(SessionHandle),
    Recorded(ExamResult),
}

/// Looks up a session owned by the caller.
/// Sessions of other users are reported as missing.
async fn owned_session(
    state: &AppState,
    id: &Uuid,
    claims: &Claims,
) -> Result<OwnedSession, AppError> {
    let user_id = claims.user_id()?;
    if let Some(handle) = state
        .sessions
        .get(id)
        .filter(|handle| handle.user_id() == user_id)
    {
        return Ok(OwnedSession::Live(handle));
    }

    recorded_result(&state.pool, id, user_id)
        .await?
        .map(OwnedSession::Recorded)
        .ok_or(AppError::NotFound("Session not found".to_string()))
}

async fn recorded_result(
    pool: &SqlitePool,
    id: &Uuid,
    user_id: i64,
) -> Result<Option<ExamResult>, AppError> {
    let result: Option<ExamResult> =
        sqlx::query_as("SELECT * FROM exam_results WHERE session_id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(result)
}

/// Starts a timed session on an exam.
///
/// The countdown begins immediately, from the exam's duration.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let exam = fetch_exam(&state.pool, exam_id).await?;
    let questions = fetch_questions(&state.pool, exam_id).await?;

    if questions.is_empty() {
        return Err(AppError::BadRequest("Exam has no questions".to_string()));
    }

    let duration = u32::try_from(exam.duration_seconds)
        .map_err(|_| AppError::InternalServerError("Exam duration out of range".to_string()))?;
    let loaded = questions.iter().map(|q| (q.id, q.options.0.clone()));
    let session = ExamSession::new(exam.id, user_id, loaded, duration);
    let handle = SessionHandle::start(
        session,
        state.endpoint.clone(),
        state.config.tick_interval(),
    );
    let snapshot = handle.snapshot();
    state.sessions.insert(handle);

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session: snapshot,
            exam,
            questions: questions.into_iter().map(PublicQuestion::from).collect(),
        }),
    ))
}

/// Current state of a session: remaining seconds and recorded answers.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = match owned_session(&state, &id, &claims).await? {
        OwnedSession::Live(handle) => handle.snapshot(),
        OwnedSession::Recorded(result) => result.session_snapshot()?,
    };
    Ok(Json(snapshot))
}

/// Records the selected option for one question.
///
/// The option must be one of those offered for the question. After
/// submission the answer is not stored and `accepted` is false.
pub async fn record_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = match owned_session(&state, &id, &claims).await? {
        OwnedSession::Live(handle) => {
            let accepted = handle.record_answer(payload.question_id, payload.option)?;
            SessionActionResponse {
                accepted,
                session: handle.snapshot(),
                result: None,
            }
        }
        OwnedSession::Recorded(result) => SessionActionResponse {
            accepted: false,
            session: result.session_snapshot()?,
            result: None,
        },
    };

    Ok(Json(response))
}

/// Submits the session on the candidate's request.
///
/// The session is `Submitted` as soon as this returns. The grade is included
/// when the endpoint answers quickly enough, otherwise it is available from
/// `GET /api/sessions/{id}/result`.
pub async fn submit_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let response = match owned_session(&state, &id, &claims).await? {
        OwnedSession::Live(handle) => {
            let accepted = handle.submit();
            let result =
                match tokio::time::timeout(RESULT_WAIT, handle.wait_for_result()).await {
                    Ok(DispatchStatus::Delivered(result)) => Some(result),
                    _ => None,
                };
            SessionActionResponse {
                accepted,
                session: handle.snapshot(),
                result,
            }
        }
        OwnedSession::Recorded(result) => SessionActionResponse {
            accepted: false,
            session: result.session_snapshot()?,
            result: Some(result),
        },
    };

    Ok(Json(response))
}

/// Abandons a session. An unsubmitted session is discarded without a result.
pub async fn close_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if let OwnedSession::Live(_) = owned_session(&state, &id, &claims).await? {
        state.sessions.remove(&id);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// The graded result of a submitted session.
pub async fn get_session_result(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = recorded_result(&pool, &id, user_id)
        .await?
        .ok_or(AppError::NotFound("Result not available".to_string()))?;

    Ok(Json(result))
}
