// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, catalog, results, session},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: auth, subject/exam catalog, leaderboards.
/// * Student routes (Bearer token): exam sessions and result history.
/// * Admin routes (Bearer token, admin role): catalog and question management.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
        HeaderValue::from_static("http://localhost:5173"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let catalog_routes = Router::new()
        .route("/subjects", get(catalog::list_subjects))
        .route("/subjects/{id}/exams", get(catalog::list_exams))
        .route("/exams/{id}", get(catalog::get_exam))
        .route("/exams/{id}/leaderboard", get(results::get_leaderboard));

    let student_routes = Router::new()
        .route("/exams/{id}/sessions", post(session::start_session))
        .route(
            "/sessions/{id}",
            get(session::get_session).delete(session::close_session),
        )
        .route("/sessions/{id}/answers", put(session::record_answer))
        .route("/sessions/{id}/submit", post(session::submit_session))
        .route("/sessions/{id}/result", get(session::get_session_result))
        .route("/results/me", get(results::my_results))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/subjects", post(admin::create_subject))
        .route("/exams", post(admin::create_exam))
        .route("/questions", post(admin::create_question))
        .route("/questions/{id}", delete(admin::delete_question))
        // Auth runs first (outermost), then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", catalog_routes.merge(student_routes))
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
