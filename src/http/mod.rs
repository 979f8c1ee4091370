//! HTTP surface.
//!
//! An axum router over the course, quiz and progress subsystems. Everything
//! except `/health` sits behind bearer authentication. Handlers push their
//! filesystem and SQLite work onto the blocking pool via [`blocking`].

pub mod auth;
pub mod error;
pub mod handlers;

use crate::core::config::Config;
use crate::core::error::CoursekitError;
use crate::core::store::FsDocumentStore;
use crate::core::time;
use crate::plugins::course::CourseRepository;
use crate::plugins::progress::ProgressRecorder;
use crate::plugins::quiz::QuizRepository;
use crate::subsystems;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};

/// Shared, immutable per-process state.
#[derive(Clone)]
pub struct AppState {
    pub courses: CourseRepository,
    pub quizzes: QuizRepository,
    pub progress: ProgressRecorder,
    /// Bearer token -> user id.
    pub tokens: Arc<HashMap<String, String>>,
}

impl AppState {
    /// Prepare the data directory and wire the repositories to it.
    pub fn from_config(config: &Config) -> Result<Self, CoursekitError> {
        let data_dir = &config.storage.data_dir;
        subsystems::initialize_all(data_dir)?;

        let store = Arc::new(FsDocumentStore::new(config.courses_dir()));
        Ok(Self {
            courses: CourseRepository::new(store.clone()),
            quizzes: QuizRepository::new(store),
            progress: ProgressRecorder::open(data_dir)?,
            tokens: Arc::new(config.token_map()),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let content = Router::new()
        .route(
            "/course",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route(
            "/course/:course",
            get(handlers::show_course)
                .put(handlers::update_course)
                .delete(handlers::destroy_course),
        )
        .route(
            "/course/:course/chapters/:chapter/quiz",
            get(handlers::show_quiz)
                .put(handlers::upsert_quiz)
                .delete(handlers::destroy_quiz),
        );

    // Course and quiz routes answer both bare and under `/api`.
    let protected = Router::new()
        .merge(content.clone())
        .nest("/api", content)
        .route("/progress/completion", post(handlers::record_completion))
        .route("/progress/results", post(handlers::record_results))
        .route("/dashboard", get(handlers::dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

/// Wrap each request in a span carrying a fresh request id.
async fn trace_request(request: Request, next: Next) -> Response {
    let span = info_span!(
        "request",
        id = %time::new_request_id(),
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );
        response
    }
    .instrument(span)
    .await
}

/// Run `f` on the blocking pool, keeping the caller's span.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, CoursekitError>
where
    F: FnOnce() -> Result<T, CoursekitError> + Send + 'static,
    T: Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(f))
        .await
        .map_err(|e| CoursekitError::TaskError(e.to_string()))?
}

/// Bind, serve until Ctrl-C, then drain in-flight requests.
pub async fn serve(config: &Config) -> Result<(), CoursekitError> {
    let state = AppState::from_config(config)?;
    if state.tokens.is_empty() {
        warn!("no auth tokens configured; every API route will answer 401");
    }

    let listener = TcpListener::bind(config.server.bind.as_str()).await?;
    let addr = listener.local_addr()?;
    info!(
        %addr,
        data_dir = %config.storage.data_dir.display(),
        "coursekit listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
