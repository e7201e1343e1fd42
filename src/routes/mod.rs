pub mod applications;
pub mod auth;
pub mod candidate;
pub mod employer;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod profile;
pub mod saved_jobs;
pub mod users;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{utils::upload::PUBLIC_PREFIX, AppState};

/// Room for the largest upload (10 MB CV) plus multipart overhead.
const BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes(&state))
        .nest("/profile", profile::routes(&state))
        .nest("/candidate", candidate::routes(&state))
        .nest("/employer", employer::routes(&state))
        .nest("/jobs", jobs::routes(&state))
        .nest("/applications", applications::routes(&state))
        .nest("/saved-jobs", saved_jobs::routes(&state))
        .nest("/notifications", notifications::routes(&state))
        .nest("/users", users::routes(&state));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&state.config.uploads_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
