//! HTTP surface of the service.

mod error;
mod handlers;
mod pages;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

pub use error::ApiError;
pub use handlers::{AutismResponse, QuestionnaireResponse};

use crate::state::AppState;

/// Builds the application router.
///
/// `max_upload_bytes` caps every request body, uploads included.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let mut router = Router::new();
    for page in pages::PAGES {
        router = router.route(page.path, get(move || async move { pages::render(page) }));
    }

    router
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/autism_result", post(handlers::autism_result))
        .route("/adhd_result_local", get(handlers::adhd_result_local))
        .route("/adhd_score", post(handlers::adhd_score))
        .route("/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
