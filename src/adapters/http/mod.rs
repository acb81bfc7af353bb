pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use crate::adapters::http::state::HttpState;

/// Camera frames and photos routinely exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/detect", post(routes::detect))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
