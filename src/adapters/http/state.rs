use std::sync::Arc;
use crate::application::services::DetectionService;

/// Shared state for the dashboard handlers. Read-only: each request builds
/// its own image and presentation.
#[derive(Clone)]
pub struct HttpState {
    pub detection: Arc<DetectionService>,
}
