use thiserror::Error;

/// Failures of one detection round trip. None of them is fatal: each is shown
/// to the user and the next action starts from scratch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    /// The API could not be reached (refused, timed out, DNS, aborted body).
    #[error("Could not connect to the API: {0}")]
    Transport(String),
    /// The API answered with a status other than 200.
    #[error("Error from API: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

pub type DetectResult<T> = Result<T, DetectError>;
