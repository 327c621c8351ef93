use thiserror::Error;

#[derive(Error, Debug)]
/// Errors returned by the compute provider layer.
pub enum ComputeError {
    /// The addressed resource does not exist.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The API answered with a non-success status.
    #[error("compute API error ({status}) on {resource}: {message}")]
    Api {
        status: u16,
        resource: String,
        message: String,
    },

    /// An asynchronous operation finished with errors.
    #[error("operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComputeError {
    /// Returns `true` for [`ComputeError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type ComputeResult<T> = Result<T, ComputeError>;
