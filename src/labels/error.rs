use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors raised while encoding or decoding label-scheme values.
pub enum LabelError {
    /// A disk-type URL did not start with the expected API base.
    #[error("invalid resource url '{url}': expected prefix '{expected_prefix}'")]
    InvalidResourceUrl {
        /// The URL that was rejected.
        url: String,
        /// The API base it was checked against.
        expected_prefix: String,
    },
}

pub type LabelResult<T> = Result<T, LabelError>;
