use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("empty point list")]
    EmptyInput,
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("adjacency root must be an object keyed by marker value")]
    InvalidAdjacency,
    #[error("invalid map document: {0}")]
    InvalidDocument(String),
    #[error("{what} exceeds limit of {max}")]
    Limit { what: &'static str, max: usize },
    #[error("parameter '{0}' must be finite")]
    NonFinite(&'static str),
}

impl MapError {
    /// Stable machine-readable code for the JS result envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            MapError::EmptyInput => "empty_input",
            MapError::Json(_) => "parse_error",
            MapError::InvalidAdjacency => "invalid_adjacency",
            MapError::InvalidDocument(_) => "invalid_document",
            MapError::Limit { .. } => "limit_exceeded",
            MapError::NonFinite(_) => "non_finite",
        }
    }
}
