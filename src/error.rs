use thiserror::Error;

/// Failures raised by the session core. Collaborator failures (store, config)
/// travel as `anyhow::Error` instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("word source has {available} words, {requested} requested")]
    EmptyWordSource { requested: usize, available: usize },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidConfiguration(msg.into())
    }

    pub fn test_not_found(id: &str) -> Self {
        CoreError::NotFound {
            kind: "test",
            id: id.to_string(),
        }
    }
}
