use thiserror::Error;
use uuid::Uuid;

pub type ContextResult<T> = Result<T, ContextError>;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Malformed config: {0}")]
    MalformedConfig(#[source] serde_json::Error),
    #[error("Malformed config: context #{index} has no name")]
    MissingName { index: usize },
    #[error("Malformed config: context '{0}' is defined more than once")]
    DuplicateName(String),
    #[error("Invalid host '{value}' for context '{name}': {source}")]
    InvalidHost {
        name: String,
        value: String,
        source: url::ParseError,
    },
    #[error("Invalid service id '{value}' in context '{name}': {source}")]
    InvalidServiceId {
        name: String,
        value: String,
        source: uuid::Error,
    },
    #[error("No current context selected")]
    NoCurrentContext,
    #[error("Service '{0}' not found in current context")]
    ServiceNotFound(Uuid),
    #[error("Context '{0}' not found")]
    UnknownContext(String),
    #[error("Context name cannot be empty")]
    EmptyName,
    #[error("Failed to encode config: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ContextError {
    /// True for every failure that means the file on disk cannot be loaded as-is.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedConfig(_) | Self::MissingName { .. } | Self::DuplicateName(_)
        )
    }
}
