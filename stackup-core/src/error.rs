use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackupError {
    #[error("Cannot access project root directory: {path}")]
    DirectoryAccess { path: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to spawn service '{service}': {reason}")]
    Spawn { service: String, reason: String },

    #[error("Service '{service}' did not become ready at {endpoint}")]
    ReadinessTimeout { service: String, endpoint: String },

    #[error("State file error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StackupError>;
