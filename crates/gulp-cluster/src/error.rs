use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("invalid member url '{url}': {reason}")]
    InvalidMember { url: String, reason: String },

    #[error("invalid registry path '{0}'")]
    InvalidPath(String),

    #[error("registry value encoding error: {0}")]
    Encode(String),

    #[error("registry error: {0}")]
    State(#[from] gulp_state::StateError),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
