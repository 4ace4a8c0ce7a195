//! Stage error types.

use crate::config::ConfigError;
use crate::path::PathError;

/// Errors that abort mounting the stage. None of them reach the page: the
/// browser entry logs them and leaves the container empty.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The host element is missing or has no layout yet.
    #[error("render container is missing or has no size")]
    MissingContainer,

    /// The browser refused a WebGL2 context.
    #[error("rendering context is not supported")]
    UnsupportedContext,

    /// A shader failed to compile or link.
    #[error("shader error: {0}")]
    Shader(String),

    /// A GPU-side object could not be created.
    #[error("failed to create {0}")]
    Resource(String),

    /// Window listeners could not be registered.
    #[error("failed to subscribe to window events: {0}")]
    Subscription(String),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
