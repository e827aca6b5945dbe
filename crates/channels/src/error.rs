use std::{error::Error as StdError, future::Future, time::Duration};

/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed relay errors shared across the pipeline and platform traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid relay input: {message}")]
    InvalidInput { message: String },

    /// The platform refused or could not serve the request.
    #[error("platform operation unavailable: {message}")]
    Unavailable { message: String },

    /// A platform call did not finish in time.
    #[error("{operation} timed out after {}s", after.as_secs_f32())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Wrapped source error from an external dependency.
    #[error("platform operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Reading or writing the subscription store failed.
    #[error(transparent)]
    Store(#[from] courier_store::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error came from the subscription store.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Run `fut`, failing with [`Error::Timeout`] once `after` elapses.
pub(crate) async fn with_timeout<T>(
    operation: &'static str,
    after: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout { operation, after }),
    }
}
