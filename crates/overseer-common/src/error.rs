//! Common error types used throughout overseer.
//!
//! Batch-level failures ([`Error::ProviderUnavailable`],
//! [`Error::IndexUnavailable`], [`Error::Cancelled`]) propagate to callers.
//! [`Error::ProbeFailure`] and [`Error::NotFound`] are normally absorbed by the
//! reconciliation engine and only surface from the collaborators themselves.

/// Common error type for overseer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The metadata provider could not serve a search, list or detail call.
    #[error("Metadata provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The local request store could not produce a request index.
    #[error("Request index unavailable: {0}")]
    IndexUnavailable(String),

    /// A media-server availability probe errored or timed out.
    #[error("Availability probe [{server}] failed: {message}")]
    ProbeFailure {
        /// The server kind whose probe failed (e.g. "plex").
        server: String,
        /// Human-readable error description.
        message: String,
    },

    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "movie", "request").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation was cancelled by its caller before completing.
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new ProviderUnavailable error.
    pub fn provider_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Create a new IndexUnavailable error.
    pub fn index_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::IndexUnavailable(msg.into())
    }

    /// Create a new ProbeFailure error.
    pub fn probe_failure<S: ToString, M: Into<String>>(server: S, msg: M) -> Self {
        Self::ProbeFailure {
            server: server.to_string(),
            message: msg.into(),
        }
    }

    /// Create a new NotFound error.
    pub fn not_found<E: Into<String>, I: ToString>(entity: E, id: I) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Reclassify a metadata collaborator failure as
    /// [`Error::ProviderUnavailable`], keeping cancellation and not-found
    /// outcomes intact.
    pub fn into_provider_failure(self) -> Self {
        match self {
            e @ (Self::ProviderUnavailable(_) | Self::NotFound { .. } | Self::Cancelled) => e,
            other => Self::ProviderUnavailable(other.to_string()),
        }
    }

    /// Reclassify a request store failure as [`Error::IndexUnavailable`].
    pub fn into_index_failure(self) -> Self {
        match self {
            e @ (Self::IndexUnavailable(_) | Self::Cancelled) => e,
            other => Self::IndexUnavailable(other.to_string()),
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::provider_unavailable("timeout");
        assert_eq!(err.to_string(), "Metadata provider unavailable: timeout");

        let err = Error::index_unavailable("locked");
        assert_eq!(err.to_string(), "Request index unavailable: locked");

        let err = Error::probe_failure("plex", "connection refused");
        assert_eq!(
            err.to_string(),
            "Availability probe [plex] failed: connection refused"
        );

        let err = Error::not_found("movie", 42);
        assert_eq!(err.to_string(), "movie not found: 42");

        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn provider_failure_reclassification() {
        let err = Error::database("disk full").into_provider_failure();
        assert!(matches!(err, Error::ProviderUnavailable(_)));

        assert!(Error::not_found("movie", 1)
            .into_provider_failure()
            .is_not_found());
        assert!(matches!(
            Error::Cancelled.into_provider_failure(),
            Error::Cancelled
        ));
    }

    #[test]
    fn index_failure_reclassification() {
        let err = Error::database("no such table").into_index_failure();
        match err {
            Error::IndexUnavailable(msg) => assert!(msg.contains("no such table")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
