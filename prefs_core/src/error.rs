use thiserror::Error;

pub type PrefsResult<T, E = PrefsError> = std::result::Result<T, E>;

/// Errors surfaced by the preference facade, its backends and the typed accessors.
///
/// Every variant maps to a stable [`code`](PrefsError::code) so that callers
/// across a language boundary can match on it without parsing messages.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PrefsError {
    #[error("invalid key: keys must be non-empty")]
    InvalidKey,

    #[error("namespace '{namespace}' is unavailable: {reason}")]
    BackendUnavailable { namespace: String, reason: String },

    #[error("backend failure: {0:#}")]
    BackendFailure(#[source] anyhow::Error),

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrefsError {
    /// Wraps any storage-level error as a [`PrefsError::BackendFailure`].
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::BackendFailure(err.into())
    }

    pub fn unavailable(namespace: impl ToString, reason: impl ToString) -> Self {
        Self::BackendUnavailable {
            namespace: namespace.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey => "E_INVALID_KEY",
            Self::BackendUnavailable { .. } => "E_BACKEND_UNAVAILABLE",
            Self::BackendFailure(_) => "E_BACKEND_FAILURE",
            Self::Serialization(_) => "E_SERIALIZATION",
        }
    }
}

impl From<std::io::Error> for PrefsError {
    fn from(err: std::io::Error) -> Self {
        Self::BackendFailure(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(PrefsError::InvalidKey.code(), "E_INVALID_KEY");
        assert_eq!(
            PrefsError::unavailable("a/b", "bad name").code(),
            "E_BACKEND_UNAVAILABLE"
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(PrefsError::from(io).code(), "E_BACKEND_FAILURE");
        let json = serde_json::from_str::<u8>("nope").unwrap_err();
        assert_eq!(PrefsError::from(json).code(), "E_SERIALIZATION");
    }

    #[test]
    fn unavailable_message_names_namespace() {
        let err = PrefsError::unavailable("user_1", "disk full");
        assert_eq!(
            err.to_string(),
            "namespace 'user_1' is unavailable: disk full"
        );
    }
}
