use thiserror::Error;

use crate::entities::EntityKind;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Network failure, timeout, 5xx or 429. Recovered through fallback data.
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// The provider answered but the payload did not have the expected shape.
    #[error("Provider {provider} returned malformed data: {reason}")]
    ProviderDataMalformed { provider: String, reason: String },

    /// No live or fallback data exists for this entity.
    #[error("Unresolvable {kind}: {id}")]
    UnresolvableEntity { kind: EntityKind, id: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Security error: {0}")]
    Security(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn unavailable(provider: impl Into<String>, reason: impl ToString) -> Self {
        EngineError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(provider: impl Into<String>, reason: impl ToString) -> Self {
        EngineError::ProviderDataMalformed {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unresolvable(kind: EntityKind, id: impl Into<String>) -> Self {
        EngineError::UnresolvableEntity { kind, id: id.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    /// Map a transport-level reqwest failure onto the provider taxonomy.
    ///
    /// Timeouts, connection errors and 5xx/429 statuses are availability
    /// problems; a body that fails to decode is a contract problem.
    pub fn from_http(provider: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::malformed(provider, err);
        }
        match err.status() {
            Some(status) if !(status.is_server_error() || status.as_u16() == 429) => {
                Self::malformed(provider, err)
            }
            _ => Self::unavailable(provider, err),
        }
    }

    /// Map a non-success HTTP status onto the provider taxonomy.
    pub fn from_status(provider: &str, status: reqwest::StatusCode) -> Self {
        if status.is_server_error() || status.as_u16() == 429 {
            Self::unavailable(provider, format!("HTTP {status}"))
        } else {
            Self::malformed(provider, format!("HTTP {status}"))
        }
    }

    /// True for errors that the fallback path is allowed to absorb.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::ProviderUnavailable { .. }
                | EngineError::ProviderDataMalformed { .. }
                | EngineError::UnresolvableEntity { .. }
                | EngineError::Security(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let e = EngineError::from_status("string", reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert!(matches!(e, EngineError::ProviderUnavailable { .. }));

        let e = EngineError::from_status("string", reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(e, EngineError::ProviderUnavailable { .. }));

        let e = EngineError::from_status("string", reqwest::StatusCode::BAD_REQUEST);
        assert!(matches!(e, EngineError::ProviderDataMalformed { .. }));
    }

    #[test]
    fn test_configuration_is_not_recoverable() {
        assert!(!EngineError::config("weights").is_recoverable());
        assert!(!EngineError::Cancelled.is_recoverable());
        assert!(EngineError::unavailable("kegg", "timeout").is_recoverable());
    }

    #[test]
    fn test_display_includes_provider() {
        let e = EngineError::malformed("uniprot", "missing results");
        assert_eq!(
            e.to_string(),
            "Provider uniprot returned malformed data: missing results"
        );
    }
}
