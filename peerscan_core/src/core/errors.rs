use thiserror::Error;

use super::Grant;

#[derive(Error, Debug)]
pub enum PeerscanError {
    #[error("No tokio runtime available")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("Radio Error: {source}")]
    Radio {
        #[from]
        source: RadioError,
    },
    #[error("{0} was dropped without a response")]
    Abandoned(&'static str),
    #[cfg(feature = "bluez")]
    #[error("Bluetooth Error: {source}")]
    Bluetooth {
        #[from]
        source: bluer::Error,
    },
}
pub type PeerscanResult<T> = Result<T, PeerscanError>;

/// Reported synchronously by a radio provider that cannot begin scanning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("scanner unavailable: {0}")]
    Unsupported(String),
    #[error("scan failed to start: {0}")]
    Failed(String),
}

/// The one user-facing failure a session can surface at a time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Missing permissions: {}", grant_names(.0))]
    MissingGrants(Vec<Grant>),
    #[error("Device doesn't support Bluetooth")]
    RadioUnsupported,
    #[error("Bluetooth is not enabled")]
    RadioDisabled,
    #[error("Bluetooth was not enabled")]
    RadioEnableDeclined,
    #[error("Something went wrong: {0}")]
    Internal(String),
}
impl SessionError {
    /// Unsupported hardware is the only condition a new request cannot fix.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SessionError::RadioUnsupported)
    }
    pub fn missing_grant_names(&self) -> Vec<&'static str> {
        match self {
            SessionError::MissingGrants(grants) => grants.iter().map(|g| g.name()).collect(),
            _ => Vec::new(),
        }
    }
}
fn grant_names(grants: &[Grant]) -> String {
    grants
        .iter()
        .map(|g| g.name())
        .collect::<Vec<_>>()
        .join(", ")
}
impl From<PeerscanError> for SessionError {
    fn from(value: PeerscanError) -> Self {
        match value {
            PeerscanError::Radio {
                source: RadioError::Unsupported(_),
            } => SessionError::RadioUnsupported,
            other => SessionError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_grants_message() {
        let err = SessionError::MissingGrants(vec![Grant::Scan, Grant::Connect]);
        assert_eq!(err.to_string(), "Missing permissions: SCAN, CONNECT");
        assert_eq!(err.missing_grant_names(), vec!["SCAN", "CONNECT"]);
        assert!(err.is_retryable());
    }
    #[test]
    fn test_radio_errors_convert() {
        let unsupported: SessionError =
            PeerscanError::from(RadioError::Unsupported("no adapter".into())).into();
        assert_eq!(unsupported, SessionError::RadioUnsupported);
        assert!(!unsupported.is_retryable());
        let failed: SessionError =
            PeerscanError::from(RadioError::Failed("busy".into())).into();
        assert_eq!(
            failed,
            SessionError::Internal("Radio Error: scan failed to start: busy".into())
        );
    }
}
