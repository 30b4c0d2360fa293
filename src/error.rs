//! Startup error types.
//!
//! Anything that goes wrong before the server is listening ends the process.
//! Errors are classified so `main` can tell the operator what to do:
//! - RequiresUserAction: credentials, consent, config
//! - DataError: the sheet contents can't be normalized
//! - Environment: the port or runtime failed

use thiserror::Error;

use crate::google_api::GoogleApiError;
use crate::table::NormalizeError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Google authentication failed: {0}")]
    Auth(#[from] GoogleApiError),

    #[error("O2D sheet data is malformed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Failed to bind dashboard to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Dashboard server error: {0}")]
    Server(std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RequiresUserAction,
    DataError,
    Environment,
}

impl StartupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StartupError::Config(_) | StartupError::Auth(_) => ErrorKind::RequiresUserAction,
            StartupError::Normalize(_) => ErrorKind::DataError,
            StartupError::Bind { .. } | StartupError::Server(_) => ErrorKind::Environment,
        }
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            StartupError::Config(_) => "Check o2d.json (or the file named by O2D_CONFIG).",
            StartupError::Auth(GoogleApiError::CredentialsNotFound(_)) => {
                "Download the OAuth client secret from Google Cloud Console and save it as credentials.json."
            }
            StartupError::Auth(GoogleApiError::AuthExpired) => {
                "The saved token was revoked. Delete token.json and restart to sign in again."
            }
            StartupError::Auth(GoogleApiError::Json(_)) => {
                "token.json is unreadable. Delete it and restart to sign in again."
            }
            StartupError::Auth(GoogleApiError::FlowCancelled) => {
                "Sign-in was cancelled. Restart and approve access in the browser."
            }
            StartupError::Auth(_) => "Check your internet connection and restart.",
            StartupError::Normalize(_) => {
                "Fix the reported row in the O2D sheet (dates as DD/MM/YYYY, whole-number Qty)."
            }
            StartupError::Bind { .. } => "Another process holds the port. Change 'port' in o2d.json.",
            StartupError::Server(_) => "Restart the dashboard.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            StartupError::Config("bad".into()).kind(),
            ErrorKind::RequiresUserAction
        );
        assert_eq!(
            StartupError::from(GoogleApiError::AuthExpired).kind(),
            ErrorKind::RequiresUserAction
        );
        assert_eq!(
            StartupError::from(NormalizeError::MissingColumn("Qty")).kind(),
            ErrorKind::DataError
        );
        let bind = StartupError::Bind {
            addr: "127.0.0.1:8021".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert_eq!(bind.kind(), ErrorKind::Environment);
        assert!(bind.to_string().contains("127.0.0.1:8021"));
    }

    #[test]
    fn test_recovery_suggestion_for_revoked_token() {
        let err = StartupError::from(GoogleApiError::AuthExpired);
        assert!(err.recovery_suggestion().contains("token.json"));
    }
}
