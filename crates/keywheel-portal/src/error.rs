//! Portal protocol error types.

use thiserror::Error;

use crate::session::SessionState;

/// Errors raised while driving the portal credential-change protocol.
///
/// Any error aborts the session for that account; the account's stored
/// credential is only considered changed once the credential-change step
/// has returned success.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The per-account HTTP client could not be constructed.
    #[error("failed to build portal HTTP client: {0}")]
    ClientBuild(String),

    /// Transport-level failure on one protocol step.
    #[error("{step} request failed: {source}")]
    Http {
        step: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The portal answered a protocol step with a non-success status.
    #[error("{step} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        step: &'static str,
        status: u16,
        body: String,
    },

    /// Login succeeded at the HTTP level but the response carried no session
    /// token. The portal does this for locked accounts.
    #[error("no session token in login response; the account may be locked")]
    MissingSessionToken,

    /// The XSRF cookie was not present after token exchange, so the
    /// credential-change request cannot be authenticated.
    #[error("cookie {cookie:?} not found in session cookie store")]
    MissingXsrfToken { cookie: String },

    /// A protocol step was invoked out of order.
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
}

impl PortalError {
    /// Whether this error indicates an authentication problem with the
    /// account itself (bad or expired credential, locked account), as
    /// opposed to a portal or network fault.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::MissingSessionToken => true,
            Self::UnexpectedStatus { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

/// Result type for portal protocol operations.
pub type PortalResult<T> = Result<T, PortalError>;
