//! Portal session client.
//!
//! Drives the portal's multi-step credential-change protocol for one account
//! at a time: session clear, credential submit, token exchange, credential
//! change, logout. Every [`session::PortalSession`] owns an isolated cookie
//! store, so no session state can leak between accounts.

pub mod config;
pub mod error;
pub mod headers;
pub mod session;

pub use config::{PortalConfig, PortalEndpoints};
pub use error::{PortalError, PortalResult};
pub use session::{rotate_credential, PortalSession, SessionState};
