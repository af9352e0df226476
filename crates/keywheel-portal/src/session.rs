//! Per-account portal session state machine.
//!
//! A [`PortalSession`] walks one account through the portal's
//! credential-change protocol:
//!
//! ```text
//! Unauthenticated -> SessionCleared -> Authenticated -> CredentialChanged -> LoggedOut
//!                \______________________|________________|
//!                                    Aborted
//! ```
//!
//! Every session owns its own HTTP client and cookie store, created at
//! construction and dropped with the session. Cookies therefore cannot leak
//! between accounts, which is what makes per-account failure isolation safe.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ORIGIN, REFERER};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use crate::headers;

/// Request header carrying the XSRF token on the credential-change call.
const XSRF_HEADER: &str = "portal-xsrf-token";

/// Protocol states of a portal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh session, no requests issued yet.
    Unauthenticated,
    /// Fresh session context established on the portal host.
    SessionCleared,
    /// Credential accepted and session token exchanged for session cookies.
    Authenticated,
    /// The portal has applied the credential change.
    CredentialChanged,
    /// Session terminated; the change (if any) is authoritative.
    LoggedOut,
    /// A step failed; the account's credential is unchanged unless the
    /// session already reached `CredentialChanged`.
    Aborted,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::SessionCleared => "session-cleared",
            Self::Authenticated => "authenticated",
            Self::CredentialChanged => "credential-changed",
            Self::LoggedOut => "logged-out",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    options: LoginOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginOptions {
    warn_before_password_expired: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    session_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeCredentialRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

/// One account's session against one portal deployment.
pub struct PortalSession {
    client: reqwest::Client,
    jar: Arc<Jar>,
    config: PortalConfig,
    username: String,
    state: SessionState,
}

impl PortalSession {
    /// Create a session with a fresh, isolated cookie store.
    pub fn new(config: &PortalConfig, username: &str) -> PortalResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers::browser_profile())
            .build()
            .map_err(|e| PortalError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            jar,
            config: config.clone(),
            username: username.to_string(),
            state: SessionState::Unauthenticated,
        })
    }

    /// Current protocol state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `Unauthenticated -> SessionCleared`: issue the unauthenticated request
    /// that establishes a fresh session context on the portal host.
    pub async fn clear_session(&mut self) -> PortalResult<()> {
        self.guard(SessionState::Unauthenticated, SessionState::SessionCleared)?;
        let result = self.do_clear_session().await;
        self.advance(SessionState::SessionCleared, result)
    }

    /// `SessionCleared -> Authenticated`: submit the credential, then
    /// exchange the returned session token for the authenticated session's
    /// cookies (the XSRF token among them).
    pub async fn authenticate(&mut self, password: &str) -> PortalResult<()> {
        self.guard(SessionState::SessionCleared, SessionState::Authenticated)?;
        let result = self.do_authenticate(password).await;
        self.advance(SessionState::Authenticated, result)
    }

    /// `Authenticated -> CredentialChanged`: submit the old and new
    /// credential with the XSRF token echoed from the cookie store.
    pub async fn change_credential(&mut self, old: &str, new: &str) -> PortalResult<()> {
        self.guard(SessionState::Authenticated, SessionState::CredentialChanged)?;
        let result = self.do_change_credential(old, new).await;
        self.advance(SessionState::CredentialChanged, result)
    }

    /// `CredentialChanged -> LoggedOut`: terminate the remote session.
    ///
    /// A logout failure is logged and swallowed: the credential change has
    /// already succeeded and is authoritative, and the local session context
    /// is discarded with this value either way.
    pub async fn logout(&mut self) {
        if self.state != SessionState::CredentialChanged {
            warn!(
                username = %self.username,
                state = %self.state,
                "skipping logout: session is not in credential-changed state"
            );
            return;
        }
        if let Err(e) = self.do_logout().await {
            warn!(
                username = %self.username,
                error = %e,
                "portal logout failed; session context discarded locally"
            );
        }
        self.state = SessionState::LoggedOut;
    }

    fn guard(&self, expected: SessionState, to: SessionState) -> PortalResult<()> {
        if self.state != expected {
            return Err(PortalError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: SessionState, result: PortalResult<()>) -> PortalResult<()> {
        match result {
            Ok(()) => {
                debug!(username = %self.username, state = %next, "portal session advanced");
                self.state = next;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Aborted;
                Err(e)
            }
        }
    }

    async fn do_clear_session(&self) -> PortalResult<()> {
        let url = self
            .config
            .portal_url(&self.config.endpoints.session_clear);
        let response = self
            .client
            .get(&url)
            .headers(headers::xhr_fetch_metadata())
            .header("pragma", "no-cache")
            .header(REFERER, self.config.portal_base())
            .send()
            .await
            .map_err(|source| PortalError::Http {
                step: "session-clear",
                source,
            })?;
        ensure_success("session-clear", response).await?;
        Ok(())
    }

    async fn do_authenticate(&self, password: &str) -> PortalResult<()> {
        // Credential submit: the response body carries a short-lived session
        // token, not cookies.
        let login_url = self.config.portal_url(&self.config.endpoints.login);
        let body = LoginRequest {
            username: &self.username,
            password,
            options: LoginOptions {
                warn_before_password_expired: true,
            },
        };
        let response = self
            .client
            .post(&login_url)
            .headers(headers::xhr_fetch_metadata())
            .header("pragma", "no-cache")
            .header(REFERER, self.config.portal_url("/portal/"))
            .header(ORIGIN, self.config.portal_base())
            .json(&body)
            .send()
            .await
            .map_err(|source| PortalError::Http {
                step: "credential-submit",
                source,
            })?;
        let response = ensure_success("credential-submit", response).await?;
        let login: LoginResponse =
            response
                .json()
                .await
                .map_err(|source| PortalError::Http {
                    step: "credential-submit",
                    source,
                })?;
        let token = match login.session_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(PortalError::MissingSessionToken),
        };

        // Token exchange: a redirect-style GET against the identity
        // management host that sets the authenticated session's cookies.
        let exchange_url = self.config.idm_url(&self.config.endpoints.token_exchange);
        let redirect_url = self.config.portal_url(&self.config.endpoints.landing);
        let response = self
            .client
            .get(&exchange_url)
            .headers(headers::navigation_fetch_metadata())
            .header(REFERER, self.config.portal_base())
            .header(ORIGIN, self.config.portal_base())
            .query(&[("token", token.as_str()), ("redirectUrl", redirect_url.as_str())])
            .send()
            .await
            .map_err(|source| PortalError::Http {
                step: "token-exchange",
                source,
            })?;
        ensure_success("token-exchange", response).await?;
        Ok(())
    }

    async fn do_change_credential(&self, old: &str, new: &str) -> PortalResult<()> {
        let xsrf = self.xsrf_token()?;
        let url = self
            .config
            .portal_url(&self.config.endpoints.credential_change);
        let body = ChangeCredentialRequest {
            old_password: old,
            new_password: new,
        };
        let response = self
            .client
            .post(&url)
            .headers(headers::xhr_fetch_metadata())
            .header(REFERER, self.config.portal_url("/myportal/view-profile"))
            .header(ORIGIN, self.config.portal_base())
            .header("xhr_request", "true")
            .header("observe", "response")
            .header(XSRF_HEADER, xsrf)
            .json(&body)
            .send()
            .await
            .map_err(|source| PortalError::Http {
                step: "credential-change",
                source,
            })?;
        ensure_success("credential-change", response).await?;
        Ok(())
    }

    async fn do_logout(&self) -> PortalResult<()> {
        let url = self.config.portal_url(&self.config.endpoints.logout);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| PortalError::Http {
                step: "logout",
                source,
            })?;
        ensure_success("logout", response).await?;
        Ok(())
    }

    /// Read the XSRF token out of this session's cookie store.
    fn xsrf_token(&self) -> PortalResult<String> {
        let missing = || PortalError::MissingXsrfToken {
            cookie: self.config.xsrf_cookie.clone(),
        };
        let base = Url::parse(&self.config.portal_url("/")).map_err(|_| missing())?;
        let header = self.jar.cookies(&base).ok_or_else(missing)?;
        let raw = header.to_str().map_err(|_| missing())?;
        raw.split("; ")
            .find_map(|pair| {
                pair.split_once('=')
                    .filter(|(name, _)| *name == self.config.xsrf_cookie)
                    .map(|(_, value)| value.to_string())
            })
            .ok_or_else(missing)
    }
}

/// Map a non-success response to [`PortalError::UnexpectedStatus`], keeping
/// the response body for the log line.
async fn ensure_success(
    step: &'static str,
    response: reqwest::Response,
) -> PortalResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PortalError::UnexpectedStatus {
        step,
        status: status.as_u16(),
        body,
    })
}

/// Drive a full rotation for one account: clear session, authenticate with
/// the current credential, change to the new credential, log out.
///
/// Any error before the credential-change step completes means the remote
/// credential is unchanged; the caller must not update its records.
pub async fn rotate_credential(
    config: &PortalConfig,
    username: &str,
    old: &str,
    new: &str,
) -> PortalResult<()> {
    let mut session = PortalSession::new(config, username)?;
    session.clear_session().await?;
    session.authenticate(old).await?;
    session.change_credential(old, new).await?;
    session.logout().await;
    Ok(())
}
