//! Portal target configuration.

use serde::Deserialize;

/// One portal deployment: the user-facing portal host and its identity
/// management host. Endpoint paths and the XSRF cookie name vary per
/// deployment and are configuration, not protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Portal hostname (e.g. `portal.example.com`), optionally with port.
    pub hostname: String,
    /// Identity-management hostname serving the token exchange.
    pub idm_hostname: String,
    /// URL scheme; production is always `https`.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Name of the session cookie carrying the XSRF token.
    #[serde(default = "default_xsrf_cookie")]
    pub xsrf_cookie: String,
    /// Endpoint paths.
    #[serde(default)]
    pub endpoints: PortalEndpoints,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_xsrf_cookie() -> String {
    "PORTAL-XSRF-TOKEN".to_string()
}

/// Paths of the five protocol endpoints plus the post-login landing page
/// used as the token-exchange redirect target.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalEndpoints {
    /// Unauthenticated GET that establishes a fresh session context.
    #[serde(default = "default_session_clear")]
    pub session_clear: String,
    /// Credential-submit POST; returns the short-lived session token.
    #[serde(default = "default_login")]
    pub login: String,
    /// Token-exchange GET on the identity-management host.
    #[serde(default = "default_token_exchange")]
    pub token_exchange: String,
    /// Authenticated landing page, passed as the exchange redirect target.
    #[serde(default = "default_landing")]
    pub landing: String,
    /// Credential-change POST.
    #[serde(default = "default_credential_change")]
    pub credential_change: String,
    /// Logout GET.
    #[serde(default = "default_logout")]
    pub logout: String,
}

impl Default for PortalEndpoints {
    fn default() -> Self {
        Self {
            session_clear: default_session_clear(),
            login: default_login(),
            token_exchange: default_token_exchange(),
            landing: default_landing(),
            credential_change: default_credential_change(),
            logout: default_logout(),
        }
    }
}

fn default_session_clear() -> String {
    "/portal/selfservice/users/loginClear/".to_string()
}

fn default_login() -> String {
    "/portal/login".to_string()
}

fn default_token_exchange() -> String {
    "/login/sessionCookieRedirect".to_string()
}

fn default_landing() -> String {
    "/myportal/".to_string()
}

fn default_credential_change() -> String {
    "/myportal/viewprofile/myprofile/credential".to_string()
}

fn default_logout() -> String {
    "/myportal/logout".to_string()
}

impl PortalConfig {
    /// Base URL of the portal host, no trailing slash.
    #[must_use]
    pub fn portal_base(&self) -> String {
        format!("{}://{}", self.scheme, self.hostname)
    }

    /// Full URL of a path on the portal host.
    #[must_use]
    pub fn portal_url(&self, path: &str) -> String {
        format!("{}{path}", self.portal_base())
    }

    /// Full URL of a path on the identity-management host.
    #[must_use]
    pub fn idm_url(&self, path: &str) -> String {
        format!("{}://{}{path}", self.scheme, self.idm_hostname)
    }
}
