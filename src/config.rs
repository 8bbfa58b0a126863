//! Client configuration
//!
//! [`ClientConfig`] carries the per-client knobs (timeouts, user agent) and the
//! [`Portal`] describing where the login flow and the tenant API live. The
//! defaults point at the production connectMLS portal; tests swap the URLs for a
//! local server.

use crate::errors::ConnectMlsError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Endpoints and literals of the vendor login flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portal {
    /// Entry page; answers with a redirect to the login form.
    pub login_url: String,
    pub credential_check_url: String,
    /// Redirect target the credential check answers with on a rejected login.
    pub login_failure_url: String,
    /// Pattern a cookie domain must match (from its start) to be the tenant API host.
    pub tenant_host_pattern: String,
    pub tenant_scheme: String,
    pub tenant_port: Option<u16>,
    /// Path on the tenant host that trades the exchange code for session cookies.
    pub sign_in_path: String,
    pub max_redirects: usize,
}

impl Default for Portal {
    fn default() -> Self {
        Portal {
            login_url: "https://connectmls.mredllc.com/slogin.jsp".to_string(),
            credential_check_url: "https://connectmls-api.mredllc.com/oid/j_spring_security_check"
                .to_string(),
            login_failure_url: "https://connectmls-api.mredllc.com/oid/login?error=failure"
                .to_string(),
            tenant_host_pattern: r"connectmls\d.mredllc.com".to_string(),
            tenant_scheme: "https".to_string(),
            tenant_port: None,
            sign_in_path: "/slogin.jsp".to_string(),
            max_redirects: 10,
        }
    }
}

impl Portal {
    /// Compile the tenant host pattern
    pub fn tenant_regex(&self) -> Result<Regex, ConnectMlsError> {
        Regex::new(&self.tenant_host_pattern).map_err(|e| {
            ConnectMlsError::RegexError(format!(
                "invalid tenant host pattern {:?}: {}",
                self.tenant_host_pattern, e
            ))
        })
    }

    /// Base URL of the tenant API for a host taken from the cookie jar
    pub fn tenant_base_url(&self, host: &str) -> String {
        match self.tenant_port {
            Some(port) => format!("{}://{}:{}", self.tenant_scheme, host, port),
            None => format!("{}://{}", self.tenant_scheme, host),
        }
    }
}

/// Settings shared by the authenticator and the API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub connect_timeout_secs: u64,
    /// Longest wait for a response, and for each read of a downloaded export
    /// body; a slow export that keeps sending data does not time out.
    pub read_timeout_secs: u64,
    pub user_agent: String,
    pub portal: Portal,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            portal: Portal::default(),
        }
    }
}

impl ClientConfig {
    /// Load a config from a JSON file; missing keys keep their defaults
    ///
    /// # Example
    /// ```no_run
    /// use connectmls_api::ClientConfig;
    /// let config = ClientConfig::from_file("connectmls.json").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConnectMlsError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_timeouts(mut self, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self.read_timeout_secs = read_timeout_secs;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}
