//! Connection settings for a Cobbler server.

use std::fmt;

use serde::Deserialize;

use crate::error::ApiError;

pub const URL_VAR: &str = "COBBLER_URL";
pub const USERNAME_VAR: &str = "COBBLER_USERNAME";
pub const PASSWORD_VAR: &str = "COBBLER_PASSWORD";

/// Where the XML-RPC endpoint lives and which account to log in with.
///
/// `url` is the full endpoint, e.g. `http://cobbler.lan/cobbler_api`.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl ClientConfig {
    /// Read `COBBLER_URL`, `COBBLER_USERNAME` and `COBBLER_PASSWORD`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::Config(format!("{key} is not set")))
        };
        Ok(Self {
            url: require(URL_VAR)?,
            username: require(USERNAME_VAR)?,
            password: require(PASSWORD_VAR)?,
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
