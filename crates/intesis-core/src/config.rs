// ── Runtime bridge configuration ──
//
// Describes *how* to reach the Intesis cloud: endpoint, OAuth2 client and
// user credentials, cache TTL. Never touches disk; `intesis-config` (or any
// other host) builds one and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use intesis_api::client::DEFAULT_BASE_URL;
use intesis_api::{GrantType, TokenRequest};

/// Default config cache lifetime (`configCacheSeconds`).
pub const DEFAULT_CONFIG_CACHE: Duration = Duration::from_secs(30);

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Cloud base URL; a trailing slash is added when missing.
    pub api_base_url: String,
    /// Grant used for the initial token exchange.
    pub grant_type: GrantType,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub username: String,
    pub password: SecretString,
    /// How long a fetched config snapshot is served without refetching.
    pub config_cache: Duration,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl BridgeConfig {
    /// Config with every option at its default except the user credentials.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_owned(),
            grant_type: GrantType::Password,
            client_id: None,
            client_secret: None,
            username: username.into(),
            password,
            config_cache: DEFAULT_CONFIG_CACHE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The initial grant request built from this config.
    pub fn initial_grant(&self) -> TokenRequest {
        TokenRequest::password(
            self.grant_type.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
            self.username.clone(),
            self.password.clone(),
        )
    }
}
