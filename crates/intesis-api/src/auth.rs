// OAuth2 token grants
//
// Request/response types for `POST oauth2/token`. The endpoint takes a
// form-encoded grant and answers with `{access_token, refresh_token?,
// expires_in?}`; older deployments wrap that object in a one-element array,
// so both shapes are accepted.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::Error;

/// Which OAuth2 grant a token request uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantType {
    /// Resource-owner password grant (initial login).
    Password,
    /// Refresh-token grant (proactive renewal).
    RefreshToken,
    /// Any other grant type named in configuration.
    Custom(String),
}

impl GrantType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Password => "password",
            Self::RefreshToken => "refresh_token",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for GrantType {
    fn from(value: &str) -> Self {
        match value {
            "password" => Self::Password,
            "refresh_token" => Self::RefreshToken,
            other => Self::Custom(other.to_owned()),
        }
    }
}

/// A form-encoded token request.
///
/// Secrets stay wrapped until the form is built for the wire.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub grant_type: GrantType,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
}

impl TokenRequest {
    /// Initial grant with the configured grant type (normally `password`).
    pub fn password(
        grant_type: GrantType,
        client_id: Option<String>,
        client_secret: Option<SecretString>,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            grant_type,
            client_id,
            client_secret,
            username: Some(username),
            password: Some(password),
            refresh_token: None,
        }
    }

    /// Refresh-token grant.
    pub fn refresh(
        client_id: Option<String>,
        client_secret: Option<SecretString>,
        refresh_token: SecretString,
    ) -> Self {
        Self {
            grant_type: GrantType::RefreshToken,
            client_id,
            client_secret,
            username: None,
            password: None,
            refresh_token: Some(refresh_token),
        }
    }

    /// Flatten into `(key, value)` pairs for `reqwest`'s form encoder.
    /// Absent optional fields are omitted entirely.
    pub(crate) fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![("grant_type", self.grant_type.as_str().to_owned())];
        if let Some(ref id) = self.client_id {
            form.push(("client_id", id.clone()));
        }
        if let Some(ref secret) = self.client_secret {
            form.push(("client_secret", secret.expose_secret().to_owned()));
        }
        if let Some(ref username) = self.username {
            form.push(("username", username.clone()));
        }
        if let Some(ref password) = self.password {
            form.push(("password", password.expose_secret().to_owned()));
        }
        if let Some(ref token) = self.refresh_token {
            form.push(("refresh_token", token.expose_secret().to_owned()));
        }
        form
    }
}

/// A successful token grant.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_in: Option<Duration>,
}

#[derive(Deserialize)]
struct RawToken {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenEnvelope {
    Object(RawToken),
    Wrapped(Vec<RawToken>),
}

/// Parse a token endpoint body, accepting both the bare object and the
/// array-wrapped form.
pub(crate) fn parse_token_body(body: &str) -> Result<TokenResponse, Error> {
    let envelope: TokenEnvelope = serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("token response is not JSON: {e}"), body))?;

    let raw = match envelope {
        TokenEnvelope::Object(raw) => raw,
        TokenEnvelope::Wrapped(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| Error::malformed("token response array is empty", body))?,
    };

    let access_token = raw
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::malformed("token response has no access_token", body))?;

    Ok(TokenResponse {
        access_token: SecretString::from(access_token),
        refresh_token: raw
            .refresh_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from),
        expires_in: raw.expires_in.map(Duration::from_secs),
    })
}
