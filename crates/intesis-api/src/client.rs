// IntesisHome cloud HTTP client
//
// Wraps `reqwest::Client` with base-URL normalization, bearer auth, and
// unwrapping of the cloud's array-shaped response bodies. Retries and
// caching are deliberately absent; callers own those policies.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{TokenRequest, TokenResponse, parse_token_body};
use crate::error::Error;
use crate::models::{RawConfig, ServiceChange};
use crate::transport::TransportConfig;

/// Default cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://user.intesishome.com/";

const TOKEN_PATH: &str = "oauth2/token";
const CONFIG_PATH: &str = "api/v1/config";
const SET_PATH: &str = "api/v2/set";

/// Raw HTTP client for the IntesisHome cloud API.
///
/// Every method maps one endpoint; response bodies are validated and the
/// outer array envelope stripped before the caller sees them.
#[derive(Debug, Clone)]
pub struct IntesisClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IntesisClient {
    /// Create a client from a base URL string and transport settings.
    ///
    /// A missing trailing slash is added so relative endpoint paths join
    /// underneath the base rather than replacing its last segment.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, normalize_base_url(base_url)?))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The normalized base URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Exchange a grant for a token via `POST oauth2/token`.
    ///
    /// Any non-success status is reported as [`Error::Unauthorized`]: the
    /// token endpoint only fails for bad client or user credentials.
    pub async fn request_token(&self, request: &TokenRequest) -> Result<TokenResponse, Error> {
        let url = self.endpoint(TOKEN_PATH)?;
        debug!(grant_type = request.grant_type.as_str(), "POST {}", url);

        let resp = self
            .http
            .post(url)
            .form(&request.form())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Unauthorized {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        parse_token_body(&body)
    }

    /// Fetch the device configuration via `GET api/v1/config`.
    ///
    /// The body is an array whose first element holds `devices`.
    pub async fn fetch_config(&self, access_token: &SecretString) -> Result<RawConfig, Error> {
        let url = self.endpoint(CONFIG_PATH)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        let first = self
            .first_element(resp)
            .await?
            .ok_or_else(|| Error::malformed("config response array is empty", "[]"))?;
        serde_json::from_value(first).map_err(|e| Error::malformed(e.to_string(), ""))
    }

    /// Write one service value via `POST api/v2/set`.
    ///
    /// Returns the value the cloud accepted, taken from index 2 of the
    /// first element of the response (`[[device_id, service_id, value]]`).
    pub async fn set_value(
        &self,
        access_token: &SecretString,
        change: &ServiceChange,
    ) -> Result<serde_json::Value, Error> {
        if change.device_id.is_empty() {
            return Err(Error::MissingField("device_id"));
        }
        if change.service_id.is_empty() {
            return Err(Error::MissingField("service_id"));
        }

        let url = self.endpoint(SET_PATH)?;
        debug!(
            device_id = %change.device_id,
            service_id = %change.service_id,
            "POST {}",
            url
        );

        let resp = self
            .http
            .post(url)
            .bearer_auth(access_token.expose_secret())
            .json(&[change])
            .send()
            .await
            .map_err(Error::Transport)?;

        let accepted = match self.first_element(resp).await? {
            Some(serde_json::Value::Array(row)) => row.into_iter().nth(2),
            _ => None,
        };
        accepted
            .ok_or_else(|| Error::malformed("set response lacks an accepted value at [0][2]", ""))
    }

    // ── Response helpers ─────────────────────────────────────────────

    /// Parse an array body and hand back only its first element. Trailing
    /// elements are not validated.
    async fn first_element(
        &self,
        resp: reqwest::Response,
    ) -> Result<Option<serde_json::Value>, Error> {
        let items: Vec<serde_json::Value> = self.parse_json(resp).await?;
        Ok(items.into_iter().next())
    }

    /// Check the status and deserialize the body, keeping the raw text for
    /// error reporting.
    async fn parse_json<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), bytes = body.len(), "response received");

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Unauthorized {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::malformed(e.to_string(), &body))
    }
}

/// Parse a base URL and make sure it ends in `/`.
pub fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base_url("https://example.com/intesis").unwrap();
        assert_eq!(url.as_str(), "https://example.com/intesis/");
        assert_eq!(
            url.join(CONFIG_PATH).unwrap().as_str(),
            "https://example.com/intesis/api/v1/config"
        );
    }

    #[test]
    fn base_url_with_slash_is_untouched() {
        let url = normalize_base_url(DEFAULT_BASE_URL).unwrap();
        assert_eq!(url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
