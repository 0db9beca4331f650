// ── Remote API seam ──
//
// The three cloud operations the core depends on, abstracted so the
// credential manager, cache, and bridges can run against the real
// `IntesisClient` or an in-process fake.

use std::future::Future;

use secrecy::SecretString;

use intesis_api::{IntesisClient, RawConfig, ServiceChange, TokenRequest, TokenResponse};

/// Remote operations consumed by the synchronization core.
pub trait CloudApi: Send + Sync + 'static {
    /// `POST oauth2/token`.
    fn request_token(
        &self,
        request: &TokenRequest,
    ) -> impl Future<Output = Result<TokenResponse, intesis_api::Error>> + Send;

    /// `GET api/v1/config`.
    fn fetch_config(
        &self,
        access_token: &SecretString,
    ) -> impl Future<Output = Result<RawConfig, intesis_api::Error>> + Send;

    /// `POST api/v2/set`, returning the accepted value.
    fn set_value(
        &self,
        access_token: &SecretString,
        change: &ServiceChange,
    ) -> impl Future<Output = Result<serde_json::Value, intesis_api::Error>> + Send;
}

impl CloudApi for IntesisClient {
    fn request_token(
        &self,
        request: &TokenRequest,
    ) -> impl Future<Output = Result<TokenResponse, intesis_api::Error>> + Send {
        IntesisClient::request_token(self, request)
    }

    fn fetch_config(
        &self,
        access_token: &SecretString,
    ) -> impl Future<Output = Result<RawConfig, intesis_api::Error>> + Send {
        IntesisClient::fetch_config(self, access_token)
    }

    fn set_value(
        &self,
        access_token: &SecretString,
        change: &ServiceChange,
    ) -> impl Future<Output = Result<serde_json::Value, intesis_api::Error>> + Send {
        IntesisClient::set_value(self, access_token, change)
    }
}
