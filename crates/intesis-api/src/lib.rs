// intesis-api: Async Rust client for the IntesisHome cloud API
//
// Thin transport layer: OAuth2 token grants, the device configuration
// document, and single-service writes. Domain logic (caching, mapping,
// token lifecycle) lives in `intesis-core`.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{GrantType, TokenRequest, TokenResponse};
pub use client::IntesisClient;
pub use error::Error;
pub use models::{RawConfig, RawDevice, RawService, ServiceChange};
pub use transport::TransportConfig;
