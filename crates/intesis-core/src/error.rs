// ── Core error types ──
//
// Domain-level errors from intesis-core. Consumers never see HTTP status
// codes or JSON bodies directly; the `From<intesis_api::Error>` impl folds
// transport-layer failures into four classes: transport, authentication,
// malformed response, and application (bad input).
//
// `CoreError` is `Clone` because a single failed config fetch settles every
// caller that was coalesced onto it.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    // ── Remote errors ────────────────────────────────────────────────
    #[error("Cannot reach Intesis cloud: {message}")]
    Transport { message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Malformed response from Intesis cloud: {message}")]
    MalformedResponse { message: String },

    #[error("Intesis API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Application errors ───────────────────────────────────────────
    #[error("Invalid request: {message}")]
    Application { message: String },

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Capability '{capability}' is read-only")]
    ReadOnly { capability: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for failures that abort only the current operation
    /// and leave cached state intact.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<intesis_api::Error> for CoreError {
    fn from(err: intesis_api::Error) -> Self {
        match err {
            intesis_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
            },
            intesis_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            intesis_api::Error::Unauthorized { status, message } => CoreError::Authentication {
                message: format!("HTTP {status}: {message}"),
            },
            intesis_api::Error::Api { status, message } => CoreError::Api { status, message },
            intesis_api::Error::Malformed { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
            intesis_api::Error::MissingField(field) => CoreError::Application {
                message: format!("missing required field '{field}'"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_authentication() {
        let err = CoreError::from(intesis_api::Error::Unauthorized {
            status: 401,
            message: "expired".into(),
        });
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "Authentication failed: HTTP 401: expired");
    }

    #[test]
    fn missing_field_maps_to_application() {
        let err = CoreError::from(intesis_api::Error::MissingField("service_id"));
        assert!(matches!(err, CoreError::Application { .. }));
    }

    #[test]
    fn malformed_drops_body() {
        let err = CoreError::from(intesis_api::Error::Malformed {
            message: "no devices".into(),
            body: "[]".into(),
        });
        assert!(err.is_malformed());
    }
}
