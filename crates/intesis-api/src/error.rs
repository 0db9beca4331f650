use thiserror::Error;

/// Top-level error type for the `intesis-api` crate.
///
/// Covers every failure mode of the three cloud endpoints: transport,
/// token rejection, unexpected status codes, and response bodies that do
/// not have the documented shape. `intesis-core` maps these into its own
/// domain-level taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Authentication ──────────────────────────────────────────────
    /// The token endpoint (or a bearer-authenticated call) was rejected.
    #[error("Unauthorized (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    // ── API ─────────────────────────────────────────────────────────
    /// Any other non-success HTTP status.
    #[error("Intesis API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The response parsed but did not have the expected shape, with the
    /// raw body for debugging.
    #[error("Malformed response: {message}")]
    Malformed { message: String, body: String },

    /// A request could not be built because a required field was empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl Error {
    /// Returns `true` if this error indicates the bearer token or the
    /// client credentials were rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a network-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub(crate) fn malformed(message: impl Into<String>, body: &str) -> Self {
        Self::Malformed {
            message: message.into(),
            body: body.to_owned(),
        }
    }
}
