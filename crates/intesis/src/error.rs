//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use intesis_config::ConfigError;
use intesis_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Intesis cloud")]
    #[diagnostic(
        code(intesis::connection_failed),
        help(
            "{message}\n\
             Check network access, or point --api-base-url at a reachable endpoint."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(intesis::auth_failed),
        help(
            "{message}\n\
             Verify username and password, or set INTESIS_USERNAME / INTESIS_PASSWORD."
        )
    )]
    AuthFailed { message: String },

    #[error("No {field} configured")]
    #[diagnostic(
        code(intesis::no_credentials),
        help(
            "Add '{field}' to {path}\n\
             Or pass --{field}, or export INTESIS_USERNAME / INTESIS_PASSWORD."
        )
    )]
    NoCredentials { field: &'static str, path: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(intesis::not_found),
        help("Run: intesis devices list to see available units")
    )]
    NotFound { identifier: String },

    #[error("Capability '{capability}' is read-only")]
    #[diagnostic(
        code(intesis::read_only),
        help("Use: intesis get <device> {capability}")
    )]
    ReadOnly { capability: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(intesis::validation))]
    Validation { field: String, reason: String },

    // ── Cloud ────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(intesis::api_error))]
    ApiError { code: String, message: String },

    #[error("Unexpected response from the Intesis cloud: {message}")]
    #[diagnostic(
        code(intesis::malformed_response),
        help("Re-run with -vv to log the exchange.")
    )]
    MalformedResponse { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(intesis::config),
        help("Run: intesis config path to locate the file")
    )]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(intesis::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ReadOnly { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { message } => CliError::ConnectionFailed { message },
            CoreError::Authentication { message } => CliError::AuthFailed { message },
            CoreError::MalformedResponse { message } => CliError::MalformedResponse { message },
            CoreError::Api { status, message } => CliError::ApiError {
                code: status.to_string(),
                message,
            },
            CoreError::Application { message } => CliError::Validation {
                field: "value".into(),
                reason: message,
            },
            CoreError::DeviceNotFound { identifier } => CliError::NotFound { identifier },
            CoreError::ReadOnly { capability } => CliError::ReadOnly { capability },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_pick_exit_codes() {
        let cases = [
            (
                CoreError::Transport {
                    message: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::Authentication {
                    message: "HTTP 401".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::DeviceNotFound {
                    identifier: "attic".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::ReadOnly {
                    capability: "current-temperature".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::MalformedResponse {
                    message: "no devices".into(),
                },
                exit_code::GENERAL,
            ),
        ];

        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn missing_field_is_an_auth_failure() {
        let err = CliError::NoCredentials {
            field: "password",
            path: "/tmp/config.toml".into(),
        };
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert_eq!(err.to_string(), "No password configured");
    }

    #[test]
    fn config_validation_is_usage() {
        let err = CliError::from(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
