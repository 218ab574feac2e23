// Error types for every command.
//
// `ClientError` covers every way a command can fail. Each variant maps to
// a process exit code: 1 for API and output failures, 2 for credential
// and input problems, 3 when the API cannot be reached.

use serde_json::Value;
use thiserror::Error;

use crate::config::API_KEY_VAR;

/// Everything that can stop a command.
///
/// Empty results ("no calls", "no transcript yet") are not errors and never
/// show up here.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Set {} env var (an API key is required for this command)", API_KEY_VAR)]
    MissingCredential,

    #[error("API key contains characters that cannot be sent in a header")]
    InvalidCredential,

    /// Empty, `.` or `..`: none of these can name a call in a URL path.
    #[error("Invalid call id: {0:?}")]
    InvalidCallId(String),

    /// DNS, connection or timeout failure.
    #[error("API unreachable: {0}")]
    Unreachable(String),

    /// Non-2xx status. The body is kept whole so server-side validation
    /// messages reach the user.
    #[error("Error ({status}): {}", pretty(.body))]
    Api { status: u16, body: Value },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl ClientError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::Api { .. } => 1,
            ClientError::UnexpectedResponse(_) => 1,
            ClientError::Output(_) => 1,
            ClientError::MissingCredential
            | ClientError::InvalidCredential
            | ClientError::InvalidCallId(_) => 2,
            ClientError::Unreachable(_) => 3,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Unreachable(err.to_string())
    }
}

fn pretty(body: &Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}
