use thiserror::Error;

/// Message used when a failed response carries no `error` field.
pub const GENERIC_SERVER_ERROR: &str = "server error";

/// Message used when login fails without a server explanation.
pub const GENERIC_LOGIN_ERROR: &str = "invalid password";

/// Failure of a call against the admin API.
///
/// Nothing is retried: every variant is terminal for the action that
/// triggered it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401/403. The stored token has already been discarded.
    #[error("unauthorized, please log in again")]
    Unauthorized,

    /// Non-2xx response; `message` is the server's own text when it sent one.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The login endpoint refused the password or returned no token.
    #[error("{0}")]
    LoginRejected(String),

    /// DNS, TLS, connect, or timeout failure.
    #[error("could not connect to the server")]
    Network(String),

    /// 2xx response whose body does not have the expected shape.
    #[error("unexpected response from the server: {0}")]
    Decode(String),

    /// The configured base URL cannot address an endpoint.
    #[error("invalid API URL '{0}'")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Low-level detail behind a network failure, for verbose output.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Network(detail) => Some(detail),
            _ => None,
        }
    }
}
