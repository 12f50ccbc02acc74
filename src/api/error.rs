use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failures of a single backend call. A `SUCCESS`/`FAILED` status inside a well-formed response
/// is not an error at this level; see `ApiResponse`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the bearer token.
    #[error("The session is no longer valid, please log in again")]
    Unauthorized,

    /// Any other non-success HTTP status.
    #[error("{endpoint} responded with HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The request could not be sent or the connection failed.
    #[error("Request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the JSON we expected.
    #[error("Unable to decode the response from {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unable to build a URL for {endpoint}")]
    Url {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// Raised by the in-memory backend to simulate an unreachable server.
    #[error("{0}")]
    Simulated(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
