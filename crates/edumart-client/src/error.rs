//! Client error types.

/// Errors that can occur when using the edumart client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The coupon could not be applied.
    #[error("coupon rejected: {reason}")]
    CouponRejected {
        /// Machine-readable reason, e.g. `expired`.
        reason: String,
    },

    /// The resource does not exist or is not visible to the caller.
    #[error("not found: {message}")]
    NotFound {
        /// Server message.
        message: String,
    },

    /// The gateway identity was missing or unknown.
    #[error("unauthorized")]
    Unauthorized,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
