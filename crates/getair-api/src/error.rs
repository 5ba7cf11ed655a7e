use thiserror::Error;

/// Errors produced by the getAir cloud client.
#[derive(Debug, Error)]
pub enum Error {
    /// Token grant failed, or a request was rejected for a missing or
    /// expired session token.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The cloud answered with a non-auth error status.
    #[error("getAir API error: {message}")]
    Api { message: String },

    /// Connection-level failure (DNS, TLS, timeouts).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected document shape.
    #[error("deserialization error: {message}")]
    Deserialization { message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Credentials file could not be written, restricted, or removed.
    #[error("credential store error: {0}")]
    CredentialStore(#[from] std::io::Error),

    /// A write referenced a logical property with no wire mapping.
    #[error("unknown property: {name}")]
    UnknownProperty { name: String },

    /// Zone index outside 1..=3.
    #[error("no such zone: {index}")]
    UnknownZone { index: u8 },
}
