use thiserror::Error;

/// Failure taxonomy of a poll or write cycle.
///
/// Zone-level read failures never surface here — those degrade the
/// affected zone inside the snapshot and the cycle still succeeds.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Authentication could not be restored within the cycle. The
    /// consumer should prompt for reauthentication rather than retry.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The fetch retries were exhausted; `context` carries the
    /// diagnostic detail (token presence, device error state).
    #[error("update failed: {context}")]
    UpdateFailed { context: String },

    #[error("invalid zone index: {index}")]
    InvalidZone { index: u8 },

    #[error(transparent)]
    Api(#[from] getair_api::Error),
}
