use thiserror::Error;

use getair_core::CoreError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] getair_config::ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] getair_api::Error),

    #[error("could not connect to the getAir cloud (check credentials)")]
    ConnectFailed,

    #[error("write rejected by the device")]
    WriteFailed,
}

impl CliError {
    /// Distinct exit codes so scripts can tell auth problems from
    /// transient update failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectFailed | Self::Core(CoreError::AuthenticationFailed { .. }) => 3,
            Self::Core(CoreError::UpdateFailed { .. }) => 4,
            _ => 1,
        }
    }
}
