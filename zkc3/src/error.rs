//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] zkc3_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zkc3_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] zkc3_types::Error),

    #[error("No connection to C3 panel")]
    NotConnected,

    #[error("Cannot change connection settings while connected; disconnect first")]
    AlreadyConnected,

    #[error("No reply header received after {attempts} attempts")]
    HeaderTimeout { attempts: usize },

    #[error("Invalid response from panel: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Check if the connection must be presumed dead
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::HeaderTimeout { .. } | Self::Transport(_)
        )
    }

    /// Check if the panel answered with an error reply
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::Core(zkc3_core::Error::Device { .. }))
    }

    /// Device error code, if the panel answered with an error reply
    pub fn device_error_code(&self) -> Option<i8> {
        match self {
            Self::Core(zkc3_core::Error::Device { code, .. }) => Some(*code),
            _ => None,
        }
    }
}
