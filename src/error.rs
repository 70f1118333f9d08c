//! Provisioning failure kinds
//!
//! Only a device timeout is recoverable, and only by the operator agreeing
//! to replay the configure phase. Everything else unwinds the run; nothing
//! rolls back directory state that was already created, so an aborted run
//! can leave a placeholder node registered on the server.

use crate::device::DeviceError;
use crate::directory::DirectoryError;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(DirectoryError),

    #[error("directory service error: {0}")]
    Directory(DirectoryError),

    /// Device-side failure, including an exchange timeout the operator
    /// chose not to retry past.
    #[error("device setup failed: {0}")]
    Device(DeviceError),

    #[error("operator declined to retry")]
    OperatorAbort,

    #[error("failed to resolve directory host {0}")]
    HostResolution(String),

    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}
