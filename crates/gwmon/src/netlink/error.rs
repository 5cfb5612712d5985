//! Error types for netlink and monitor operations.

use std::fmt;
use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of channel setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    /// Creating the netlink socket.
    Socket,
    /// Switching the socket to non-blocking mode.
    NonBlocking,
    /// Binding to a kernel-assigned port ID.
    Bind,
    /// Joining the multicast group.
    Membership,
    /// Registering the socket with the reactor.
    Register,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStage::Socket => "socket",
            SetupStage::NonBlocking => "set non-blocking",
            SetupStage::Bind => "bind",
            SetupStage::Membership => "add membership",
            SetupStage::Register => "register with reactor",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while monitoring routes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket or device operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (configuration) error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel setup failed; the monitor cannot run without it.
    #[error("netlink setup failed ({stage}): {source}")]
    Setup {
        /// The stage that failed.
        stage: SetupStage,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Sending a request to the kernel failed.
    #[error("failed to send netlink request: {0}")]
    Send(#[source] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid interface name.
    #[error("invalid interface name: {0}")]
    InvalidInterfaceName(String),
}

impl Error {
    /// Create a kernel error from an errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Create a setup error for the given stage.
    pub fn setup(stage: SetupStage, source: io::Error) -> Self {
        Self::Setup { stage, source }
    }

    /// Check if the kernel dropped messages because the receive buffer overflowed.
    pub fn is_overrun(&self) -> bool {
        match self {
            Self::Io(e) => e.raw_os_error() == Some(libc::ENOBUFS),
            _ => false,
        }
    }
}
