//! Error taxonomy carried by confirmation and response events

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Component specific reason code explaining an [`ErrorKind`].
pub type Reason = u16;

/// Reason code used when a component has nothing more specific to say
pub const REASON_UNSPEC: Reason = 0;

/// Common error code for all components.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// No error
    #[default]
    Success,
    Unspecified,
    /// Aborted before completion
    Aborted,
    Timeout,
    /// Driver/HAL level failure
    DriverError,
    HardwareError,
    InvalidHandle,
    /// Request not acceptable in the current state
    WrongState,
    /// Resource unavailable or busy
    Unavailable,
    /// Parameter invalid or out of range
    InvalidParam,
    NetworkError,
    AuthError,
}

impl ErrorKind {
    pub const fn is_success(self) -> bool {
        matches!(self, ErrorKind::Success)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::Success => "SUCCESS",
            ErrorKind::Unspecified => "UNSPEC",
            ErrorKind::Aborted => "ABORTED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::DriverError => "HAL",
            ErrorKind::HardwareError => "HARDWARE",
            ErrorKind::InvalidHandle => "HSMN",
            ErrorKind::WrongState => "STATE",
            ErrorKind::Unavailable => "UNAVAIL",
            ErrorKind::InvalidParam => "PARAM",
            ErrorKind::NetworkError => "NETWORK",
            ErrorKind::AuthError => "AUTH",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.name());
    }
}
