#![no_std]
#![forbid(unsafe_code)]

//! # FW Core
//!
//! Handles, signals and the error taxonomy shared by every FW crate.
//! Nothing in here allocates, so the types can travel between interrupt
//! context, `no_std` drivers and the hosted framework alike.

use core::fmt;

pub mod error;
pub mod hsmn;
pub mod signal;

pub use error::*;
pub use hsmn::*;
pub use signal::*;

/// FW framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the FW framework
pub type FwResult<T> = Result<T, FwError>;

/// Error types for framework (not business) operations.
///
/// Outcomes of asynchronous requests are reported through
/// [`ErrorKind`] inside confirmation events instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FwError {
    /// Handle is undefined or out of range
    InvalidHsmn(Hsmn),
    /// Handle registered twice
    DuplicateHsmn(Hsmn),
    /// Priority outside `1..=MAX_PRIORITY`
    InvalidPriority(u8),
    /// Priority already taken by another active
    DuplicatePriority(u8),
    /// Event queue of the destination container is full
    QueueFull(Hsmn),
    /// Destination handle has no registered container
    Unroutable(Hsmn),
    /// Too many regions hosted by one active
    RegionLimit(Hsmn),
}

impl fmt::Display for FwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FwError::InvalidHsmn(h) => write!(f, "Invalid HSMN {}", h),
            FwError::DuplicateHsmn(h) => write!(f, "HSMN {} already registered", h),
            FwError::InvalidPriority(p) => write!(f, "Invalid priority {}", p),
            FwError::DuplicatePriority(p) => write!(f, "Priority {} already in use", p),
            FwError::QueueFull(h) => write!(f, "Event queue of HSMN {} is full", h),
            FwError::Unroutable(h) => write!(f, "No container for HSMN {}", h),
            FwError::RegionLimit(h) => write!(f, "Region limit reached in HSMN {}", h),
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for FwError {}

#[cfg(feature = "defmt")]
impl defmt::Format for FwError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            FwError::InvalidHsmn(h) => defmt::write!(fmt, "InvalidHsmn({})", h.raw()),
            FwError::DuplicateHsmn(h) => defmt::write!(fmt, "DuplicateHsmn({})", h.raw()),
            FwError::InvalidPriority(p) => defmt::write!(fmt, "InvalidPriority({})", p),
            FwError::DuplicatePriority(p) => defmt::write!(fmt, "DuplicatePriority({})", p),
            FwError::QueueFull(h) => defmt::write!(fmt, "QueueFull({})", h.raw()),
            FwError::Unroutable(h) => defmt::write!(fmt, "Unroutable({})", h.raw()),
            FwError::RegionLimit(h) => defmt::write!(fmt, "RegionLimit({})", h.raw()),
        }
    }
}
