//! Component handles (HSMN) and request sequence numbers

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of handles including [`Hsmn::UNDEF`].
///
/// Valid handles run from 1 to `MAX_HSM_COUNT - 1`.
pub const MAX_HSM_COUNT: usize = 64;

/// Per-originator request sequence number. Wraps on overflow.
pub type Sequence = u16;

/// Stable numeric handle of one component instance.
///
/// The handle is both the routing address of the component and the index
/// into every per-component lookup table.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hsmn(pub u8);

impl Hsmn {
    /// Reserved handle. Never assigned to a component.
    pub const UNDEF: Hsmn = Hsmn(0);

    /// Create a handle from a raw value
    pub const fn new(raw: u8) -> Self {
        Hsmn(raw)
    }

    /// Get the raw handle value
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Table index of this handle
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True for every handle except `UNDEF` that fits the handle tables
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && (self.0 as usize) < MAX_HSM_COUNT
    }

    /// Handle of the `n`-th instance of a multi-instance component type, or
    /// `None` if it falls outside the handle tables.
    pub const fn offset(self, n: u8) -> Option<Self> {
        match self.0.checked_add(n) {
            Some(raw) if Hsmn(raw).is_valid() => Some(Hsmn(raw)),
            _ => None,
        }
    }
}

impl From<u8> for Hsmn {
    #[inline]
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Hsmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Hsmn {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Hsmn({})", self.0);
    }
}
