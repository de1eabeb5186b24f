//! Signal encoding
//!
//! A signal packs the handle of the interface that owns it together with a
//! category and a local index:
//!
//! ```text
//!  15            8 7 6 5         0
//! +---------------+-+-+-----------+
//! |     HSMN      |1|  index (7)  |  Interface
//! |     HSMN      |0|1| index (6) |  Internal
//! |     HSMN      |0|0| index (6) |  Timer
//! +---------------+-+-+-----------+
//! ```
//!
//! Signals owned by `Hsmn::UNDEF` are the builtin state machine signals.
//! The encoding allows the diagnostics layer to recover the owner and a
//! human readable name of any signal without a global dispatch table.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Hsmn;

/// Number of bits holding the owner handle
pub const HSMN_BIT_SIZE: u32 = 8;
/// Number of bits holding category and local index
pub const EVT_TYPE_BIT_SIZE: u32 = 8;

const EVT_TYPE_MASK: u16 = (1 << EVT_TYPE_BIT_SIZE) - 1;
const INTERFACE_FLAG: u8 = 0x80;
const INTERNAL_FLAG: u8 = 0x40;

/// Highest local index of a timer or internal signal
pub const MAX_LOCAL_INDEX: u8 = INTERNAL_FLAG - 1;
/// Highest local index of an interface signal
pub const MAX_INTERFACE_INDEX: u8 = INTERFACE_FLAG - 1;

/// Signal category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Entry/Exit/Init/Empty of the state machine engine
    Builtin,
    /// Expiry of a timer owned by the handle
    Timer,
    /// Events a component raises to itself
    Internal,
    /// Events exchanged between components
    Interface,
}

/// Type-safe event signal identifier
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(pub u16);

impl Signal {
    /// Reserved signal for empty/null events
    pub const EMPTY: Signal = Signal(0);
    /// Reserved signal for state entry actions
    pub const ENTRY: Signal = Signal(1);
    /// Reserved signal for state exit actions
    pub const EXIT: Signal = Signal(2);
    /// Reserved signal for initial transitions
    pub const INIT: Signal = Signal(3);

    /// Create a new signal from a raw value
    pub const fn new(raw: u16) -> Self {
        Signal(raw)
    }

    /// Get the raw signal value
    pub const fn raw(self) -> u16 {
        self.0
    }

    const fn compose(hsmn: Hsmn, ty: u8) -> Self {
        Signal(((hsmn.raw() as u16) << EVT_TYPE_BIT_SIZE) | ty as u16)
    }

    /// Timer signal `index` owned by `hsmn`.
    pub const fn timer(hsmn: Hsmn, index: u8) -> Self {
        assert!(index <= MAX_LOCAL_INDEX, "timer index out of range");
        Self::compose(hsmn, index)
    }

    /// Internal signal `index` owned by `hsmn`.
    pub const fn internal(hsmn: Hsmn, index: u8) -> Self {
        assert!(index <= MAX_LOCAL_INDEX, "internal index out of range");
        Self::compose(hsmn, INTERNAL_FLAG | index)
    }

    /// Interface signal `index` owned by `hsmn`.
    pub const fn interface(hsmn: Hsmn, index: u8) -> Self {
        assert!(index <= MAX_INTERFACE_INDEX, "interface index out of range");
        Self::compose(hsmn, INTERFACE_FLAG | index)
    }

    /// Handle of the interface owning this signal
    pub const fn hsmn(self) -> Hsmn {
        Hsmn((self.0 >> EVT_TYPE_BIT_SIZE) as u8)
    }

    const fn evt_type(self) -> u8 {
        (self.0 & EVT_TYPE_MASK) as u8
    }

    pub const fn category(self) -> Category {
        let ty = self.evt_type();
        if !self.hsmn().is_valid() {
            Category::Builtin
        } else if ty & INTERFACE_FLAG != 0 {
            Category::Interface
        } else if ty & INTERNAL_FLAG != 0 {
            Category::Internal
        } else {
            Category::Timer
        }
    }

    /// Local index within the category
    pub const fn index(self) -> u8 {
        let ty = self.evt_type();
        match self.category() {
            Category::Builtin | Category::Timer => ty,
            Category::Internal => ty & !INTERNAL_FLAG,
            Category::Interface => ty & !INTERFACE_FLAG,
        }
    }

    pub const fn is_builtin(self) -> bool {
        matches!(self.category(), Category::Builtin)
    }

    pub const fn is_timer(self) -> bool {
        matches!(self.category(), Category::Timer)
    }

    pub const fn is_internal(self) -> bool {
        matches!(self.category(), Category::Internal)
    }

    pub const fn is_interface(self) -> bool {
        matches!(self.category(), Category::Interface)
    }
}

impl From<u16> for Signal {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG({:#06x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Signal {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SIG({=u16:#x})", self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Hsmn = Hsmn(5);

    #[test]
    fn test_category_decoding() {
        assert_eq!(Signal::timer(OWNER, 3).category(), Category::Timer);
        assert_eq!(Signal::internal(OWNER, 3).category(), Category::Internal);
        assert_eq!(Signal::interface(OWNER, 3).category(), Category::Interface);
        assert_eq!(Signal::ENTRY.category(), Category::Builtin);
    }

    #[test]
    fn test_owner_and_index_recovered() {
        let sig = Signal::interface(OWNER, 0x41);
        assert_eq!(sig.hsmn(), OWNER);
        assert_eq!(sig.index(), 0x41);

        let sig = Signal::internal(OWNER, MAX_LOCAL_INDEX);
        assert_eq!(sig.hsmn(), OWNER);
        assert_eq!(sig.index(), MAX_LOCAL_INDEX);
    }

    #[test]
    fn test_same_index_different_category_differs() {
        let a = Signal::timer(OWNER, 1);
        let b = Signal::internal(OWNER, 1);
        let c = Signal::interface(OWNER, 1);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    #[should_panic]
    fn test_timer_index_overflow() {
        let _ = Signal::timer(OWNER, MAX_LOCAL_INDEX + 1);
    }
}
