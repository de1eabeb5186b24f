//! Addressed events
//!
//! Every event carries its signal, the handles of its destination and
//! originator and the originator's sequence number. What else it carries is
//! a closed set of [`Body`] variants rather than a hierarchy of event
//! classes. An owned [`Evt`] is a dynamic event travelling through queues;
//! a borrowed `&Evt` handed to a handler must be cloned to outlive the
//! dispatch (deferring does that).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use fw_core::{ErrorKind, Hsmn, Reason, Sequence, Signal, REASON_UNSPEC};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::time::TimerStamp;

/// Type-erased payload shared between clones of an event.
pub type DynPayload = Arc<dyn Any + Send + Sync>;

/// Outcome of an asynchronous request.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInfo {
    pub error: ErrorKind,
    /// Component that actually failed, possibly nested below the sender.
    pub origin: Hsmn,
    pub reason: Reason,
}

impl ErrorInfo {
    pub const fn new(error: ErrorKind, origin: Hsmn, reason: Reason) -> Self {
        Self {
            error,
            origin,
            reason,
        }
    }

    pub const fn success() -> Self {
        Self::new(ErrorKind::Success, Hsmn::UNDEF, REASON_UNSPEC)
    }

    pub const fn is_success(&self) -> bool {
        self.error.is_success()
    }

    /// Attribute an error without an origin to `hsmn`.
    pub fn or_origin(mut self, hsmn: Hsmn) -> Self {
        if self.origin == Hsmn::UNDEF {
            self.origin = hsmn;
        }
        self
    }
}

impl Default for ErrorInfo {
    fn default() -> Self {
        Self::success()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} origin={} reason={}", self.error, self.origin, self.reason)
    }
}

/// Event specific content
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Request carrying the timeout the receiver has declared for it
    Request { timeout_ms: u32 },
    /// Confirmation or response
    Error(ErrorInfo),
    /// Timer expiry
    Timer(TimerStamp),
    Data(DynPayload),
}

#[derive(Debug, Clone)]
pub struct Evt {
    pub signal: Signal,
    pub to: Hsmn,
    pub from: Hsmn,
    pub seq: Sequence,
    pub body: Body,
}

impl Evt {
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            to: Hsmn::UNDEF,
            from: Hsmn::UNDEF,
            seq: 0,
            body: Body::Empty,
        }
    }

    pub fn request(signal: Signal, timeout_ms: u32) -> Self {
        Self::new(signal).with_body(Body::Request { timeout_ms })
    }

    pub fn error(signal: Signal, info: ErrorInfo) -> Self {
        Self::new(signal).with_body(Body::Error(info))
    }

    /// Successful confirmation
    pub fn success(signal: Signal) -> Self {
        Self::error(signal, ErrorInfo::success())
    }

    pub fn data<T: Any + Send + Sync>(signal: Signal, payload: T) -> Self {
        Self::new(signal).with_body(Body::Data(Arc::new(payload)))
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_to(mut self, to: Hsmn) -> Self {
        self.to = to;
        self
    }

    pub fn with_from(mut self, from: Hsmn) -> Self {
        self.from = from;
        self
    }

    pub fn with_seq(mut self, seq: Sequence) -> Self {
        self.seq = seq;
        self
    }

    pub fn error_info(&self) -> Option<ErrorInfo> {
        match &self.body {
            Body::Error(info) => Some(*info),
            _ => None,
        }
    }

    pub fn timeout_ms(&self) -> Option<u32> {
        match self.body {
            Body::Request { timeout_ms } => Some(timeout_ms),
            _ => None,
        }
    }

    pub fn timer_stamp(&self) -> Option<&TimerStamp> {
        match &self.body {
            Body::Timer(stamp) => Some(stamp),
            _ => None,
        }
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        match &self.body {
            Body::Data(payload) => payload.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// True for a timer expiry invalidated by a later stop or restart.
    pub fn is_stale_timer(&self) -> bool {
        self.timer_stamp().map_or(false, |stamp| !stamp.is_current())
    }
}

/// Human readable names of the signals owned by one handle, indexed by
/// local signal index within each category.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvtSet {
    pub timer: &'static [&'static str],
    pub internal: &'static [&'static str],
    pub interface: &'static [&'static str],
}

impl EvtSet {
    pub const EMPTY: EvtSet = EvtSet {
        timer: &[],
        internal: &[],
        interface: &[],
    };

    pub fn name(&self, signal: Signal) -> Option<&'static str> {
        use fw_core::Category;
        let names = match signal.category() {
            Category::Timer => self.timer,
            Category::Internal => self.internal,
            Category::Interface => self.interface,
            Category::Builtin => return builtin_name(signal),
        };
        names.get(signal.index() as usize).copied()
    }
}

pub(crate) fn builtin_name(signal: Signal) -> Option<&'static str> {
    match signal {
        Signal::EMPTY => Some("EMPTY"),
        Signal::ENTRY => Some("ENTRY"),
        Signal::EXIT => Some("EXIT"),
        Signal::INIT => Some("INIT"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Hsmn = Hsmn(9);
    const NAMES: EvtSet = EvtSet {
        timer: &["BLINK_TIMER"],
        internal: &["DONE", "FAILED"],
        interface: &["START_REQ", "START_CFM"],
    };

    #[test]
    fn test_names_by_category() {
        assert_eq!(NAMES.name(Signal::timer(OWNER, 0)), Some("BLINK_TIMER"));
        assert_eq!(NAMES.name(Signal::internal(OWNER, 1)), Some("FAILED"));
        assert_eq!(NAMES.name(Signal::interface(OWNER, 1)), Some("START_CFM"));
        assert_eq!(NAMES.name(Signal::interface(OWNER, 2)), None);
        assert_eq!(NAMES.name(Signal::ENTRY), Some("ENTRY"));
    }

    #[test]
    fn test_clone_shares_payload() {
        let e = Evt::data(Signal::interface(OWNER, 0), vec![1u8, 2, 3]);
        let copy = e.clone();
        assert_eq!(copy.payload::<Vec<u8>>(), Some(&vec![1u8, 2, 3]));
        assert!(copy.payload::<u32>().is_none());
        if let (Body::Data(a), Body::Data(b)) = (&e.body, &copy.body) {
            assert!(Arc::ptr_eq(a, b));
        } else {
            panic!("expected data bodies");
        }
    }

    #[test]
    fn test_undefined_origin_attribution() {
        let info = ErrorInfo::new(ErrorKind::HardwareError, Hsmn::UNDEF, 7).or_origin(OWNER);
        assert_eq!(info.origin, OWNER);
        let info = ErrorInfo::new(ErrorKind::HardwareError, Hsmn(3), 7).or_origin(OWNER);
        assert_eq!(info.origin, Hsmn(3));
    }
}
