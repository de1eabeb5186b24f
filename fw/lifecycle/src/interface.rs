//! Static lifecycle interface declarations

use fw_qf::{Hsmn, Signal};

/// The Start/Stop request and confirmation signals of one component type
/// together with the timeouts it promises to honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleInterface {
    pub start_req: Signal,
    pub start_cfm: Signal,
    pub stop_req: Signal,
    pub stop_cfm: Signal,
    /// Longest time the component takes to confirm a start
    pub start_timeout_ms: u32,
    /// Longest time the component takes to confirm a stop
    pub stop_timeout_ms: u32,
}

impl LifecycleInterface {
    /// Interface whose four signals are the interface indices `base` to
    /// `base + 3` of `hsmn`, in the order StartReq, StartCfm, StopReq,
    /// StopCfm.
    pub const fn new(hsmn: Hsmn, base: u8, start_timeout_ms: u32, stop_timeout_ms: u32) -> Self {
        Self {
            start_req: Signal::interface(hsmn, base),
            start_cfm: Signal::interface(hsmn, base + 1),
            stop_req: Signal::interface(hsmn, base + 2),
            stop_cfm: Signal::interface(hsmn, base + 3),
            start_timeout_ms,
            stop_timeout_ms,
        }
    }
}

/// One component an orchestrator starts and stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub hsmn: Hsmn,
    pub iface: LifecycleInterface,
}

impl Dependency {
    pub const fn new(hsmn: Hsmn, iface: LifecycleInterface) -> Self {
        Self { hsmn, iface }
    }
}

/// True if both timeouts of `outer` strictly exceed those of every
/// interface in `deps`.
pub const fn covers(outer: &LifecycleInterface, deps: &[LifecycleInterface]) -> bool {
    let mut i = 0;
    while i < deps.len() {
        if deps[i].start_timeout_ms >= outer.start_timeout_ms
            || deps[i].stop_timeout_ms >= outer.stop_timeout_ms
        {
            return false;
        }
        i += 1;
    }
    true
}

/// Compile-time check that a component's declared timeouts exceed those
/// of every dependency it orchestrates.
///
/// ```
/// use fw_lifecycle::{assert_timeouts_cover, LifecycleInterface};
/// use fw_qf::Hsmn;
///
/// const LEAF: LifecycleInterface = LifecycleInterface::new(Hsmn(3), 0, 100, 100);
/// const PARENT: LifecycleInterface = LifecycleInterface::new(Hsmn(2), 0, 200, 200);
/// assert_timeouts_cover!(PARENT, [LEAF]);
/// ```
///
/// ```compile_fail
/// use fw_lifecycle::{assert_timeouts_cover, LifecycleInterface};
/// use fw_qf::Hsmn;
///
/// const LEAF: LifecycleInterface = LifecycleInterface::new(Hsmn(3), 0, 200, 100);
/// const PARENT: LifecycleInterface = LifecycleInterface::new(Hsmn(2), 0, 200, 200);
/// assert_timeouts_cover!(PARENT, [LEAF]);
/// ```
#[macro_export]
macro_rules! assert_timeouts_cover {
    ($outer:expr, [$($dep:expr),* $(,)?]) => {
        const _: () = assert!(
            $crate::covers(&$outer, &[$($dep),*]),
            "lifecycle timeout must exceed every dependency timeout"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEAF: LifecycleInterface = LifecycleInterface::new(Hsmn(5), 0, 100, 50);
    const MID: LifecycleInterface = LifecycleInterface::new(Hsmn(4), 4, 150, 100);
    const TOP: LifecycleInterface = LifecycleInterface::new(Hsmn(3), 0, 200, 150);

    assert_timeouts_cover!(TOP, [LEAF, MID]);

    #[test]
    fn test_signal_layout() {
        assert_eq!(MID.start_req, Signal::interface(Hsmn(4), 4));
        assert_eq!(MID.stop_cfm, Signal::interface(Hsmn(4), 7));
    }

    #[test]
    fn test_equal_timeout_does_not_cover() {
        assert!(covers(&TOP, &[LEAF, MID]));
        assert!(!covers(&MID, &[TOP]));
        let same = LifecycleInterface::new(Hsmn(6), 0, 200, 10);
        assert!(!covers(&TOP, &[same]));
        assert!(covers(&TOP, &[]));
    }
}
