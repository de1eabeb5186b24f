//! The Start/Stop lifecycle state machine
//!
//! ```text
//!             StartReq                     Done
//!  Stopped ------------> Starting ------------------> Started
//!     ^                     |  Failed / deadline /       |
//!     |  Done               |  StopReq                   | StopReq (deferred)
//!     +------ Stopping <----+----------------------------+
//! ```
//!
//! Starting and Stopping fan a request out to every dependency and
//! aggregate the confirmations. The first failure wins; a confirmation
//! that does not match an outstanding request is ignored. Requests that
//! cannot be served mid-transition are deferred and replayed on leaving
//! Stopping.

use std::fmt;

use fw_qf::config::EVT_SEQ_REC_LEN;
use fw_qf::{
    CfmCheck, Context, ErrorInfo, ErrorKind, Evt, Hsmn, Outcome, Signal, Timer, TimerKind,
    TimerWheel, REASON_UNSPEC,
};
use thiserror::Error;

use crate::interface::{Dependency, LifecycleInterface};

/// Timer signal index reserved in the owner's signal space
pub const STATE_TIMER_INDEX: u8 = 0;
/// Internal signal index of the aggregate success event
pub const DONE_INDEX: u8 = 0;
/// Internal signal index of the aggregate failure event
pub const FAILED_INDEX: u8 = 1;

/// Names for the reserved timer signals, for the owner's `EvtSet`.
pub const TIMER_EVT_NAMES: &[&str] = &["STATE_TIMER"];
/// Names for the reserved internal signals, for the owner's `EvtSet`.
pub const INTERNAL_EVT_NAMES: &[&str] = &["DONE", "FAILED"];

pub const fn state_timer_signal(owner: Hsmn) -> Signal {
    Signal::timer(owner, STATE_TIMER_INDEX)
}

pub const fn done_signal(owner: Hsmn) -> Signal {
    Signal::internal(owner, DONE_INDEX)
}

pub const fn failed_signal(owner: Hsmn) -> Signal {
    Signal::internal(owner, FAILED_INDEX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Started,
    Stopping,
}

impl LifecycleState {
    pub const fn name(self) -> &'static str {
        match self {
            LifecycleState::Stopped => "Stopped",
            LifecycleState::Starting => "Starting",
            LifecycleState::Started => "Started",
            LifecycleState::Stopping => "Stopping",
        }
    }

    /// True while a fan-out is in flight
    pub const fn is_busy(self) -> bool {
        matches!(self, LifecycleState::Starting | LifecycleState::Stopping)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregation state of one Starting or Stopping step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConfirmSet {
    expected: usize,
    received: usize,
    first_error: Option<ErrorInfo>,
}

impl PendingConfirmSet {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            received: 0,
            first_error: None,
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn first_error(&self) -> Option<ErrorInfo> {
        self.first_error
    }

    /// Count a successful confirmation. Returns true when it completes the
    /// step without any failure.
    pub fn record_success(&mut self) -> bool {
        self.received += 1;
        self.first_error.is_none() && self.received == self.expected
    }

    /// Count a failed confirmation. Returns true if it is the first failure
    /// of the step.
    pub fn record_failure(&mut self, info: ErrorInfo) -> bool {
        self.received += 1;
        if self.first_error.is_some() {
            return false;
        }
        self.first_error = Some(info);
        true
    }
}

/// What an orchestrator did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Unhandled,
    Handled,
    Transitioned {
        from: LifecycleState,
        to: LifecycleState,
    },
}

impl From<Reaction> for Outcome {
    fn from(reaction: Reaction) -> Self {
        match reaction {
            Reaction::Unhandled => Outcome::Unhandled,
            _ => Outcome::Handled,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("{0} dependencies exceed the limit of outstanding requests")]
    TooManyDependencies(usize),
    #[error("dependency {0} is not a valid handle")]
    InvalidDependency(Hsmn),
    #[error("dependency {0} declared twice")]
    DuplicateDependency(Hsmn),
}

/// Lifecycle state machine embedded in a component.
///
/// The owner forwards every event to [`Orchestrator::handle`] and acts on
/// the events it leaves [`Reaction::Unhandled`]. The owner's timer index 0
/// and internal indices 0 and 1 are reserved for the orchestrator.
pub struct Orchestrator {
    owner: Hsmn,
    iface: LifecycleInterface,
    deps: Vec<Dependency>,
    state: LifecycleState,
    state_timer: Timer,
    in_req: Option<Evt>,
    pending: Option<PendingConfirmSet>,
}

impl Orchestrator {
    pub fn new(
        owner: Hsmn,
        iface: LifecycleInterface,
        deps: Vec<Dependency>,
        wheel: &TimerWheel,
    ) -> Result<Self, LifecycleError> {
        if deps.len() > EVT_SEQ_REC_LEN {
            return Err(LifecycleError::TooManyDependencies(deps.len()));
        }
        for (i, dep) in deps.iter().enumerate() {
            if !dep.hsmn.is_valid() || dep.hsmn == owner {
                return Err(LifecycleError::InvalidDependency(dep.hsmn));
            }
            if deps[..i].iter().any(|d| d.hsmn == dep.hsmn) {
                return Err(LifecycleError::DuplicateDependency(dep.hsmn));
            }
        }
        Ok(Self {
            owner,
            iface,
            deps,
            state: LifecycleState::Stopped,
            state_timer: wheel.timer(owner, state_timer_signal(owner)),
            in_req: None,
            pending: None,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn iface(&self) -> &LifecycleInterface {
        &self.iface
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.deps
    }

    pub fn pending(&self) -> Option<&PendingConfirmSet> {
        self.pending.as_ref()
    }

    /// Initial transition into Stopped.
    pub fn start(&mut self, ctx: &mut Context<'_>) {
        self.state = LifecycleState::Stopped;
        ctx.set_state(self.state.name());
    }

    pub fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Reaction {
        let sig = e.signal;
        if self.state_timer.fired(e) {
            self.on_deadline(ctx)
        } else if sig == done_signal(self.owner) {
            self.on_done(ctx)
        } else if sig == failed_signal(self.owner) {
            let info = e
                .error_info()
                .unwrap_or(ErrorInfo::new(ErrorKind::Unspecified, self.owner, REASON_UNSPEC));
            self.on_failed(ctx, info)
        } else if sig == self.iface.start_req {
            self.on_start_req(ctx, e)
        } else if sig == self.iface.stop_req {
            self.on_stop_req(ctx, e)
        } else if self.deps.iter().any(|d| d.iface.start_cfm == sig || d.iface.stop_cfm == sig) {
            self.on_dependency_cfm(ctx, e)
        } else {
            Reaction::Unhandled
        }
    }

    fn reply_start(&mut self, ctx: &mut Context<'_>, info: ErrorInfo) {
        if let Some(req) = self.in_req.take() {
            ctx.send_cfm(Evt::error(self.iface.start_cfm, info), &req);
        }
    }

    fn on_start_req(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Reaction {
        if self.state == LifecycleState::Stopped {
            self.in_req = Some(e.clone());
            return self.transition(ctx, LifecycleState::Starting);
        }
        let info = ErrorInfo::new(ErrorKind::WrongState, self.owner, REASON_UNSPEC);
        ctx.send_cfm(Evt::error(self.iface.start_cfm, info), e);
        Reaction::Handled
    }

    fn on_stop_req(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Reaction {
        match self.state {
            LifecycleState::Stopped => {
                ctx.send_cfm(Evt::success(self.iface.stop_cfm), e);
                Reaction::Handled
            }
            LifecycleState::Starting => {
                let info = ErrorInfo::new(ErrorKind::Aborted, self.owner, REASON_UNSPEC);
                self.reply_start(ctx, info);
                self.defer_stop(ctx, e);
                self.transition(ctx, LifecycleState::Stopping)
            }
            LifecycleState::Started => {
                self.defer_stop(ctx, e);
                self.transition(ctx, LifecycleState::Stopping)
            }
            LifecycleState::Stopping => {
                self.defer_stop(ctx, e);
                Reaction::Handled
            }
        }
    }

    /// Keep a StopReq until Stopped. With the defer queue full it is
    /// answered right away with `Unavailable`.
    fn defer_stop(&mut self, ctx: &mut Context<'_>, e: &Evt) {
        if !ctx.defer(e) {
            let info = ErrorInfo::new(ErrorKind::Unavailable, self.owner, REASON_UNSPEC);
            ctx.send_cfm(Evt::error(self.iface.stop_cfm, info), e);
        }
    }

    fn on_dependency_cfm(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Reaction {
        let expected = match self.state {
            LifecycleState::Starting => self.deps.iter().any(|d| d.iface.start_cfm == e.signal),
            LifecycleState::Stopping => self.deps.iter().any(|d| d.iface.stop_cfm == e.signal),
            _ => false,
        };
        let Some(pending) = self.pending.as_mut().filter(|_| expected) else {
            log::debug!(target: ctx.name(), "{}: late confirmation from {} ignored", ctx.name(), e.from);
            return Reaction::Handled;
        };

        match ctx.check_cfm(e) {
            CfmCheck::Stale => {
                log::debug!(
                    target: ctx.name(),
                    "{}: confirmation from {} seq={} does not match",
                    ctx.name(),
                    e.from,
                    e.seq
                );
            }
            CfmCheck::Failed(info) => {
                if pending.record_failure(info) {
                    ctx.raise(Evt::error(failed_signal(self.owner), info));
                }
            }
            CfmCheck::Pending | CfmCheck::AllReceived => {
                if pending.record_success() {
                    ctx.raise(Evt::new(done_signal(self.owner)));
                }
            }
        }
        Reaction::Handled
    }

    fn on_done(&mut self, ctx: &mut Context<'_>) -> Reaction {
        match self.state {
            LifecycleState::Starting => {
                self.reply_start(ctx, ErrorInfo::success());
                self.transition(ctx, LifecycleState::Started)
            }
            LifecycleState::Stopping => self.transition(ctx, LifecycleState::Stopped),
            _ => Reaction::Handled,
        }
    }

    fn on_failed(&mut self, ctx: &mut Context<'_>, info: ErrorInfo) -> Reaction {
        match self.state {
            LifecycleState::Starting => {
                self.reply_start(ctx, info);
                self.transition(ctx, LifecycleState::Stopping)
            }
            LifecycleState::Stopping => {
                ctx.fault(&format!("stop failed: {}", info));
                self.transition(ctx, LifecycleState::Stopped)
            }
            _ => Reaction::Handled,
        }
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> Reaction {
        let info = ErrorInfo::new(ErrorKind::Timeout, self.owner, REASON_UNSPEC);
        self.on_failed(ctx, info)
    }

    fn transition(&mut self, ctx: &mut Context<'_>, to: LifecycleState) -> Reaction {
        let from = self.state;
        self.exit(ctx, from);
        self.state = to;
        ctx.set_state(to.name());
        self.enter(ctx, to);
        Reaction::Transitioned { from, to }
    }

    fn exit(&mut self, ctx: &mut Context<'_>, state: LifecycleState) {
        match state {
            LifecycleState::Starting => {
                self.state_timer.stop();
                self.pending = None;
            }
            LifecycleState::Stopping => {
                self.state_timer.stop();
                self.pending = None;
                ctx.recall();
            }
            LifecycleState::Stopped | LifecycleState::Started => {}
        }
    }

    fn enter(&mut self, ctx: &mut Context<'_>, state: LifecycleState) {
        let starting = match state {
            LifecycleState::Starting => true,
            LifecycleState::Stopping => false,
            LifecycleState::Stopped | LifecycleState::Started => return,
        };
        let timeout_ms = if starting {
            self.iface.start_timeout_ms
        } else {
            self.iface.stop_timeout_ms
        };
        self.pending = Some(PendingConfirmSet::new(self.deps.len()));
        self.state_timer.start(timeout_ms, TimerKind::Once);
        ctx.clear_requests();
        for dep in &self.deps {
            let req = if starting {
                Evt::request(dep.iface.start_req, dep.iface.start_timeout_ms)
            } else {
                Evt::request(dep.iface.stop_req, dep.iface.stop_timeout_ms)
            };
            ctx.send_req(req, dep.hsmn, false);
        }
        if self.deps.is_empty() {
            ctx.raise(Evt::new(done_signal(self.owner)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Hsmn = Hsmn(2);

    fn dep(n: u8) -> Dependency {
        Dependency::new(Hsmn(n), LifecycleInterface::new(Hsmn(n), 0, 100, 100))
    }

    fn iface() -> LifecycleInterface {
        LifecycleInterface::new(OWNER, 0, 200, 200)
    }

    #[test]
    fn test_first_failure_wins() {
        let mut set = PendingConfirmSet::new(3);
        assert!(!set.record_success());
        let first = ErrorInfo::new(ErrorKind::HardwareError, Hsmn(4), 1);
        assert!(set.record_failure(first));
        assert!(!set.record_failure(ErrorInfo::new(ErrorKind::Timeout, Hsmn(5), 0)));
        assert_eq!(set.first_error(), Some(first));
        assert_eq!(set.received(), 3);
    }

    #[test]
    fn test_done_only_on_last_success() {
        let mut set = PendingConfirmSet::new(2);
        assert!(!set.record_success());
        assert!(set.record_success());
    }

    #[test]
    fn test_dependency_validation() {
        let wheel = TimerWheel::new(10);
        let dup = Orchestrator::new(OWNER, iface(), vec![dep(3), dep(3)], &wheel);
        assert_eq!(dup.err(), Some(LifecycleError::DuplicateDependency(Hsmn(3))));

        let own = Orchestrator::new(OWNER, iface(), vec![dep(2)], &wheel);
        assert_eq!(own.err(), Some(LifecycleError::InvalidDependency(OWNER)));

        let many: Vec<_> = (3..3 + EVT_SEQ_REC_LEN as u8 + 1).map(dep).collect();
        let too_many = Orchestrator::new(OWNER, iface(), many, &wheel);
        assert_eq!(too_many.err(), Some(LifecycleError::TooManyDependencies(17)));

        let ok = Orchestrator::new(OWNER, iface(), vec![dep(3), dep(4)], &wheel).unwrap();
        assert_eq!(ok.state(), LifecycleState::Stopped);
        assert_eq!(ok.dependencies().len(), 2);
        assert!(ok.pending().is_none());
    }

    #[test]
    fn test_reserved_signals() {
        assert_eq!(done_signal(OWNER), Signal::internal(OWNER, 0));
        assert_eq!(failed_signal(OWNER), Signal::internal(OWNER, 1));
        assert!(state_timer_signal(OWNER).is_timer());
        assert_eq!(Outcome::from(Reaction::Unhandled), Outcome::Unhandled);
        let moved = Reaction::Transitioned {
            from: LifecycleState::Stopped,
            to: LifecycleState::Starting,
        };
        assert_eq!(Outcome::from(moved), Outcome::Handled);
        assert!(LifecycleState::Stopping.is_busy());
        assert_eq!(LifecycleState::Started.to_string(), "Started");
    }
}
