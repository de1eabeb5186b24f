//! Per-component runtime state and the handler context
//!
//! Every hosted component gets an [`HsmCore`] holding what the framework
//! keeps on its behalf: the sequence counter, the defer and reminder queues,
//! the record of outstanding requests and its current state name. Handlers
//! reach these, and the rest of the system, through a [`Context`].

use std::sync::Arc;

use fw_core::{FwError, Hsmn, Sequence};
use fw_mem::SeqRec;
use heapless::Deque;
use parking_lot::Mutex;

use crate::config::{DEFER_QUEUE_LEN, EVT_SEQ_REC_LEN, REMINDER_QUEUE_LEN};
use crate::event::{ErrorInfo, Evt};
use crate::framework::Framework;

/// Current state name of a component, readable from the registry.
pub type StateCell = Arc<Mutex<&'static str>>;

/// Name reported for a component that has not run its initial transition.
pub const INITIAL_STATE: &str = "Initial";

pub struct HsmCore {
    hsmn: Hsmn,
    name: &'static str,
    next_seq: Sequence,
    state: StateCell,
    defer: Deque<Evt, DEFER_QUEUE_LEN>,
    reminders: Deque<Evt, REMINDER_QUEUE_LEN>,
    evt_seq: SeqRec<Hsmn, EVT_SEQ_REC_LEN>,
}

impl HsmCore {
    pub fn new(hsmn: Hsmn, name: &'static str) -> Self {
        Self {
            hsmn,
            name,
            next_seq: 0,
            state: Arc::new(Mutex::new(INITIAL_STATE)),
            defer: Deque::new(),
            reminders: Deque::new(),
            evt_seq: SeqRec::new(Hsmn::UNDEF),
        }
    }

    pub fn hsmn(&self) -> Hsmn {
        self.hsmn
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> &'static str {
        *self.state.lock()
    }

    pub(crate) fn state_cell(&self) -> StateCell {
        Arc::clone(&self.state)
    }

    pub(crate) fn take_reminder(&mut self) -> Option<Evt> {
        self.reminders.pop_front()
    }

    pub fn deferred_count(&self) -> usize {
        self.defer.len()
    }
}

/// Result of matching a confirmation against the outstanding requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfmCheck {
    /// No outstanding request matches its origin and sequence
    Stale,
    /// Matched and reports a failure
    Failed(ErrorInfo),
    /// Matched; other confirmations are still outstanding
    Pending,
    /// Matched; it was the last outstanding one
    AllReceived,
}

/// Handler view of the framework for one component.
pub struct Context<'a> {
    fw: &'a Framework,
    core: &'a mut HsmCore,
}

impl<'a> Context<'a> {
    pub fn new(fw: &'a Framework, core: &'a mut HsmCore) -> Self {
        Self { fw, core }
    }

    pub fn hsmn(&self) -> Hsmn {
        self.core.hsmn
    }

    pub fn name(&self) -> &'static str {
        self.core.name
    }

    pub fn framework(&self) -> &Framework {
        self.fw
    }

    pub fn state(&self) -> &'static str {
        self.core.state()
    }

    /// Publish the name of the state just entered.
    pub fn set_state(&mut self, state: &'static str) {
        let prev = std::mem::replace(&mut *self.core.state.lock(), state);
        if prev != state {
            self.fw.log().state_change(self.fw, self.core.hsmn, prev, state);
        }
    }

    pub fn gen_seq(&mut self) -> Sequence {
        let seq = self.core.next_seq;
        self.core.next_seq = seq.wrapping_add(1);
        seq
    }

    fn deliver(&self, e: Evt, front: bool) {
        let result = if front {
            self.fw.post_front(e)
        } else {
            self.fw.post(e)
        };
        match result {
            Ok(()) => {}
            Err(FwError::Unroutable(to)) | Err(FwError::InvalidHsmn(to)) => {
                log::warn!(target: self.core.name, "{}: no route to {}, event dropped", self.core.name, to);
            }
            Err(err) => self.fw.fault(self.core.hsmn, &err.to_string()),
        }
    }

    /// Send `e` to `to` with a fresh sequence number, which is returned.
    pub fn send(&mut self, e: Evt, to: Hsmn) -> Sequence {
        let seq = self.gen_seq();
        self.send_seq(e, to, seq);
        seq
    }

    /// Send `e` to `to` with an explicit sequence number.
    pub fn send_seq(&mut self, mut e: Evt, to: Hsmn, seq: Sequence) {
        e.to = to;
        e.from = self.core.hsmn;
        e.seq = seq;
        self.deliver(e, false);
    }

    /// Send unless an event with the same signal from this component is
    /// still queued at the destination. Returns whether it was sent.
    pub fn send_not_in_queue(&mut self, e: Evt, to: Hsmn) -> bool {
        let from = self.core.hsmn;
        let signal = e.signal;
        let queued = self
            .fw
            .queued(to, |q| q.signal == signal && q.to == to && q.from == from);
        if queued {
            return false;
        }
        self.send(e, to);
        true
    }

    /// Send a request and record its sequence as outstanding for `to`.
    /// `reset` discards the record of any earlier fan-out first.
    pub fn send_req(&mut self, e: Evt, to: Hsmn, reset: bool) -> Sequence {
        let seq = self.gen_seq();
        if let Err(err) = self.core.evt_seq.save(to, seq, reset) {
            let detail = format!("cannot record request to {}: {}", to, err);
            self.fw.fault(self.core.hsmn, &detail);
        }
        self.send_seq(e, to, seq);
        seq
    }

    /// Reply to `req`, echoing its sequence number.
    pub fn send_cfm(&mut self, e: Evt, req: &Evt) {
        self.send_seq(e, req.from, req.seq);
    }

    /// Match a confirmation against the outstanding requests. A matching
    /// confirmation is consumed and will be reported `Stale` if seen again.
    pub fn check_cfm(&mut self, cfm: &Evt) -> CfmCheck {
        if !self.core.evt_seq.matches(cfm.from, cfm.seq) {
            return CfmCheck::Stale;
        }
        let info = cfm.error_info().unwrap_or_default();
        if !info.is_success() {
            CfmCheck::Failed(info.or_origin(cfm.from))
        } else if self.core.evt_seq.is_all_cleared() {
            CfmCheck::AllReceived
        } else {
            CfmCheck::Pending
        }
    }

    /// Forget all outstanding requests.
    pub fn clear_requests(&mut self) {
        self.core.evt_seq.reset();
    }

    /// Queue `e` for this component; it is dispatched right after the
    /// current handler returns, ahead of any other event.
    pub fn raise(&mut self, mut e: Evt) {
        e.to = self.core.hsmn;
        e.from = self.core.hsmn;
        if self.core.reminders.push_back(e).is_err() {
            self.fw.fault(self.core.hsmn, "reminder queue full");
        }
    }

    /// Keep a copy of `e` until [`Context::recall`]. Returns false if the
    /// defer queue is full.
    pub fn defer(&mut self, e: &Evt) -> bool {
        if self.core.defer.push_back(e.clone()).is_err() {
            log::error!(target: self.core.name, "{}: defer queue full", self.core.name);
            return false;
        }
        true
    }

    /// Re-inject every deferred event at the front of the container queue,
    /// preserving the order they were deferred in.
    pub fn recall(&mut self) {
        while let Some(e) = self.core.defer.pop_back() {
            self.deliver(e, true);
        }
    }

    /// Report an unrecoverable fault according to the configured policy.
    pub fn fault(&mut self, detail: &str) {
        self.fw.fault(self.core.hsmn, detail);
    }
}
