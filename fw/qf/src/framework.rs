//! Immutable handle registry
//!
//! The registry is built once by the [`KernelBuilder`](crate::kernel::KernelBuilder)
//! before any event flows and is shared by reference afterwards. Each
//! registered handle maps in O(1) to its name, the handle of the active that
//! hosts it, that active's queue, its current state name and the names of
//! the signals it owns.

use std::fmt;
use std::sync::Arc;

use fw_core::{FwError, FwResult, Hsmn, Signal};
use parking_lot::Mutex;

use crate::config::{FaultPolicy, FwConfig};
use crate::diag::Log;
use crate::event::{builtin_name, Evt, EvtSet};
use crate::hsm::StateCell;
use crate::queue::EventQueue;

/// Name reported for handles and signals with no registered name
pub const UNDEF_NAME: &str = "UNDEF";

/// A fault recorded under [`FaultPolicy::Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub hsmn: Hsmn,
    pub state: &'static str,
    pub detail: String,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HSMN {} in {}: {}", self.hsmn, self.state, self.detail)
    }
}

pub(crate) struct Entry {
    pub name: &'static str,
    pub container: Hsmn,
    pub queue: Arc<EventQueue>,
    pub state: StateCell,
    pub evt_set: EvtSet,
}

pub struct Framework {
    config: FwConfig,
    table: Vec<Option<Entry>>,
    log: Log,
    faults: Mutex<Vec<Fault>>,
}

impl Framework {
    pub(crate) fn new(config: FwConfig, table: Vec<Option<Entry>>) -> Self {
        let log = Log::new(config.verbosity);
        Self {
            config,
            table,
            log,
            faults: Mutex::new(Vec::new()),
        }
    }

    fn entry(&self, hsmn: Hsmn) -> Option<&Entry> {
        self.table.get(hsmn.index()).and_then(Option::as_ref)
    }

    pub fn config(&self) -> &FwConfig {
        &self.config
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn is_registered(&self, hsmn: Hsmn) -> bool {
        self.entry(hsmn).is_some()
    }

    /// Registered handles in ascending order
    pub fn handles(&self) -> impl Iterator<Item = Hsmn> + '_ {
        self.table
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(i, _)| Hsmn::new(i as u8))
    }

    pub fn name(&self, hsmn: Hsmn) -> &'static str {
        self.entry(hsmn).map_or(UNDEF_NAME, |entry| entry.name)
    }

    /// Current state name of `hsmn`
    pub fn state(&self, hsmn: Hsmn) -> &'static str {
        self.entry(hsmn).map_or(UNDEF_NAME, |entry| *entry.state.lock())
    }

    /// Handle of the active hosting `hsmn`
    pub fn container(&self, hsmn: Hsmn) -> Option<Hsmn> {
        self.entry(hsmn).map(|entry| entry.container)
    }

    pub fn event_name(&self, signal: Signal) -> &'static str {
        if signal.is_builtin() {
            return builtin_name(signal).unwrap_or(UNDEF_NAME);
        }
        self.entry(signal.hsmn())
            .and_then(|entry| entry.evt_set.name(signal))
            .unwrap_or(UNDEF_NAME)
    }

    fn queue_of(&self, to: Hsmn) -> FwResult<&Arc<EventQueue>> {
        if !to.is_valid() {
            return Err(FwError::InvalidHsmn(to));
        }
        self.entry(to)
            .map(|entry| &entry.queue)
            .ok_or(FwError::Unroutable(to))
    }

    /// Post `e` to the queue of the active hosting `e.to`.
    ///
    /// Safe to call from any thread.
    pub fn post(&self, e: Evt) -> FwResult<()> {
        self.queue_of(e.to)?.post(e)
    }

    /// Post `e` ahead of everything queued at the active hosting `e.to`.
    pub fn post_front(&self, e: Evt) -> FwResult<()> {
        self.queue_of(e.to)?.post_front(e)
    }

    /// True if an event matching `pred` is queued at the active hosting `to`.
    pub fn queued(&self, to: Hsmn, pred: impl Fn(&Evt) -> bool) -> bool {
        self.queue_of(to).map_or(false, |q| q.contains(pred))
    }

    /// Handle an unrecoverable fault of `hsmn` per the configured policy.
    pub fn fault(&self, hsmn: Hsmn, detail: &str) {
        let fault = Fault {
            hsmn,
            state: self.state(hsmn),
            detail: detail.to_owned(),
        };
        match self.config.fault_policy {
            FaultPolicy::Panic => panic!("{}: fault {}", self.name(hsmn), fault),
            FaultPolicy::Record => {
                log::error!(target: self.name(hsmn), "{}: fault {}", self.name(hsmn), fault);
                self.faults.lock().push(fault);
            }
        }
    }

    pub fn faults(&self) -> Vec<Fault> {
        self.faults.lock().clone()
    }
}
