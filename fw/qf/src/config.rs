//! Framework configuration

use fw_core::MAX_HSM_COUNT;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest priority an active may be given. Priorities start at 1.
pub const MAX_PRIORITY: u8 = 31;
/// Maximum number of regions hosted by one active
pub const MAX_REGION_COUNT: usize = 8;
/// Capacity of each component's defer queue
pub const DEFER_QUEUE_LEN: usize = 16;
/// Capacity of each component's reminder queue
pub const REMINDER_QUEUE_LEN: usize = 4;
/// Maximum number of outstanding requests tracked per component
pub const EVT_SEQ_REC_LEN: usize = 16;

/// What to do when a component detects an unrecoverable internal fault.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Panic, the hosted equivalent of the assertion handler.
    #[default]
    Panic,
    /// Log the fault, keep it in the registry and let the component recover.
    Record,
}

/// Configuration for the framework and its kernel.
#[derive(Debug, Clone)]
pub struct FwConfig {
    pub name: &'static str,
    /// Size of the handle tables, at most [`MAX_HSM_COUNT`]
    pub max_hsm_count: usize,
    /// Capacity of each active's event queue
    pub event_queue_capacity: usize,
    pub ms_per_tick: u32,
    /// Diagnostics verbosity, 0 (off) to 5 (trace)
    pub verbosity: u8,
    pub fault_policy: FaultPolicy,
    pub idle_callback: Option<fn()>,
}

impl Default for FwConfig {
    fn default() -> Self {
        Self {
            name: "FW",
            max_hsm_count: MAX_HSM_COUNT,
            event_queue_capacity: 64,
            ms_per_tick: 10,
            verbosity: 3,
            fault_policy: FaultPolicy::Panic,
            idle_callback: None,
        }
    }
}

impl FwConfig {
    pub fn builder() -> FwConfigBuilder {
        FwConfigBuilder::default()
    }
}

/// Builder for [`FwConfig`].
#[derive(Debug, Clone, Default)]
pub struct FwConfigBuilder {
    config: FwConfig,
}

impl FwConfigBuilder {
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    pub fn max_hsm_count(mut self, count: usize) -> Self {
        self.config.max_hsm_count = count;
        self
    }

    pub fn event_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.event_queue_capacity = capacity;
        self
    }

    pub fn ms_per_tick(mut self, ms: u32) -> Self {
        self.config.ms_per_tick = ms;
        self
    }

    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    pub fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.config.fault_policy = policy;
        self
    }

    /// Called each time the kernel runs out of events.
    pub fn idle_callback(mut self, callback: fn()) -> Self {
        self.config.idle_callback = Some(callback);
        self
    }

    pub fn build(self) -> FwConfig {
        self.config
    }
}
