//! Cooperative priority kernel
//!
//! Stands in for the preemptive scheduler: every call to
//! [`Kernel::dispatch_once`] runs one event to completion in the highest
//! priority active that has one queued. Time advances only when the caller
//! ticks the kernel, which keeps timing deterministic in tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use fw_core::{FwError, Hsmn, MAX_HSM_COUNT};
use thiserror::Error;

use crate::active::Active;
use crate::config::FwConfig;
use crate::event::Evt;
use crate::framework::{Entry, Framework};
use crate::time::TimerWheel;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Framework(#[from] FwError),
    #[error("invalid configuration: {0}")]
    Config(&'static str),
}

pub struct KernelBuilder {
    config: FwConfig,
    actives: Vec<Active>,
    wheel: Arc<TimerWheel>,
}

impl KernelBuilder {
    pub fn new(config: FwConfig) -> Self {
        let wheel = TimerWheel::new(config.ms_per_tick);
        Self {
            config,
            actives: Vec::new(),
            wheel,
        }
    }

    /// Timer wheel the kernel will tick. Components create their timers
    /// from it before being registered.
    pub fn timer_wheel(&self) -> Arc<TimerWheel> {
        Arc::clone(&self.wheel)
    }

    pub fn active(mut self, active: Active) -> Self {
        self.actives.push(active);
        self
    }

    /// Validate priorities and handles and freeze the registry.
    pub fn build(mut self) -> Result<Kernel, KernelError> {
        let max_hsm_count = self.config.max_hsm_count;
        if max_hsm_count < 2 || max_hsm_count > MAX_HSM_COUNT {
            return Err(KernelError::Config("max_hsm_count must be within 2..=64"));
        }
        if self.config.event_queue_capacity == 0 {
            return Err(KernelError::Config("event_queue_capacity must be non-zero"));
        }
        if self.config.ms_per_tick == 0 {
            return Err(KernelError::Config("ms_per_tick must be non-zero"));
        }

        let mut table: Vec<Option<Entry>> = (0..max_hsm_count).map(|_| None).collect();
        let mut priorities = BTreeSet::new();
        for active in self.actives.iter_mut() {
            let entries = active.bind(&self.config)?;
            if !priorities.insert(active.priority()) {
                return Err(FwError::DuplicatePriority(active.priority()).into());
            }
            for (hsmn, entry) in entries {
                if !hsmn.is_valid() || hsmn.index() >= max_hsm_count {
                    return Err(FwError::InvalidHsmn(hsmn).into());
                }
                let slot = &mut table[hsmn.index()];
                if slot.is_some() {
                    return Err(FwError::DuplicateHsmn(hsmn).into());
                }
                *slot = Some(entry);
            }
        }

        self.actives.sort_by_key(|active| active.priority());
        let fw = Arc::new(Framework::new(self.config, table));
        log::info!(
            "{}: {} actives, {} handles registered",
            fw.config().name,
            self.actives.len(),
            fw.handles().count()
        );
        Ok(Kernel {
            fw,
            actives: self.actives.into_iter().map(Arc::new).collect(),
            wheel: self.wheel,
        })
    }
}

pub struct Kernel {
    fw: Arc<Framework>,
    actives: Vec<Arc<Active>>,
    wheel: Arc<TimerWheel>,
}

impl Kernel {
    pub fn builder(config: FwConfig) -> KernelBuilder {
        KernelBuilder::new(config)
    }

    pub fn config(&self) -> &FwConfig {
        self.fw.config()
    }

    /// Shared registry; clone it to post from another thread.
    pub fn framework(&self) -> &Arc<Framework> {
        &self.fw
    }

    pub fn timer_wheel(&self) -> &Arc<TimerWheel> {
        &self.wheel
    }

    pub fn name(&self, hsmn: Hsmn) -> &'static str {
        self.fw.name(hsmn)
    }

    pub fn state(&self, hsmn: Hsmn) -> &'static str {
        self.fw.state(hsmn)
    }

    /// Run the initial transitions, highest priority first.
    pub fn start(&self) {
        for active in self.actives.iter().rev() {
            active.start(&self.fw);
        }
    }

    /// Shut every component down, lowest priority first.
    pub fn stop(&self) {
        for active in self.actives.iter() {
            active.stop(&self.fw);
        }
    }

    pub fn post(&self, e: Evt) -> Result<(), KernelError> {
        self.fw.post(e)?;
        Ok(())
    }

    pub fn dispatch_once(&self) -> bool {
        let candidate = self
            .actives
            .iter()
            .rev()
            .find(|active| active.has_events())
            .cloned();

        match candidate {
            Some(active) => active.dispatch_one(&self.fw),
            None => false,
        }
    }

    pub fn run_until_idle(&self) {
        while self.dispatch_once() {}
        if let Some(idle_cb) = self.fw.config().idle_callback {
            idle_cb();
        }
    }

    /// Advance time by one tick and post the expiries. Does not dispatch.
    pub fn tick(&self) {
        for e in self.wheel.tick() {
            if let Err(err) = self.fw.post(e) {
                log::warn!("timer expiry dropped: {}", err);
            }
        }
    }

    /// Advance time by `ms`, running to idle after every tick.
    pub fn advance_ms(&self, ms: u32) {
        let ticks = ms.div_ceil(self.wheel.ms_per_tick());
        for _ in 0..ticks {
            self.tick();
            self.run_until_idle();
        }
    }

    pub fn has_events(&self) -> bool {
        self.actives.iter().any(|active| active.has_events())
    }
}
