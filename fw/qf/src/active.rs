//! Active and Region containers
//!
//! An [`Active`] owns an event queue and a thread of control (a slot in the
//! cooperative kernel). It hosts one main component and up to
//! [`MAX_REGION_COUNT`] regions. Regions have no queue of their own: events
//! addressed to them land in the host's queue and are routed to them by
//! destination handle, synchronously, on the host's dispatch.

use std::sync::Arc;

use fw_core::{FwError, FwResult, Hsmn};
use fw_mem::{Map, MapError};
use parking_lot::Mutex;

use crate::component::{Component, Outcome};
use crate::config::{FwConfig, MAX_PRIORITY, MAX_REGION_COUNT};
use crate::event::Evt;
use crate::framework::{Entry, Framework};
use crate::hsm::{Context, HsmCore};
use crate::queue::EventQueue;

/// Queue capacity used until the kernel applies its configuration
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 64;

/// A component together with the runtime state kept on its behalf.
struct Slot {
    component: Box<dyn Component>,
    core: HsmCore,
}

impl Slot {
    fn new(component: Box<dyn Component>) -> Self {
        let core = HsmCore::new(component.hsmn(), component.name());
        Self { component, core }
    }

    fn start(&mut self, fw: &Framework) {
        let mut ctx = Context::new(fw, &mut self.core);
        self.component.start(&mut ctx);
        self.drain_reminders(fw);
    }

    fn stop(&mut self, fw: &Framework) {
        let mut ctx = Context::new(fw, &mut self.core);
        self.component.stop(&mut ctx);
    }

    fn dispatch(&mut self, fw: &Framework, e: &Evt) {
        self.deliver(fw, e);
        self.drain_reminders(fw);
    }

    fn drain_reminders(&mut self, fw: &Framework) {
        while let Some(reminder) = self.core.take_reminder() {
            self.deliver(fw, &reminder);
        }
    }

    fn deliver(&mut self, fw: &Framework, e: &Evt) {
        let hsmn = self.core.hsmn();
        fw.log().event(fw, hsmn, e);
        let mut ctx = Context::new(fw, &mut self.core);
        if self.component.handle(&mut ctx, e) == Outcome::Unhandled {
            fw.log().unhandled(fw, hsmn, e);
        }
    }
}

struct ActiveInner {
    main: Slot,
    regions: Vec<Slot>,
    routes: Map<Hsmn, usize, MAX_REGION_COUNT>,
}

pub struct Active {
    hsmn: Hsmn,
    priority: u8,
    queue: Arc<EventQueue>,
    inner: Mutex<ActiveInner>,
}

impl Active {
    pub fn new(component: Box<dyn Component>, priority: u8) -> Self {
        let hsmn = component.hsmn();
        Self {
            hsmn,
            priority,
            queue: Arc::new(EventQueue::new(hsmn, DEFAULT_EVENT_QUEUE_CAPACITY)),
            inner: Mutex::new(ActiveInner {
                main: Slot::new(component),
                regions: Vec::new(),
                routes: Map::new(Hsmn::UNDEF, 0),
            }),
        }
    }

    /// Host `component` as a region of this active.
    pub fn region(self, component: Box<dyn Component>) -> Self {
        self.inner.lock().regions.push(Slot::new(component));
        self
    }

    pub fn hsmn(&self) -> Hsmn {
        self.hsmn
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn region_count(&self) -> usize {
        self.inner.lock().regions.len()
    }

    pub fn has_events(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Validate the active and produce its registry entries.
    pub(crate) fn bind(&mut self, config: &FwConfig) -> FwResult<Vec<(Hsmn, Entry)>> {
        if self.priority == 0 || self.priority > MAX_PRIORITY {
            return Err(FwError::InvalidPriority(self.priority));
        }
        self.queue = Arc::new(EventQueue::new(self.hsmn, config.event_queue_capacity));

        let inner = self.inner.get_mut();
        if inner.regions.len() > MAX_REGION_COUNT {
            return Err(FwError::RegionLimit(self.hsmn));
        }
        inner.routes.reset();
        for (index, region) in inner.regions.iter().enumerate() {
            let hsmn = region.core.hsmn();
            inner.routes.save(hsmn, index).map_err(|err| match err {
                MapError::Full => FwError::RegionLimit(self.hsmn),
                MapError::UnusedKey => FwError::InvalidHsmn(hsmn),
                _ => FwError::DuplicateHsmn(hsmn),
            })?;
        }

        let container = self.hsmn;
        let queue = &self.queue;
        let entries = std::iter::once(&inner.main)
            .chain(inner.regions.iter())
            .map(|slot| {
                let entry = Entry {
                    name: slot.core.name(),
                    container,
                    queue: Arc::clone(queue),
                    state: slot.core.state_cell(),
                    evt_set: slot.component.evt_set(),
                };
                (slot.core.hsmn(), entry)
            })
            .collect();
        Ok(entries)
    }

    /// Run the initial transition of the main component, then of each region.
    pub fn start(&self, fw: &Framework) {
        let mut inner = self.inner.lock();
        inner.main.start(fw);
        for region in inner.regions.iter_mut() {
            region.start(fw);
        }
    }

    pub fn stop(&self, fw: &Framework) {
        let mut inner = self.inner.lock();
        for region in inner.regions.iter_mut().rev() {
            region.stop(fw);
        }
        inner.main.stop(fw);
    }

    /// Dispatch one queued event. Returns false if the queue was empty.
    pub fn dispatch_one(&self, fw: &Framework) -> bool {
        let Some(e) = self.queue.pop() else {
            return false;
        };
        if e.is_stale_timer() {
            log::trace!(
                target: fw.name(self.hsmn),
                "{}: stale {} discarded",
                fw.name(e.to),
                fw.event_name(e.signal)
            );
            return true;
        }

        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        if e.to == self.hsmn || e.to == Hsmn::UNDEF {
            inner.main.dispatch(fw, &e);
        } else if let Some(&index) = inner.routes.get_by_key(&e.to) {
            inner.regions[index].dispatch(fw, &e);
        } else {
            log::warn!(
                target: fw.name(self.hsmn),
                "{}: no region {} for {}, event dropped",
                fw.name(self.hsmn),
                e.to,
                fw.event_name(e.signal)
            );
        }
        true
    }
}
