//! Timer services
//!
//! A [`TimerWheel`] owns every time event of the system and is ticked by
//! the kernel. Components hold a [`Timer`] handle bound to one owner and one
//! timer signal. Each expiry is stamped with the generation of the timer at
//! the time it fired; stopping or restarting bumps the generation so an
//! expiry already sitting in a queue is recognised as stale and dropped at
//! dispatch instead of being purged from the queue.

use std::fmt;
use std::sync::Arc;

use fw_core::{Hsmn, Signal};
use parking_lot::Mutex;

use crate::event::{Body, Evt};

/// Whether a timer re-arms itself after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Once,
    Periodic,
}

struct TimeEventInner {
    remaining: u64,
    interval: Option<u64>,
    armed: bool,
    generation: u32,
}

/// Software time event
pub struct TimeEvent {
    owner: Hsmn,
    signal: Signal,
    inner: Mutex<TimeEventInner>,
}

impl TimeEvent {
    fn new(owner: Hsmn, signal: Signal) -> Arc<Self> {
        Arc::new(Self {
            owner,
            signal,
            inner: Mutex::new(TimeEventInner {
                remaining: 0,
                interval: None,
                armed: false,
                generation: 0,
            }),
        })
    }

    pub fn owner(&self) -> Hsmn {
        self.owner
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn arm(&self, timeout_ticks: u64, interval_ticks: Option<u64>) {
        let mut inner = self.inner.lock();
        inner.remaining = timeout_ticks.max(1);
        inner.interval = interval_ticks.map(|t| t.max(1));
        inner.armed = true;
        inner.generation = inner.generation.wrapping_add(1);
    }

    /// Disarm and invalidate any expiry already posted.
    ///
    /// Returns whether the event was armed.
    pub fn disarm(&self) -> bool {
        let mut inner = self.inner.lock();
        let was_armed = inner.armed;
        inner.armed = false;
        inner.remaining = 0;
        inner.generation = inner.generation.wrapping_add(1);
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().armed
    }

    pub fn generation(&self) -> u32 {
        self.inner.lock().generation
    }

    /// Advance by one tick, returning the expiry event if it fired.
    pub fn poll(self: &Arc<Self>) -> Option<Evt> {
        let mut inner = self.inner.lock();
        if !inner.armed {
            return None;
        }

        if inner.remaining > 0 {
            inner.remaining -= 1;
        }
        if inner.remaining != 0 {
            return None;
        }

        match inner.interval {
            Some(period) => inner.remaining = period,
            None => inner.armed = false,
        }
        let stamp = TimerStamp {
            event: Arc::clone(self),
            generation: inner.generation,
        };
        drop(inner);

        Some(
            Evt::new(self.signal)
                .with_to(self.owner)
                .with_from(self.owner)
                .with_body(Body::Timer(stamp)),
        )
    }
}

impl fmt::Debug for TimeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TimeEvent")
            .field("owner", &self.owner)
            .field("signal", &self.signal)
            .field("armed", &inner.armed)
            .field("remaining", &inner.remaining)
            .finish()
    }
}

/// Identifies the arming of a timer that produced an expiry event.
#[derive(Clone)]
pub struct TimerStamp {
    event: Arc<TimeEvent>,
    generation: u32,
}

impl TimerStamp {
    /// False once the timer has been stopped or restarted since it fired.
    pub fn is_current(&self) -> bool {
        self.event.generation() == self.generation
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for TimerStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerStamp")
            .field("signal", &self.event.signal)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Component side handle of a time event.
#[derive(Clone)]
pub struct Timer {
    event: Arc<TimeEvent>,
    ms_per_tick: u32,
}

impl Timer {
    pub fn signal(&self) -> Signal {
        self.event.signal
    }

    pub fn owner(&self) -> Hsmn {
        self.event.owner
    }

    /// Number of ticks covering `ms`, rounded up.
    pub fn ticks(&self, ms: u32) -> u64 {
        u64::from(ms).div_ceil(u64::from(self.ms_per_tick))
    }

    /// Arm for `ms`. Restarting an armed timer replaces the remaining time.
    pub fn start(&self, ms: u32, kind: TimerKind) {
        let ticks = self.ticks(ms);
        let interval = match kind {
            TimerKind::Once => None,
            TimerKind::Periodic => Some(ticks),
        };
        log::trace!(
            "timer {} of {} armed for {} ticks ({:?})",
            self.event.signal,
            self.event.owner,
            ticks,
            kind
        );
        self.event.arm(ticks, interval);
    }

    pub fn restart(&self, ms: u32, kind: TimerKind) {
        self.stop();
        self.start(ms, kind);
    }

    /// Disarm. A no-op for an unarmed timer apart from discarding an expiry
    /// that is still queued.
    pub fn stop(&self) {
        self.event.disarm();
    }

    pub fn is_armed(&self) -> bool {
        self.event.is_armed()
    }

    /// True if `e` is a live expiry of this timer.
    pub fn fired(&self, e: &Evt) -> bool {
        e.signal == self.event.signal
            && e.timer_stamp()
                .map_or(false, |stamp| Arc::ptr_eq(&stamp.event, &self.event) && stamp.is_current())
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Timer").field(&self.event).finish()
    }
}

/// Registry of all time events, ticked once per system tick.
pub struct TimerWheel {
    ms_per_tick: u32,
    events: Mutex<Vec<Arc<TimeEvent>>>,
}

impl TimerWheel {
    pub fn new(ms_per_tick: u32) -> Arc<Self> {
        Arc::new(Self {
            ms_per_tick: ms_per_tick.max(1),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn ms_per_tick(&self) -> u32 {
        self.ms_per_tick
    }

    /// Create a timer posting `signal` to `owner` on expiry.
    pub fn timer(&self, owner: Hsmn, signal: Signal) -> Timer {
        let event = TimeEvent::new(owner, signal);
        self.events.lock().push(Arc::clone(&event));
        Timer {
            event,
            ms_per_tick: self.ms_per_tick,
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance every time event by one tick and collect the expiries.
    ///
    /// Time events whose [`Timer`] has been dropped are pruned first.
    pub fn tick(&self) -> Vec<Evt> {
        let events = {
            let mut events = self.events.lock();
            events.retain(|event| Arc::strong_count(event) > 1);
            events.clone()
        };
        events.iter().filter_map(|event| event.poll()).collect()
    }
}
