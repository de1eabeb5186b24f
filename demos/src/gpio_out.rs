//! GPIO output driven by a repeating on/off pattern

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use fw_lifecycle::{LifecycleState, Orchestrator, Reaction, INTERNAL_EVT_NAMES};
use fw_qf::{Component, Context, Evt, EvtSet, Hsmn, Outcome, Timer, TimerKind, TimerWheel};

use crate::handles::{lifecycle_names, GPIO_OUT, GPIO_OUT_IFACE, GPIO_OUT_INTERVAL_TIMER};
use crate::DemoError;

const EVT_SET: EvtSet = EvtSet {
    timer: &["GPIO_OUT_STATE_TIMER", "GPIO_OUT_INTERVAL_TIMER"],
    internal: INTERNAL_EVT_NAMES,
    interface: lifecycle_names!("GPIO_OUT"),
};

/// One step of a pattern: drive the line to `level` for `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub level: bool,
    pub duration_ms: u32,
}

impl Interval {
    pub const fn new(level: bool, duration_ms: u32) -> Self {
        Self { level, duration_ms }
    }
}

/// Short blink every second.
pub const HEARTBEAT_PATTERN: &[Interval] = &[Interval::new(true, 200), Interval::new(false, 800)];

/// The output line, readable from outside the component.
#[derive(Debug, Default)]
pub struct GpioLine {
    level: AtomicBool,
    edges: AtomicU32,
}

impl GpioLine {
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    /// Number of level changes since creation
    pub fn edges(&self) -> u32 {
        self.edges.load(Ordering::Acquire)
    }

    fn drive(&self, level: bool) {
        if self.level.swap(level, Ordering::AcqRel) != level {
            self.edges.fetch_add(1, Ordering::AcqRel);
        }
    }
}

pub struct GpioOut {
    orch: Orchestrator,
    interval_timer: Timer,
    pattern: &'static [Interval],
    index: usize,
    line: Arc<GpioLine>,
}

impl GpioOut {
    pub fn new(
        wheel: &TimerWheel,
        pattern: &'static [Interval],
        line: Arc<GpioLine>,
    ) -> Result<Self, DemoError> {
        Ok(Self {
            orch: Orchestrator::new(GPIO_OUT, GPIO_OUT_IFACE, Vec::new(), wheel)?,
            interval_timer: wheel.timer(GPIO_OUT, GPIO_OUT_INTERVAL_TIMER),
            pattern,
            index: 0,
            line,
        })
    }

    fn apply(&mut self) {
        if let Some(step) = self.pattern.get(self.index) {
            self.line.drive(step.level);
            self.interval_timer.start(step.duration_ms, TimerKind::Once);
        }
    }
}

impl Component for GpioOut {
    fn hsmn(&self) -> Hsmn {
        GPIO_OUT
    }

    fn name(&self) -> &'static str {
        "GpioOut"
    }

    fn evt_set(&self) -> EvtSet {
        EVT_SET
    }

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.orch.start(ctx);
    }

    fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Outcome {
        match self.orch.handle(ctx, e) {
            Reaction::Transitioned { to: LifecycleState::Started, .. } => {
                self.index = 0;
                self.apply();
                Outcome::Handled
            }
            Reaction::Transitioned { from: LifecycleState::Started, .. } => {
                self.interval_timer.stop();
                self.line.drive(false);
                Outcome::Handled
            }
            Reaction::Unhandled if self.interval_timer.fired(e) => {
                self.index = (self.index + 1) % self.pattern.len();
                self.apply();
                Outcome::Handled
            }
            reaction => reaction.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counts_edges_only() {
        let line = GpioLine::default();
        line.drive(false);
        assert_eq!(line.edges(), 0);
        line.drive(true);
        line.drive(true);
        line.drive(false);
        assert_eq!(line.edges(), 2);
        assert!(!line.level());
    }
}
