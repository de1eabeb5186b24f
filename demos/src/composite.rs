//! An active orchestrating the regions it hosts
//!
//! CompositeAct owns the thread of control; its [`CompositeReg`] regions
//! share its queue. Starting CompositeAct starts every region and it only
//! reports Started once all of them have confirmed.

use fw_lifecycle::{
    Dependency, LifecycleState, Orchestrator, Reaction, INTERNAL_EVT_NAMES, TIMER_EVT_NAMES,
};
use fw_qf::{Component, Context, Evt, EvtSet, Hsmn, Outcome, TimerWheel};

use crate::handles::{
    lifecycle_names, COMPOSITE_ACT, COMPOSITE_ACT_IFACE, COMPOSITE_REG, COMPOSITE_REG_COUNT,
    COMPOSITE_REG_IFACE,
};
use crate::DemoError;

const ACT_EVT_SET: EvtSet = EvtSet {
    timer: TIMER_EVT_NAMES,
    internal: INTERNAL_EVT_NAMES,
    interface: lifecycle_names!("COMPOSITE_ACT"),
};

const REG_EVT_SET: EvtSet = EvtSet {
    timer: TIMER_EVT_NAMES,
    internal: INTERNAL_EVT_NAMES,
    interface: lifecycle_names!("COMPOSITE_REG"),
};

const REG_NAMES: [&str; COMPOSITE_REG_COUNT] =
    ["CompositeReg0", "CompositeReg1", "CompositeReg2", "CompositeReg3"];

pub struct CompositeAct {
    orch: Orchestrator,
}

impl CompositeAct {
    pub fn new(wheel: &TimerWheel) -> Result<Self, DemoError> {
        let deps = COMPOSITE_REG
            .iter()
            .map(|&hsmn| Dependency::new(hsmn, COMPOSITE_REG_IFACE))
            .collect();
        Ok(Self {
            orch: Orchestrator::new(COMPOSITE_ACT, COMPOSITE_ACT_IFACE, deps, wheel)?,
        })
    }
}

impl Component for CompositeAct {
    fn hsmn(&self) -> Hsmn {
        COMPOSITE_ACT
    }

    fn name(&self) -> &'static str {
        "CompositeAct"
    }

    fn evt_set(&self) -> EvtSet {
        ACT_EVT_SET
    }

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.orch.start(ctx);
    }

    fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Outcome {
        self.orch.handle(ctx, e).into()
    }
}

/// One of the regions hosted by [`CompositeAct`].
pub struct CompositeReg {
    index: usize,
    orch: Orchestrator,
}

impl CompositeReg {
    pub fn new(index: usize, wheel: &TimerWheel) -> Result<Self, DemoError> {
        let hsmn = COMPOSITE_REG
            .get(index)
            .copied()
            .ok_or(DemoError::RegionIndex(index))?;
        Ok(Self {
            index,
            orch: Orchestrator::new(hsmn, COMPOSITE_REG_IFACE, Vec::new(), wheel)?,
        })
    }
}

impl Component for CompositeReg {
    fn hsmn(&self) -> Hsmn {
        COMPOSITE_REG[self.index]
    }

    fn name(&self) -> &'static str {
        REG_NAMES[self.index]
    }

    fn evt_set(&self) -> EvtSet {
        // Region signals live in the first region's signal space.
        if self.index == 0 {
            REG_EVT_SET
        } else {
            EvtSet {
                timer: TIMER_EVT_NAMES,
                internal: INTERNAL_EVT_NAMES,
                interface: &[],
            }
        }
    }

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.orch.start(ctx);
    }

    fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Outcome {
        let reaction = self.orch.handle(ctx, e);
        if let Reaction::Transitioned { to, .. } = reaction {
            if to == LifecycleState::Started || to == LifecycleState::Stopped {
                log::info!(target: ctx.name(), "{}: region {} {}", ctx.name(), self.index, to);
            }
        }
        reaction.into()
    }
}
