//! Component capability interface

use fw_core::Hsmn;

use crate::event::{Evt, EvtSet};
use crate::hsm::Context;

/// Result of offering an event to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Unhandled,
}

impl Outcome {
    pub fn is_handled(self) -> bool {
        matches!(self, Outcome::Handled)
    }
}

/// A state machine hosted by an [`Active`](crate::active::Active), either
/// as its main component or as one of its regions.
pub trait Component: Send {
    fn hsmn(&self) -> Hsmn;

    fn name(&self) -> &'static str;

    /// Names of the signals owned by this component's handle.
    fn evt_set(&self) -> EvtSet {
        EvtSet::EMPTY
    }

    /// Initial transition, run once when the kernel starts.
    fn start(&mut self, ctx: &mut Context<'_>);

    /// Final cleanup when the kernel shuts down.
    fn stop(&mut self, _ctx: &mut Context<'_>) {}

    fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Outcome;
}
