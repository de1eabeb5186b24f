use std::sync::{Arc, Mutex};

use crate::component::{Component, Outcome};
use crate::event::{Evt, EvtSet};
use crate::hsm::Context;
use crate::Hsmn;


type Handler = Box<dyn FnMut(&mut Context<'_>, &Evt) -> Outcome + Send>;

/// Component recording every event it is offered, then handing it to an
/// optional script.
pub(crate) struct Recorder {
    hsmn: Hsmn,
    name: &'static str,
    evt_set: EvtSet,
    seen: Arc<Mutex<Vec<Evt>>>,
    script: Option<Handler>,
}

impl Recorder {
    pub(crate) fn new(hsmn: u8, name: &'static str) -> Self {
        Self {
            hsmn: Hsmn(hsmn),
            name,
            evt_set: EvtSet::EMPTY,
            seen: Arc::default(),
            script: None,
        }
    }

    pub(crate) fn with_script(
        mut self,
        script: impl FnMut(&mut Context<'_>, &Evt) -> Outcome + Send + 'static,
    ) -> Self {
        self.script = Some(Box::new(script));
        self
    }

    pub(crate) fn with_evt_set(mut self, evt_set: EvtSet) -> Self {
        self.evt_set = evt_set;
        self
    }

    pub(crate) fn seen(&self) -> Arc<Mutex<Vec<Evt>>> {
        Arc::clone(&self.seen)
    }
}

impl Component for Recorder {
    fn hsmn(&self) -> Hsmn {
        self.hsmn
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn evt_set(&self) -> EvtSet {
        self.evt_set
    }

    fn start(&mut self, ctx: &mut Context<'_>) {
        ctx.set_state("Idle");
    }

    fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Outcome {
        self.seen.lock().unwrap().push(e.clone());
        match self.script.as_mut() {
            Some(script) => script(ctx, e),
            None => Outcome::Handled,
        }
    }
}

pub(crate) fn signals(seen: &Arc<Mutex<Vec<Evt>>>) -> Vec<u8> {
    seen.lock().unwrap().iter().map(|e| e.signal.index()).collect()
}
