//! UART transmitter fed through a byte fifo
//!
//! Writers append to the shared [`UartFifo`] and notify the component with
//! `UART_OUT_WRITE_REQ`. While Started the component drains the fifo into
//! its sink; anything written earlier is kept until it starts.

use std::io::Write;
use std::sync::Arc;

use fw_lifecycle::{LifecycleState, Orchestrator, Reaction, INTERNAL_EVT_NAMES, TIMER_EVT_NAMES};
use fw_mem::{Pipe, Shared, SharedPipe};
use fw_qf::{Component, Context, Evt, EvtSet, Hsmn, Outcome, TimerWheel};

use crate::handles::{lifecycle_names, UART_OUT, UART_OUT_IFACE, UART_OUT_WRITE_REQ};
use crate::DemoError;

pub const UART_FIFO_SIZE: usize = 512;

pub type UartFifo = SharedPipe<u8, UART_FIFO_SIZE>;

const EVT_SET: EvtSet = EvtSet {
    timer: TIMER_EVT_NAMES,
    internal: INTERNAL_EVT_NAMES,
    interface: lifecycle_names!("UART_OUT", "UART_OUT_WRITE_REQ"),
};

const CHUNK: usize = 64;

pub fn new_fifo() -> Arc<UartFifo> {
    Arc::new(Shared::new(Pipe::new()))
}

/// Queue `bytes` for transmission on behalf of the component owning `ctx`.
///
/// All or nothing: returns false and drops the bytes if the fifo lacks room.
pub fn write(ctx: &mut Context<'_>, fifo: &UartFifo, bytes: &[u8]) -> bool {
    let written = fifo.lock(|pipe| pipe.write(bytes));
    if written == 0 && !bytes.is_empty() {
        log::warn!(target: ctx.name(), "{}: uart fifo full, {} bytes dropped", ctx.name(), bytes.len());
        return false;
    }
    ctx.send_not_in_queue(Evt::new(UART_OUT_WRITE_REQ), UART_OUT);
    true
}

pub struct UartOut {
    orch: Orchestrator,
    fifo: Arc<UartFifo>,
    sink: Box<dyn Write + Send>,
}

impl UartOut {
    pub fn new(
        wheel: &TimerWheel,
        fifo: Arc<UartFifo>,
        sink: Box<dyn Write + Send>,
    ) -> Result<Self, DemoError> {
        Ok(Self {
            orch: Orchestrator::new(UART_OUT, UART_OUT_IFACE, Vec::new(), wheel)?,
            fifo,
            sink,
        })
    }

    fn drain(&mut self, ctx: &Context<'_>) {
        let mut chunk = [0u8; CHUNK];
        loop {
            let count = self.fifo.lock(|pipe| pipe.read(&mut chunk));
            if count == 0 {
                break;
            }
            if let Err(err) = self.sink.write_all(&chunk[..count]) {
                log::error!(target: ctx.name(), "{}: write failed: {}", ctx.name(), err);
                return;
            }
        }
        if let Err(err) = self.sink.flush() {
            log::error!(target: ctx.name(), "{}: flush failed: {}", ctx.name(), err);
        }
    }
}

impl Component for UartOut {
    fn hsmn(&self) -> Hsmn {
        UART_OUT
    }

    fn name(&self) -> &'static str {
        "UartOut"
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
                self.drain(ctx);
                Outcome::Handled
            }
            Reaction::Unhandled if e.signal == UART_OUT_WRITE_REQ => {
                if self.orch.state() == LifecycleState::Started {
                    self.drain(ctx);
                }
                Outcome::Handled
            }
            reaction => reaction.into(),
        }
    }
}
