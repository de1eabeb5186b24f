//! Top of the component tree
//!
//! System starts itself at power up: its initial transition raises its own
//! StartReq, so every other component is started through the regular
//! lifecycle fan-out. Once Started it writes a heartbeat line to the UART.

use std::sync::Arc;

use fw_lifecycle::{Dependency, LifecycleState, Orchestrator, Reaction, INTERNAL_EVT_NAMES};
use fw_qf::{Component, Context, Evt, EvtSet, Hsmn, Outcome, Timer, TimerKind, TimerWheel};

use crate::handles::{
    lifecycle_names, COMPOSITE_ACT, COMPOSITE_ACT_IFACE, GPIO_OUT, GPIO_OUT_IFACE, SYSTEM,
    SYSTEM_HEARTBEAT, SYSTEM_IFACE, SYSTEM_SHUTDOWN, UART_OUT, UART_OUT_IFACE,
};
use crate::uart_out::{self, UartFifo};
use crate::DemoError;

const EVT_SET: EvtSet = EvtSet {
    timer: &["SYSTEM_STATE_TIMER", "SYSTEM_HEARTBEAT"],
    internal: INTERNAL_EVT_NAMES,
    interface: lifecycle_names!("SYSTEM", "SYSTEM_SHUTDOWN"),
};

pub struct System {
    orch: Orchestrator,
    heartbeat: Timer,
    heartbeat_ms: u32,
    beats: u32,
    uart: Arc<UartFifo>,
}

impl System {
    pub fn new(wheel: &TimerWheel, heartbeat_ms: u32, uart: Arc<UartFifo>) -> Result<Self, DemoError> {
        let deps = vec![
            Dependency::new(COMPOSITE_ACT, COMPOSITE_ACT_IFACE),
            Dependency::new(UART_OUT, UART_OUT_IFACE),
            Dependency::new(GPIO_OUT, GPIO_OUT_IFACE),
        ];
        Ok(Self {
            orch: Orchestrator::new(SYSTEM, SYSTEM_IFACE, deps, wheel)?,
            heartbeat: wheel.timer(SYSTEM, SYSTEM_HEARTBEAT),
            heartbeat_ms,
            beats: 0,
            uart,
        })
    }

    fn on_own_cfm(&mut self, ctx: &mut Context<'_>, e: &Evt) {
        let info = e.error_info().unwrap_or_default();
        let action = if e.signal == SYSTEM_IFACE.start_cfm { "start" } else { "stop" };
        if info.is_success() {
            log::info!(target: ctx.name(), "{}: {} complete", ctx.name(), action);
        } else {
            log::error!(target: ctx.name(), "{}: {} failed: {}", ctx.name(), action, info);
        }
    }
}

impl Component for System {
    fn hsmn(&self) -> Hsmn {
        SYSTEM
    }

    fn name(&self) -> &'static str {
        "System"
    }

    fn evt_set(&self) -> EvtSet {
        EVT_SET
    }

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.orch.start(ctx);
        ctx.raise(Evt::request(SYSTEM_IFACE.start_req, SYSTEM_IFACE.start_timeout_ms));
    }

    fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Outcome {
        match self.orch.handle(ctx, e) {
            Reaction::Transitioned { to: LifecycleState::Started, .. } => {
                self.heartbeat.start(self.heartbeat_ms, TimerKind::Periodic);
                Outcome::Handled
            }
            Reaction::Transitioned { from: LifecycleState::Started, .. } => {
                self.heartbeat.stop();
                Outcome::Handled
            }
            Reaction::Unhandled => {
                if self.heartbeat.fired(e) {
                    self.beats += 1;
                    let line = format!("heartbeat {}\n", self.beats);
                    uart_out::write(ctx, &self.uart, line.as_bytes());
                } else if e.signal == SYSTEM_SHUTDOWN {
                    ctx.raise(Evt::request(SYSTEM_IFACE.stop_req, SYSTEM_IFACE.stop_timeout_ms));
                } else if e.signal == SYSTEM_IFACE.start_cfm || e.signal == SYSTEM_IFACE.stop_cfm {
                    self.on_own_cfm(ctx, e);
                } else {
                    return Outcome::Unhandled;
                }
                Outcome::Handled
            }
            reaction => reaction.into(),
        }
    }
}
