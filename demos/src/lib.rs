//! # fw-demos
//!
//! A small component tree run on the hosted kernel:
//!
//! ```text
//! System ─┬─ CompositeAct ── CompositeReg0..3 (regions)
//!         ├─ UartOut
//!         └─ GpioOut
//! ```
//!
//! System starts the tree at power up and stops it on `SYSTEM_SHUTDOWN`.
//! The UART fifo doubles as the default console output of the framework
//! log.

use std::io::Write;
use std::sync::Arc;

use fw_lifecycle::LifecycleError;
use fw_qf::{Active, Evt, FwConfig, Hsmn, Kernel, KernelError};
use thiserror::Error;

pub mod composite;
pub mod gpio_out;
pub mod handles;
pub mod system;
pub mod uart_out;

use composite::{CompositeAct, CompositeReg};
use gpio_out::{GpioLine, GpioOut, Interval, HEARTBEAT_PATTERN};
use handles::*;
use system::System;
use uart_out::{UartFifo, UartOut};

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("no region with index {0}")]
    RegionIndex(usize),
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub heartbeat_ms: u32,
    pub gpio_pattern: &'static [Interval],
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            heartbeat_ms: 1000,
            gpio_pattern: HEARTBEAT_PATTERN,
        }
    }
}

pub struct Demo {
    kernel: Kernel,
    uart_fifo: Arc<UartFifo>,
    gpio_line: Arc<GpioLine>,
}

impl Demo {
    /// Build and start the component tree. UART output goes to `uart_sink`.
    pub fn new(
        config: FwConfig,
        options: &DemoOptions,
        uart_sink: Box<dyn Write + Send>,
    ) -> Result<Self, DemoError> {
        let builder = Kernel::builder(config);
        let wheel = builder.timer_wheel();
        let uart_fifo = uart_out::new_fifo();
        let gpio_line = Arc::new(GpioLine::default());

        let mut composite = Active::new(Box::new(CompositeAct::new(&wheel)?), COMPOSITE_ACT_PRIO);
        for index in 0..COMPOSITE_REG_COUNT {
            composite = composite.region(Box::new(CompositeReg::new(index, &wheel)?));
        }
        let system = System::new(&wheel, options.heartbeat_ms, Arc::clone(&uart_fifo))?;
        let uart = UartOut::new(&wheel, Arc::clone(&uart_fifo), uart_sink)?;
        let gpio = GpioOut::new(&wheel, options.gpio_pattern, Arc::clone(&gpio_line))?;

        let kernel = builder
            .active(Active::new(Box::new(system), SYSTEM_PRIO))
            .active(composite)
            .active(Active::new(Box::new(gpio), GPIO_OUT_PRIO))
            .active(Active::new(Box::new(uart), UART_OUT_PRIO))
            .build()?;
        kernel
            .framework()
            .log()
            .add_interface(UART_OUT, Arc::clone(&uart_fifo), UART_OUT_WRITE_REQ, true);
        kernel.start();
        kernel.run_until_idle();

        Ok(Self {
            kernel,
            uart_fifo,
            gpio_line,
        })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn state(&self, hsmn: Hsmn) -> &'static str {
        self.kernel.state(hsmn)
    }

    pub fn gpio_line(&self) -> &GpioLine {
        &self.gpio_line
    }

    /// Bytes waiting in the UART fifo
    pub fn uart_backlog(&self) -> usize {
        self.uart_fifo.lock(|pipe| pipe.used_count())
    }

    pub fn run_for(&self, ms: u32) {
        self.kernel.advance_ms(ms);
    }

    /// Request an orderly stop of the whole tree and run until idle.
    pub fn shutdown(&self) -> Result<(), DemoError> {
        self.kernel.post(Evt::new(SYSTEM_SHUTDOWN).with_to(SYSTEM))?;
        self.kernel.run_until_idle();
        Ok(())
    }

    /// Name and state of every registered component
    pub fn states(&self) -> Vec<(&'static str, &'static str)> {
        let fw = self.kernel.framework();
        fw.handles().map(|hsmn| (fw.name(hsmn), fw.state(hsmn))).collect()
    }
}
