//! # fw-qf
//!
//! Hosted runtime of the FW component framework: addressed events,
//! components hosted as actives or regions, the immutable handle registry,
//! timers and a cooperative priority kernel standing in for the RTOS.
//!
//! ## Module Overview
//! - [`event`]     – Addressed events with a closed set of bodies.
//! - [`component`] – The `Component` capability trait.
//! - [`hsm`]       – Per-component runtime (sequence, defer, reminders) and handler `Context`.
//! - [`active`]    – Active containers and region routing.
//! - [`framework`] – Registry of names, containers and states by handle.
//! - [`time`]      – One-shot and periodic timers.
//! - [`kernel`]    – Priority scheduler and kernel builder.
//! - [`diag`]      – Verbosity, per-handle event tracing and console output routing.

pub mod active;
pub mod component;
pub mod config;
pub mod diag;
pub mod event;
pub mod framework;
pub mod hsm;
pub mod kernel;
pub mod queue;
pub mod time;

pub use active::Active;
pub use component::{Component, Outcome};
pub use config::{FaultPolicy, FwConfig, FwConfigBuilder, MAX_PRIORITY, MAX_REGION_COUNT};
pub use diag::{HexUnit, Log, LogSink};
pub use event::{Body, ErrorInfo, Evt, EvtSet};
pub use framework::{Fault, Framework, UNDEF_NAME};
pub use fw_core::{Category, ErrorKind, FwError, Hsmn, Reason, Sequence, Signal, REASON_UNSPEC};
pub use hsm::{CfmCheck, Context, HsmCore};
pub use kernel::{Kernel, KernelBuilder, KernelError};
pub use time::{Timer, TimerKind, TimerWheel};

#[cfg(test)]
mod tests;
