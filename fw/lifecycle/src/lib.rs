//! # fw-lifecycle
//!
//! Start/Stop orchestration of a component and the components it depends
//! on. A component embeds an [`Orchestrator`], forwards its events to it,
//! and the orchestrator walks Stopped, Starting, Started and Stopping,
//! fanning requests out to the dependencies and aggregating their
//! confirmations under a deadline.
//!
//! ## Module Overview
//! - [`interface`]    – Lifecycle signals, timeouts and dependency declarations.
//! - [`orchestrator`] – The lifecycle state machine.

pub mod interface;
pub mod orchestrator;

pub use interface::{covers, Dependency, LifecycleInterface};
pub use orchestrator::{
    done_signal, failed_signal, state_timer_signal, LifecycleError, LifecycleState, Orchestrator,
    PendingConfirmSet, Reaction, INTERNAL_EVT_NAMES, TIMER_EVT_NAMES,
};
