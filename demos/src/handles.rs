//! Handles, priorities and lifecycle interfaces of the demo components

use fw_lifecycle::{assert_timeouts_cover, LifecycleInterface};
use fw_qf::{Hsmn, Signal};

pub const SYSTEM: Hsmn = Hsmn(1);
pub const COMPOSITE_ACT: Hsmn = Hsmn(2);
pub const COMPOSITE_REG: [Hsmn; COMPOSITE_REG_COUNT] = [Hsmn(3), Hsmn(4), Hsmn(5), Hsmn(6)];
pub const UART_OUT: Hsmn = Hsmn(7);
pub const GPIO_OUT: Hsmn = Hsmn(8);

pub const COMPOSITE_REG_COUNT: usize = 4;

pub const SYSTEM_PRIO: u8 = 1;
pub const COMPOSITE_ACT_PRIO: u8 = 2;
pub const GPIO_OUT_PRIO: u8 = 3;
pub const UART_OUT_PRIO: u8 = 4;

pub const SYSTEM_IFACE: LifecycleInterface = LifecycleInterface::new(SYSTEM, 0, 800, 800);
pub const COMPOSITE_ACT_IFACE: LifecycleInterface =
    LifecycleInterface::new(COMPOSITE_ACT, 0, 400, 400);
/// Shared by every region; its signals are owned by the first region's handle.
pub const COMPOSITE_REG_IFACE: LifecycleInterface =
    LifecycleInterface::new(COMPOSITE_REG[0], 0, 200, 200);
pub const UART_OUT_IFACE: LifecycleInterface = LifecycleInterface::new(UART_OUT, 0, 200, 200);
pub const GPIO_OUT_IFACE: LifecycleInterface = LifecycleInterface::new(GPIO_OUT, 0, 200, 200);

assert_timeouts_cover!(COMPOSITE_ACT_IFACE, [COMPOSITE_REG_IFACE]);
assert_timeouts_cover!(SYSTEM_IFACE, [COMPOSITE_ACT_IFACE, UART_OUT_IFACE, GPIO_OUT_IFACE]);

/// Ask the system to stop everything.
pub const SYSTEM_SHUTDOWN: Signal = Signal::interface(SYSTEM, 4);
pub const SYSTEM_HEARTBEAT: Signal = Signal::timer(SYSTEM, 1);

/// New bytes are waiting in the UART fifo.
pub const UART_OUT_WRITE_REQ: Signal = Signal::interface(UART_OUT, 4);

pub const GPIO_OUT_INTERVAL_TIMER: Signal = Signal::timer(GPIO_OUT, 1);

/// Names of the four lifecycle signals, in interface index order.
macro_rules! lifecycle_names {
    ($prefix:literal $(, $extra:literal)*) => {
        &[
            concat!($prefix, "_START_REQ"),
            concat!($prefix, "_START_CFM"),
            concat!($prefix, "_STOP_REQ"),
            concat!($prefix, "_STOP_CFM"),
            $($extra),*
        ]
    };
}
pub(crate) use lifecycle_names;
