//! Timer behaviour observed through the kernel.

use std::sync::{Arc, Mutex};

use fw_qf::{
    Active, Component, Context, Evt, FwConfig, Hsmn, Kernel, Outcome, Signal, Timer, TimerKind,
};

const BLINKER: Hsmn = Hsmn(5);
const BLINK_TIMER: Signal = Signal::timer(BLINKER, 0);
const BLINK_STOP: Signal = Signal::interface(BLINKER, 0);

struct Blinker {
    timer: Timer,
    blinks: Arc<Mutex<u32>>,
}

impl Component for Blinker {
    fn hsmn(&self) -> Hsmn {
        BLINKER
    }

    fn name(&self) -> &'static str {
        "Blinker"
    }

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.timer.start(100, TimerKind::Periodic);
        ctx.set_state("Blinking");
    }

    fn handle(&mut self, ctx: &mut Context<'_>, e: &Evt) -> Outcome {
        if self.timer.fired(e) {
            *self.blinks.lock().unwrap() += 1;
            Outcome::Handled
        } else if e.signal == BLINK_STOP {
            self.timer.stop();
            ctx.set_state("Off");
            Outcome::Handled
        } else {
            Outcome::Unhandled
        }
    }
}

#[test]
fn periodic_timer_until_stopped() {
    let builder = Kernel::builder(FwConfig::default());
    let blinks = Arc::new(Mutex::new(0));
    let blinker = Blinker {
        timer: builder.timer_wheel().timer(BLINKER, BLINK_TIMER),
        blinks: blinks.clone(),
    };
    let kernel = builder.active(Active::new(Box::new(blinker), 2)).build().unwrap();
    kernel.start();

    kernel.advance_ms(1000);
    assert_eq!(*blinks.lock().unwrap(), 10);
    assert_eq!(kernel.state(BLINKER), "Blinking");

    kernel.post(Evt::new(BLINK_STOP).with_to(BLINKER)).unwrap();
    kernel.run_until_idle();
    kernel.advance_ms(1000);
    assert_eq!(*blinks.lock().unwrap(), 10);
    assert_eq!(kernel.state(BLINKER), "Off");
}

#[test]
fn stop_racing_a_queued_expiry() {
    let builder = Kernel::builder(FwConfig::default());
    let blinks = Arc::new(Mutex::new(0));
    let blinker = Blinker {
        timer: builder.timer_wheel().timer(BLINKER, BLINK_TIMER),
        blinks: blinks.clone(),
    };
    let kernel = builder.active(Active::new(Box::new(blinker), 2)).build().unwrap();
    kernel.start();

    // Ten ticks fire the expiry; the stop is queued behind it but the
    // expiry is still delivered since it was current when dispatched.
    for _ in 0..10 {
        kernel.tick();
    }
    kernel.post(Evt::new(BLINK_STOP).with_to(BLINKER)).unwrap();
    kernel.run_until_idle();
    assert_eq!(*blinks.lock().unwrap(), 1);
}
