//! The demo tree started, exercised and stopped on the hosted kernel.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use fw_demos::gpio_out::Interval;
use fw_demos::handles::{COMPOSITE_ACT, COMPOSITE_REG, GPIO_OUT, SYSTEM, UART_OUT};
use fw_demos::{Demo, DemoOptions};
use fw_qf::{FwConfig, HexUnit, Hsmn};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn demo(options: DemoOptions) -> (Demo, Capture) {
    let capture = Capture::default();
    let config = FwConfig::builder().ms_per_tick(10).build();
    let demo = Demo::new(config, &options, Box::new(capture.clone())).unwrap();
    (demo, capture)
}

#[test]
fn power_up_starts_every_component() {
    let (demo, _) = demo(DemoOptions::default());
    for hsmn in [SYSTEM, COMPOSITE_ACT, UART_OUT, GPIO_OUT] {
        assert_eq!(demo.state(hsmn), "Started", "{}", demo.kernel().name(hsmn));
    }
    for hsmn in COMPOSITE_REG {
        assert_eq!(demo.state(hsmn), "Started");
    }
    assert_eq!(demo.kernel().framework().container(COMPOSITE_REG[2]), Some(COMPOSITE_ACT));
}

#[test]
fn heartbeat_reaches_the_uart() {
    let (demo, capture) = demo(DemoOptions::default());
    demo.run_for(2000);
    assert_eq!(capture.text(), "heartbeat 1\nheartbeat 2\n");
    assert_eq!(demo.uart_backlog(), 0);
}

#[test]
fn console_output_goes_through_the_uart() {
    let (demo, capture) = demo(DemoOptions::default());
    let fw = demo.kernel().framework();
    fw.log().print(fw, Hsmn::UNDEF, format_args!("boot {}\n", 1));
    fw.log().print_buf(fw, UART_OUT, b"hi", HexUnit::Byte, 0);
    demo.kernel().run_until_idle();

    let text = capture.text();
    assert!(text.starts_with("boot 1\nBuffer len 2:\n\r[0x00000000] 68 69 "));
    assert!(text.ends_with("hi\n\r"));
    assert_eq!(demo.uart_backlog(), 0);
}

#[test]
fn gpio_follows_the_pattern() {
    let (demo, _) = demo(DemoOptions::default());
    assert!(demo.gpio_line().level());
    demo.run_for(200);
    assert!(!demo.gpio_line().level());
    demo.run_for(800);
    assert!(demo.gpio_line().level());
    assert_eq!(demo.gpio_line().edges(), 3);
}

#[test]
fn shutdown_stops_the_tree_and_quiets_outputs() {
    const FAST: &[Interval] = &[Interval::new(true, 50), Interval::new(false, 50)];
    let options = DemoOptions {
        heartbeat_ms: 100,
        gpio_pattern: FAST,
    };
    let (demo, capture) = demo(options);
    demo.run_for(300);
    demo.shutdown().unwrap();

    for (name, state) in demo.states() {
        assert_eq!(state, "Stopped", "{}", name);
    }
    assert!(!demo.gpio_line().level());

    let edges = demo.gpio_line().edges();
    let text = capture.text();
    demo.run_for(1000);
    assert_eq!(demo.gpio_line().edges(), edges);
    assert_eq!(capture.text(), text);
    assert!(text.ends_with("heartbeat 3\n"));
}
