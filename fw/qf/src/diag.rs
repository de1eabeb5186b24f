//! Per-component diagnostics on top of the `log` facade
//!
//! Besides tracing, [`Log`] routes formatted console output into the byte
//! fifos of registered output interfaces such as a UART transmitter.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use fw_core::{Hsmn, Signal};
use fw_mem::SharedPipe;
use log::Level;
use parking_lot::Mutex;

use crate::event::{Body, Evt};
use crate::framework::Framework;

/// Highest verbosity, enabling `Level::Trace`
pub const MAX_VERBOSITY: u8 = 5;

/// Data bytes per line of a hex dump
pub const BYTE_PER_LINE: usize = 16;

/// Byte fifo an output interface drains.
pub trait LogSink: Send + Sync {
    /// Append all of `bytes` or nothing. Returns the count written and
    /// whether the fifo went from empty to non-empty.
    fn write_all(&self, bytes: &[u8]) -> (usize, bool);

    /// Append as much of `bytes` as fits.
    fn write_some(&self, bytes: &[u8]) -> (usize, bool);
}

impl<const N: usize> LogSink for SharedPipe<u8, N> {
    fn write_all(&self, bytes: &[u8]) -> (usize, bool) {
        self.lock(|pipe| pipe.write_status(bytes))
    }

    fn write_some(&self, bytes: &[u8]) -> (usize, bool) {
        self.lock(|pipe| {
            let count = bytes.len().min(pipe.avail_count());
            pipe.write_status(&bytes[..count])
        })
    }
}

/// Width of each value in a hex dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexUnit {
    Byte = 1,
    Half = 2,
    Word = 4,
}

#[derive(Clone)]
struct Interface {
    hsmn: Hsmn,
    sink: Arc<dyn LogSink>,
    signal: Signal,
    default: bool,
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("hsmn", &self.hsmn)
            .field("signal", &self.signal)
            .field("default", &self.default)
            .finish()
    }
}

/// Verbosity and per-handle on/off switches for event tracing.
///
/// Verbosity `n` enables every level whose numeric value is at most `n`
/// (1 = error, 5 = trace); 0 silences component diagnostics entirely.
#[derive(Debug)]
pub struct Log {
    verbosity: AtomicU8,
    on_mask: AtomicU64,
    interfaces: Mutex<Vec<Interface>>,
}

impl Log {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity: AtomicU8::new(verbosity.min(MAX_VERBOSITY)),
            on_mask: AtomicU64::new(u64::MAX),
            interfaces: Mutex::new(Vec::new()),
        }
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity.load(Ordering::Relaxed)
    }

    pub fn set_verbosity(&self, verbosity: u8) {
        self.verbosity
            .store(verbosity.min(MAX_VERBOSITY), Ordering::Relaxed);
    }

    /// Most verbose level currently enabled
    pub fn max_level(&self) -> Option<Level> {
        match self.verbosity() {
            0 => None,
            1 => Some(Level::Error),
            2 => Some(Level::Warn),
            3 => Some(Level::Info),
            4 => Some(Level::Debug),
            _ => Some(Level::Trace),
        }
    }

    fn bit(hsmn: Hsmn) -> u64 {
        1u64 << (hsmn.index() % 64)
    }

    pub fn on(&self, hsmn: Hsmn) {
        self.on_mask.fetch_or(Self::bit(hsmn), Ordering::Relaxed);
    }

    pub fn off(&self, hsmn: Hsmn) {
        self.on_mask.fetch_and(!Self::bit(hsmn), Ordering::Relaxed);
    }

    pub fn on_all(&self) {
        self.on_mask.store(u64::MAX, Ordering::Relaxed);
    }

    pub fn off_all(&self) {
        self.on_mask.store(0, Ordering::Relaxed);
    }

    pub fn is_on(&self, hsmn: Hsmn) -> bool {
        self.on_mask.load(Ordering::Relaxed) & Self::bit(hsmn) != 0
    }

    pub fn enabled(&self, hsmn: Hsmn, level: Level) -> bool {
        self.is_on(hsmn) && self.max_level().map_or(false, |max| level <= max)
    }

    /// Trace delivery of `e` to `hsmn`.
    pub fn event(&self, fw: &Framework, hsmn: Hsmn, e: &Evt) {
        if !self.enabled(hsmn, Level::Debug) {
            return;
        }
        let name = fw.name(hsmn);
        match &e.body {
            Body::Error(info) => log::debug!(
                target: name,
                "{}({}) {} from {}({}) seq={} error={} origin={} reason={}",
                name,
                fw.state(hsmn),
                fw.event_name(e.signal),
                fw.name(e.from),
                e.from,
                e.seq,
                info.error,
                fw.name(info.origin),
                info.reason
            ),
            _ => log::debug!(
                target: name,
                "{}({}) {} from {}({}) seq={}",
                name,
                fw.state(hsmn),
                fw.event_name(e.signal),
                fw.name(e.from),
                e.from,
                e.seq
            ),
        }
    }

    /// Report an event the component did not handle.
    pub fn unhandled(&self, fw: &Framework, hsmn: Hsmn, e: &Evt) {
        if self.enabled(hsmn, Level::Trace) {
            let name = fw.name(hsmn);
            log::trace!(
                target: name,
                "{}({}) ignored {}",
                name,
                fw.state(hsmn),
                fw.event_name(e.signal)
            );
        }
    }

    pub fn state_change(&self, fw: &Framework, hsmn: Hsmn, from: &str, to: &str) {
        if self.enabled(hsmn, Level::Info) {
            let name = fw.name(hsmn);
            log::info!(target: name, "{}: {} -> {}", name, from, to);
        }
    }

    /// Route output for `hsmn` into `sink`, replacing any earlier route.
    ///
    /// `signal` is posted to `hsmn` whenever a write makes the sink
    /// non-empty. Default interfaces also receive output addressed to
    /// [`Hsmn::UNDEF`].
    pub fn add_interface<S: LogSink + 'static>(
        &self,
        hsmn: Hsmn,
        sink: Arc<S>,
        signal: Signal,
        default: bool,
    ) {
        let mut interfaces = self.interfaces.lock();
        interfaces.retain(|inf| inf.hsmn != hsmn);
        interfaces.push(Interface {
            hsmn,
            sink,
            signal,
            default,
        });
    }

    pub fn remove_interface(&self, hsmn: Hsmn) -> bool {
        let mut interfaces = self.interfaces.lock();
        let before = interfaces.len();
        interfaces.retain(|inf| inf.hsmn != hsmn);
        interfaces.len() != before
    }

    fn notify(fw: &Framework, inf: &Interface) {
        if let Err(err) = fw.post(Evt::new(inf.signal).with_to(inf.hsmn)) {
            log::warn!("log output to {} not signalled: {}", inf.hsmn, err);
        }
    }

    /// Write raw bytes to the interface `hsmn`.
    ///
    /// With `Hsmn::UNDEF` every default interface gets as much as fits and
    /// the full length is reported. Otherwise the write is all or nothing
    /// and 0 is returned when the fifo is full or no such interface exists.
    pub fn write(&self, fw: &Framework, hsmn: Hsmn, bytes: &[u8]) -> usize {
        if hsmn == Hsmn::UNDEF {
            self.write_default(fw, bytes);
            return bytes.len();
        }
        let inf = self
            .interfaces
            .lock()
            .iter()
            .find(|inf| inf.hsmn == hsmn)
            .cloned();
        let Some(inf) = inf else {
            return 0;
        };
        let (count, became_ready) = inf.sink.write_all(bytes);
        if became_ready {
            Self::notify(fw, &inf);
        }
        count
    }

    /// Write to every default interface, truncating where a fifo is full.
    pub fn write_default(&self, fw: &Framework, bytes: &[u8]) {
        let defaults: Vec<Interface> = self
            .interfaces
            .lock()
            .iter()
            .filter(|inf| inf.default)
            .cloned()
            .collect();
        for inf in &defaults {
            let (_, became_ready) = inf.sink.write_some(bytes);
            if became_ready {
                Self::notify(fw, inf);
            }
        }
    }

    /// Formatted write, as [`Log::write`].
    pub fn print(&self, fw: &Framework, hsmn: Hsmn, args: fmt::Arguments<'_>) -> usize {
        match args.as_str() {
            Some(text) => self.write(fw, hsmn, text.as_bytes()),
            None => self.write(fw, hsmn, fmt::format(args).as_bytes()),
        }
    }

    /// Hex dump of `data`, [`BYTE_PER_LINE`] bytes per line, each line
    /// labelled with `label` plus its offset.
    ///
    /// Returns the number of data bytes dumped, short if a fifo filled up.
    pub fn print_buf(
        &self,
        fw: &Framework,
        hsmn: Hsmn,
        data: &[u8],
        unit: HexUnit,
        label: u32,
    ) -> usize {
        self.print(fw, hsmn, format_args!("Buffer len {}:\n\r", data.len()));
        let mut dumped = 0;
        for line in data.chunks(BYTE_PER_LINE) {
            let text = hex_line(line, unit, label.wrapping_add(dumped as u32));
            if self.write(fw, hsmn, text.as_bytes()) == 0 {
                break;
            }
            dumped += line.len();
        }
        dumped
    }

    /// Hex dump to the default interfaces if `hsmn` is traced at `level`.
    pub fn debug_buf(
        &self,
        fw: &Framework,
        level: Level,
        hsmn: Hsmn,
        data: &[u8],
        unit: HexUnit,
        label: u32,
    ) {
        if self.enabled(hsmn, level) {
            self.print_buf(fw, Hsmn::UNDEF, data, unit, label);
        }
    }
}

/// One hex dump line: label, values in little-endian `unit`s padded to a
/// fixed column, then the bytes as ASCII with `_` for unprintables.
pub fn hex_line(line: &[u8], unit: HexUnit, label: u32) -> String {
    let unit = unit as usize;
    let mut hex = String::new();
    for value in line.chunks(unit) {
        // Infallible for String.
        let _ = match (unit, value) {
            (2, &[a, b]) => write!(hex, "{:04x} ", u16::from_le_bytes([a, b])),
            (4, &[a, b, c, d]) => write!(hex, "{:08x} ", u32::from_le_bytes([a, b, c, d])),
            _ => value.iter().try_for_each(|byte| write!(hex, "{:02x} ", byte)),
        };
    }
    let width = BYTE_PER_LINE / unit * (unit * 2 + 1);
    let ascii: String = line
        .iter()
        .map(|&byte| if (0x20..=0x7e).contains(&byte) { byte as char } else { '_' })
        .collect();
    format!("[0x{:08x}] {:<width$}{}\n\r", label, hex, ascii, width = width)
}

impl Default for Log {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_maps_to_levels() {
        let log = Log::new(0);
        assert!(log.max_level().is_none());
        log.set_verbosity(2);
        assert!(log.enabled(Hsmn(1), Level::Warn));
        assert!(!log.enabled(Hsmn(1), Level::Info));
        log.set_verbosity(9);
        assert_eq!(log.verbosity(), MAX_VERBOSITY);
        assert!(log.enabled(Hsmn(1), Level::Trace));
    }

    #[test]
    fn test_hex_line_pads_short_lines() {
        let line = hex_line(b"AB\x01", HexUnit::Byte, 0x20);
        assert_eq!(line, format!("[0x00000020] 41 42 01 {}AB_\n\r", " ".repeat(39)));

        let line = hex_line(&[0x34, 0x12, 0x78, 0x56], HexUnit::Half, 0);
        assert!(line.starts_with("[0x00000000] 1234 5678 "));
        assert!(line.ends_with("4_xV\n\r"));

        let line = hex_line(&[0x04, 0x03, 0x02, 0x01, 0x41], HexUnit::Word, 0);
        assert!(line.starts_with("[0x00000000] 01020304 41 "));
        assert_eq!(line.len(), 13 + 36 + 5 + 2);
    }

    fn framework() -> Framework {
        Framework::new(crate::FwConfig::default(), Vec::new())
    }

    #[test]
    fn test_default_interfaces_truncate() {
        let fw = framework();
        let log = Log::new(3);
        let small: Arc<SharedPipe<u8, 8>> = Arc::default();
        let large: Arc<SharedPipe<u8, 64>> = Arc::default();
        let other: Arc<SharedPipe<u8, 64>> = Arc::default();
        log.add_interface(Hsmn(5), Arc::clone(&small), Signal(1), true);
        log.add_interface(Hsmn(6), Arc::clone(&large), Signal(1), true);
        log.add_interface(Hsmn(7), Arc::clone(&other), Signal(1), false);

        assert_eq!(log.print(&fw, Hsmn::UNDEF, format_args!("boot {}", 12)), 7);
        assert_eq!(log.write(&fw, Hsmn::UNDEF, b"-done"), 5);
        assert_eq!(small.lock(|pipe| pipe.used_count()), 7);
        assert_eq!(large.lock(|pipe| pipe.used_count()), 12);
        assert!(other.lock(|pipe| pipe.is_empty()));
    }

    #[test]
    fn test_addressed_write_is_all_or_nothing() {
        let fw = framework();
        let log = Log::new(3);
        let fifo: Arc<SharedPipe<u8, 8>> = Arc::default();
        log.add_interface(Hsmn(5), Arc::clone(&fifo), Signal(1), false);

        assert_eq!(log.write(&fw, Hsmn(5), b"12345"), 5);
        assert_eq!(log.write(&fw, Hsmn(5), b"678"), 0);
        assert_eq!(log.write(&fw, Hsmn(9), b"6"), 0);
        assert_eq!(log.print_buf(&fw, Hsmn(5), &[0; 4], HexUnit::Byte, 0), 0);

        assert!(log.remove_interface(Hsmn(5)));
        assert!(!log.remove_interface(Hsmn(5)));
        assert_eq!(log.write(&fw, Hsmn(5), b"6"), 0);
    }

    #[test]
    fn test_print_buf_labels_each_line() {
        let fw = framework();
        let log = Log::new(4);
        let fifo: Arc<SharedPipe<u8, 512>> = Arc::default();
        log.add_interface(Hsmn(5), Arc::clone(&fifo), Signal(1), true);

        let data: Vec<u8> = (0..20).collect();
        assert_eq!(log.print_buf(&fw, Hsmn(5), &data, HexUnit::Byte, 0x1000), 20);
        log.debug_buf(&fw, Level::Trace, Hsmn(5), &data, HexUnit::Byte, 0);

        let mut out = vec![0u8; 512];
        let count = fifo.lock(|pipe| pipe.read(&mut out));
        let text = String::from_utf8_lossy(&out[..count]).into_owned();
        let lines: Vec<&str> = text.split("\n\r").collect();
        assert_eq!(lines[0], "Buffer len 20:");
        assert!(lines[1].starts_with("[0x00001000] 00 01 02"));
        assert!(lines[2].starts_with("[0x00001010] 10 11 12 13 "));
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_per_handle_switch() {
        let log = Log::new(5);
        log.off(Hsmn(3));
        assert!(!log.enabled(Hsmn(3), Level::Error));
        assert!(log.enabled(Hsmn(4), Level::Error));
        log.off_all();
        log.on(Hsmn(4));
        assert!(!log.is_on(Hsmn(5)));
        assert!(log.is_on(Hsmn(4)));
    }
}
