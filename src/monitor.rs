//! Diagnostic monitor: read, dump and debug S-Link traffic.
//!
//! The monitor only observes the line, so it is safe to run against
//! another device's traffic; it must not run concurrently with this
//! engine's own transmissions, which contend for the line direction.
//! Captured information is buffered until the timeout and then dumped
//! to the diagnostic sink in one flush, keeping the capture loop free
//! of sink latency.

use std::fmt::Write;

use crate::constants::{DIAGNOSTIC_RATE, MONITOR_TIMEOUT, PULSE_WAIT};
use crate::error::{Result, SlinkError};
use crate::hal::{Clock, DiagnosticSink, Level, Line};
use crate::protocol::Slink;
use crate::pulse::{ClassifiedSymbol, Polarity, Pulse};
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

/// Monitor output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorMode {
    /// Dump raw pulse durations in microseconds
    Timing,
    /// Decode and dump binary and hex
    BinaryHex,
    /// Decode and dump hex only
    Hex,
}

/// Monitor parameters with the conventional defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub mode: MonitorMode,
    /// Measure idle (released high) timing instead of marks. Only useful
    /// with [`MonitorMode::Timing`]; delimiters should always come back
    /// around 600 microseconds.
    pub measure_idle: bool,
    /// Monitoring window in microseconds
    pub timeout_micros: u64,
    /// Rate the diagnostic sink is opened at
    pub diagnostic_rate: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            mode: MonitorMode::Timing,
            measure_idle: false,
            timeout_micros: MONITOR_TIMEOUT,
            diagnostic_rate: DIAGNOSTIC_RATE,
        }
    }
}

impl MonitorConfig {
    pub fn new(mode: MonitorMode) -> Self {
        MonitorConfig {
            mode,
            ..MonitorConfig::default()
        }
    }
}

/// What a monitoring run saw on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Sync marks seen (frame starts)
    pub frames: u32,
    /// Complete bytes decoded
    pub bytes: u32,
    /// Pulses outside every tolerance band
    pub unknown_pulses: u32,
}

impl<L: Line, C: Clock, S: DiagnosticSink> Slink<L, C, S> {
    /// Passively capture traffic on the line until the configured timeout,
    /// then flush the formatted dump to the diagnostic sink.
    ///
    /// Each pulse is measured with a `PULSE_WAIT` cap; when no edge occurs
    /// within the cap the line is idle, which resets byte reconstruction
    /// and emits a single line break per gap. In the decode modes a sync
    /// mark emits a `START,` marker, one and zero marks accumulate a byte
    /// most significant bit first, and every completed byte is emitted as
    /// two hex digits. Unknown pulses reset the byte in progress; they are
    /// expected line noise, not errors.
    ///
    /// Fails with [`SlinkError::MonitorUnavailable`] when the engine was
    /// built without a sink capability.
    pub fn input_monitor(&mut self, config: &MonitorConfig) -> Result<CaptureSummary> {
        let Slink { line, clock, sink } = self;
        let sink = sink.as_mut().ok_or(SlinkError::MonitorUnavailable)?;
        sink.open(config.diagnostic_rate)?;
        sink.write_line(&format!(
            "Start monitor {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ))?;

        let (level, polarity) = if config.measure_idle {
            (Level::High, Polarity::Gap)
        } else {
            (Level::Low, Polarity::Mark)
        };
        let start = clock.now_micros();
        let mut buffer = String::new();
        let mut summary = CaptureSummary::default();
        let mut in_gap = false;
        let mut bit_count = 0u8;
        let mut byte_acc = 0u8;

        loop {
            let value = line.measure_pulse(level, PULSE_WAIT);
            if value == 0 {
                // idle: one line break per gap, not one per poll
                if !in_gap {
                    buffer.push('\n');
                    in_gap = true;
                }
                bit_count = 0;
                byte_acc = 0;
            } else {
                in_gap = false;
                let pulse = Pulse {
                    duration_micros: value,
                    polarity,
                };
                match config.mode {
                    MonitorMode::Timing => {
                        let _ = write!(buffer, ",{}", value);
                    }
                    MonitorMode::BinaryHex | MonitorMode::Hex => match pulse.symbol() {
                        ClassifiedSymbol::Sync => {
                            buffer.push_str("\nSTART,");
                            summary.frames += 1;
                            bit_count = 0;
                            byte_acc = 0;
                        }
                        symbol @ (ClassifiedSymbol::One | ClassifiedSymbol::Zero) => {
                            if symbol == ClassifiedSymbol::One {
                                byte_acc |= 0x80 >> bit_count;
                                if config.mode == MonitorMode::BinaryHex {
                                    buffer.push_str("1,");
                                }
                            } else if config.mode == MonitorMode::BinaryHex {
                                buffer.push_str("0,");
                            }
                            bit_count += 1;
                            if bit_count == 8 {
                                if config.mode == MonitorMode::BinaryHex {
                                    buffer.push_str(" = ");
                                }
                                let _ = write!(buffer, "{:02x},", byte_acc);
                                if config.mode == MonitorMode::BinaryHex {
                                    buffer.push_str("  ");
                                }
                                summary.bytes += 1;
                                bit_count = 0;
                                byte_acc = 0;
                            }
                        }
                        ClassifiedSymbol::Unknown => {
                            summary.unknown_pulses += 1;
                            bit_count = 0;
                            byte_acc = 0;
                        }
                    },
                }
            }
            if clock.now_micros() - start >= config.timeout_micros {
                break;
            }
        }

        sink.write_line(&buffer)?;
        sink.write_line("End monitor")?;
        debug!(
            "monitor done: {} frames, {} bytes, {} unknown pulses",
            summary.frames, summary.bytes, summary.unknown_pulses
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MARK_DELIMITER, MARK_ONE, MARK_SYNC, MARK_ZERO};
    use crate::sim::{MemorySink, SimBus, SimClock, SimLine};

    fn monitor_engine(bus: &SimBus) -> Slink<SimLine, SimClock, MemorySink> {
        Slink::with_sink(bus.line(2), bus.clock(), MemorySink::new())
    }

    fn script_byte(bus: &SimBus, value: u8) {
        for i in (0..8).rev() {
            if value & (1 << i) != 0 {
                bus.drive_low_for(MARK_ONE as u64);
            } else {
                bus.drive_low_for(MARK_ZERO as u64);
            }
            bus.drive_high_for(MARK_DELIMITER as u64);
        }
    }

    fn script_frame(bus: &SimBus, bytes: &[u8]) {
        bus.drive_low_for(MARK_SYNC as u64);
        bus.drive_high_for(MARK_DELIMITER as u64);
        for &byte in bytes {
            script_byte(bus, byte);
        }
    }

    fn config(mode: MonitorMode) -> MonitorConfig {
        MonitorConfig {
            timeout_micros: 60_000,
            ..MonitorConfig::new(mode)
        }
    }

    #[test]
    fn hex_mode_decodes_a_frame() {
        let bus = SimBus::new();
        bus.drive_high_for(1000);
        script_frame(&bus, &[0xC0, 0x2E]);
        let mut slink = monitor_engine(&bus);
        let summary = slink.input_monitor(&config(MonitorMode::Hex)).unwrap();
        let dump = slink.sink.as_ref().unwrap().dump();
        assert!(dump.contains("START,"));
        assert!(dump.contains("c0,"));
        assert!(dump.contains("2e,"));
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.bytes, 2);
        assert_eq!(summary.unknown_pulses, 0);
    }

    #[test]
    fn binary_hex_mode_dumps_bits_and_byte() {
        let bus = SimBus::new();
        bus.drive_high_for(1000);
        script_frame(&bus, &[0xC0]);
        let mut slink = monitor_engine(&bus);
        slink.input_monitor(&config(MonitorMode::BinaryHex)).unwrap();
        let dump = slink.sink.as_ref().unwrap().dump();
        assert!(dump.contains("START,"));
        assert!(dump.contains("1,1,0,0,0,0,0,0,"));
        assert!(dump.contains(" = c0,"));
    }

    #[test]
    fn timing_mode_dumps_raw_durations() {
        let bus = SimBus::new();
        bus.drive_high_for(1000);
        script_frame(&bus, &[0xC0]);
        let mut slink = monitor_engine(&bus);
        slink.input_monitor(&config(MonitorMode::Timing)).unwrap();
        let dump = slink.sink.as_ref().unwrap().dump();
        assert!(dump.contains(",2400"));
        assert!(dump.contains(",1200"));
        assert!(dump.contains(",600"));
    }

    #[test]
    fn idle_timing_measures_delimiters() {
        let bus = SimBus::new();
        script_frame(&bus, &[0xA5]);
        let mut slink = monitor_engine(&bus);
        let mut cfg = config(MonitorMode::Timing);
        cfg.measure_idle = true;
        slink.input_monitor(&cfg).unwrap();
        let dump = slink.sink.as_ref().unwrap().dump();
        assert!(dump.contains(",600"));
        assert!(!dump.contains(",2400"));
    }

    #[test]
    fn unknown_pulse_resets_byte_in_progress() {
        let bus = SimBus::new();
        bus.drive_high_for(1000);
        bus.drive_low_for(MARK_SYNC as u64);
        bus.drive_high_for(MARK_DELIMITER as u64);
        // four bits of a byte that never completes
        for _ in 0..4 {
            bus.drive_low_for(MARK_ONE as u64);
            bus.drive_high_for(MARK_DELIMITER as u64);
        }
        // noise outside every band
        bus.drive_low_for(900);
        bus.drive_high_for(MARK_DELIMITER as u64);
        script_byte(&bus, 0x2E);
        let mut slink = monitor_engine(&bus);
        let summary = slink.input_monitor(&config(MonitorMode::Hex)).unwrap();
        let dump = slink.sink.as_ref().unwrap().dump();
        assert!(dump.contains("2e,"));
        assert_eq!(summary.bytes, 1);
        assert_eq!(summary.unknown_pulses, 1);
    }

    #[test]
    fn idle_gap_breaks_line_once_per_gap() {
        let bus = SimBus::new();
        script_frame(&bus, &[0x42]);
        // long silence, then another frame
        bus.drive_high_for(20_000);
        script_frame(&bus, &[0x43]);
        let mut slink = monitor_engine(&bus);
        let summary = slink.input_monitor(&config(MonitorMode::Hex)).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.bytes, 2);
        let dump = slink.sink.as_ref().unwrap().dump();
        assert!(dump.contains("42,"));
        assert!(dump.contains("43,"));
    }

    #[test]
    fn monitor_requires_sink_capability() {
        let bus = SimBus::new();
        let mut slink = Slink::new(bus.line(2), bus.clock());
        let result = slink.input_monitor(&MonitorConfig::default());
        assert!(matches!(result, Err(SlinkError::MonitorUnavailable)));
    }

    #[test]
    fn monitor_stops_at_timeout() {
        let bus = SimBus::new();
        let mut slink = monitor_engine(&bus);
        slink.input_monitor(&config(MonitorMode::Timing)).unwrap();
        // nothing on the line: polls in PULSE_WAIT steps up to the window
        assert!(bus.now() >= 60_000);
        assert!(bus.now() < 60_000 + PULSE_WAIT as u64);
    }

    #[test]
    fn sink_opens_at_configured_rate() {
        let bus = SimBus::new();
        let mut slink = monitor_engine(&bus);
        slink.input_monitor(&config(MonitorMode::Hex)).unwrap();
        assert_eq!(slink.sink.as_ref().unwrap().opened_rate, Some(115_200));
    }
}
