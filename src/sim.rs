//! Host-side simulation of the bus, clock and diagnostic sink.
//!
//! [`SimBus`] keeps a virtual microsecond clock: [`Clock::delay_micros`]
//! advances it instead of sleeping, so a full padded frame (tens of
//! milliseconds on real hardware) simulates instantly and deterministically.
//! Incoming traffic is scripted as level segments with [`SimBus::drive_low_for`]
//! and [`SimBus::drive_high_for`]; everything the engine writes is recorded
//! with its timestamp and can be read back as low-pulse durations.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::hal::{Clock, DiagnosticSink, Direction, Level, Line};

#[derive(Debug, Default)]
struct BusState {
    now: u64,
    // scripted incoming traffic as contiguous (start, end, level) segments;
    // outside any segment the pull-up holds the line high
    input: Vec<(u64, u64, Level)>,
    sched_end: u64,
    writes: Vec<(u64, Level)>,
    directions: Vec<(u64, Direction)>,
}

impl BusState {
    fn level_at(&self, t: u64) -> Level {
        for &(start, end, level) in &self.input {
            if t >= start && t < end {
                return level;
            }
        }
        Level::High
    }
}

/// A simulated single-wire bus shared by one [`SimLine`] and one [`SimClock`].
#[derive(Clone, Default)]
pub struct SimBus {
    state: Rc<RefCell<BusState>>,
}

impl SimBus {
    pub fn new() -> Self {
        SimBus::default()
    }

    /// A line handle on this bus, bound to `pin`
    pub fn line(&self, pin: u8) -> SimLine {
        SimLine {
            state: Rc::clone(&self.state),
            pin,
        }
    }

    /// The virtual clock of this bus
    pub fn clock(&self) -> SimClock {
        SimClock {
            state: Rc::clone(&self.state),
        }
    }

    /// Current virtual time in microseconds
    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Script another device holding the line low for `micros`
    pub fn drive_low_for(&self, micros: u64) {
        self.push_segment(micros, Level::Low);
    }

    /// Script the line staying released high for `micros`
    pub fn drive_high_for(&self, micros: u64) {
        self.push_segment(micros, Level::High);
    }

    fn push_segment(&self, micros: u64, level: Level) {
        let mut state = self.state.borrow_mut();
        let start = state.sched_end;
        let end = start + micros;
        state.input.push((start, end, level));
        state.sched_end = end;
    }

    /// Every recorded write as (timestamp, level)
    pub fn writes(&self) -> Vec<(u64, Level)> {
        self.state.borrow().writes.clone()
    }

    /// Durations of the low phases the engine drove, in write order
    pub fn low_pulses(&self) -> Vec<u32> {
        let state = self.state.borrow();
        let mut pulses = Vec::new();
        let mut low_since = None;
        for &(t, level) in &state.writes {
            match (level, low_since) {
                (Level::Low, None) => low_since = Some(t),
                (Level::High, Some(start)) => {
                    pulses.push((t - start) as u32);
                    low_since = None;
                }
                _ => {}
            }
        }
        pulses
    }

    /// Every direction change in order
    pub fn directions(&self) -> Vec<Direction> {
        self.state.borrow().directions.iter().map(|&(_, d)| d).collect()
    }
}

/// Simulated [`Line`]; all handles from the same [`SimBus`] share one wire.
pub struct SimLine {
    state: Rc<RefCell<BusState>>,
    pin: u8,
}

impl Line for SimLine {
    fn pin(&self) -> u8 {
        self.pin
    }

    fn set_direction(&mut self, direction: Direction) {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        state.directions.push((now, direction));
    }

    fn write(&mut self, level: Level) {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        state.writes.push((now, level));
    }

    fn read(&mut self) -> Level {
        let state = self.state.borrow();
        state.level_at(state.now)
    }

    fn measure_pulse(&mut self, polarity: Level, timeout_micros: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        let deadline = now + timeout_micros as u64;
        // next scripted pulse of the requested polarity starting from now;
        // a pulse already in progress is skipped, as pulseIn does
        let pulse = state
            .input
            .iter()
            .find(|&&(start, _, level)| level == polarity && start >= now)
            .copied();
        match pulse {
            Some((start, end, _)) if start < deadline => {
                state.now = end;
                (end - start) as u32
            }
            _ => {
                state.now = deadline;
                0
            }
        }
    }
}

/// Simulated [`Clock`] over the bus's virtual time.
pub struct SimClock {
    state: Rc<RefCell<BusState>>,
}

impl Clock for SimClock {
    fn now_micros(&self) -> u64 {
        self.state.borrow().now
    }

    fn delay_micros(&mut self, micros: u32) {
        self.state.borrow_mut().now += micros as u64;
    }
}

/// In-memory [`DiagnosticSink`] recording everything written to it.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Rate passed to the last `open` call
    pub opened_rate: Option<u32>,
    /// Every line written, in order
    pub lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// All captured lines joined with newlines
    pub fn dump(&self) -> String {
        self.lines.join("\n")
    }
}

impl DiagnosticSink for MemorySink {
    fn open(&mut self, rate: u32) -> Result<()> {
        self.opened_rate = Some(rate);
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        self.lines.push(text.to_string());
        Ok(())
    }
}
