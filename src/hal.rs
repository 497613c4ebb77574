//! Capability traits at the hardware boundary.
//!
//! The protocol engine never touches hardware directly; it drives one
//! [`Line`] and one [`Clock`], and optionally writes to a
//! [`DiagnosticSink`]. Implement these for your target (a GPIO character
//! device, a microcontroller pin, or the simulated bus in
//! [`crate::sim`]) and the engine runs unchanged.

use crate::error::{Result, SlinkError};

/// Direction of the shared signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Listening; the line floats at the bus pull-up level
    #[default]
    Input,
    /// Driving; the engine is the sole writer while in this state
    Output,
}

/// Logic level on the signal line. The bus idles high; marks are low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// One bidirectional digital line with switchable direction.
///
/// S-Link is an open-collector bus pulled up to +5V by the attached
/// devices, so implementations should drive low actively and release
/// rather than drive high where the hardware allows it.
pub trait Line {
    /// Identifier of the bound pin
    fn pin(&self) -> u8;

    /// Switch the line between listening and driving
    fn set_direction(&mut self, direction: Direction);

    /// Drive the line to `level` (only meaningful in output direction)
    fn write(&mut self, level: Level);

    /// Sample the current line level
    fn read(&mut self) -> Level;

    /// Block until a pulse of `polarity` completes and return its duration
    /// in microseconds, or 0 if no such pulse finishes within
    /// `timeout_micros` (the Arduino `pulseIn` contract).
    fn measure_pulse(&mut self, polarity: Level, timeout_micros: u32) -> u32;
}

/// Monotonic microsecond time source with a busy-wait delay.
///
/// `delay_micros` must not yield to other logical tasks: the waveform is
/// shaped entirely by these delays and any suspension corrupts it.
pub trait Clock {
    /// Monotonic microsecond counter
    fn now_micros(&self) -> u64;

    /// Busy-wait for `micros` microseconds
    fn delay_micros(&mut self, micros: u32);
}

/// Byte-rate text output channel for the diagnostic monitor.
pub trait DiagnosticSink {
    /// Open the channel at `rate` bps (or the closest rate-equivalent)
    fn open(&mut self, rate: u32) -> Result<()>;

    /// Write one line of text
    fn write_line(&mut self, text: &str) -> Result<()>;
}

/// Diagnostic sink over the process standard output. The rate is ignored.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn open(&mut self, _rate: u32) -> Result<()> {
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        println!("{}", text);
        Ok(())
    }
}

/// The absent diagnostic capability. Default sink type of
/// [`Slink`](crate::Slink); monitoring with it reports
/// [`SlinkError::MonitorUnavailable`].
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn open(&mut self, _rate: u32) -> Result<()> {
        Err(SlinkError::MonitorUnavailable)
    }

    fn write_line(&mut self, _text: &str) -> Result<()> {
        Err(SlinkError::MonitorUnavailable)
    }
}

/// Diagnostic sink over a host serial port, the direct analogue of the
/// serial console the protocol was reverse-engineered against.
#[cfg(feature = "serial-sink")]
pub struct SerialSink {
    port_name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

#[cfg(feature = "serial-sink")]
impl SerialSink {
    /// Create a sink for `port_name`; the port is opened by
    /// [`DiagnosticSink::open`] with the requested baud rate.
    pub fn new(port_name: &str) -> Self {
        SerialSink {
            port_name: port_name.to_string(),
            port: None,
        }
    }
}

#[cfg(feature = "serial-sink")]
impl DiagnosticSink for SerialSink {
    fn open(&mut self, rate: u32) -> Result<()> {
        let port = serialport::new(&self.port_name, rate)
            .timeout(std::time::Duration::from_millis(2000))
            .open()?;
        self.port = Some(port);
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        use std::io::Write;

        let port = self.port.as_mut().ok_or(SlinkError::SinkNotOpen)?;
        port.write_all(text.as_bytes())?;
        port.write_all(b"\r\n")?;
        Ok(())
    }
}
