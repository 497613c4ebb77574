//! # S-Link Protocol Library
//!
//! A Rust library for driving the Sony S-Link/Control-A1 single-wire,
//! half-duplex control bus with a bit-banged GPIO line. It sends
//! multi-byte command frames to AV devices (amplifiers, tuners, CD/MD
//! transports) and passively decodes bus traffic for diagnostics.
//!
//! The protocol is very slow: around 355 bps half duplex, with a
//! standard two-byte transmission taking about 45 milliseconds. There
//! is no acknowledgement layer; issue every command twice in case the
//! first collided with a response from another device.
//!
//! ## Features
//!
//! - Pulse-width encoded frame transmission with idle-line sensing
//! - Microsecond-accurate timing behind portable [`Line`](hal::Line) and
//!   [`Clock`](hal::Clock) capability traits
//! - Passive bus monitor with raw-timing, binary+hex and hex dump modes
//! - Published device ID and command opcode tables
//! - Deterministic host-side simulation of the bus for testing
//!
//! ## Example
//!
//! ```no_run
//! use slink_protocol::constants::{CMD_AMP_VOLUME_UP, DEVICE_AMP};
//! use slink_protocol::sim::SimBus;
//! use slink_protocol::Slink;
//!
//! let bus = SimBus::new();
//! let mut slink = Slink::new(bus.line(2), bus.clock());
//! // no acknowledgement on the bus: send twice
//! slink.send(DEVICE_AMP, CMD_AMP_VOLUME_UP);
//! slink.send(DEVICE_AMP, CMD_AMP_VOLUME_UP);
//! ```

pub mod constants;
pub mod error;
pub mod hal;
pub mod monitor;
pub mod protocol;
pub mod pulse;
pub mod sim;

pub use error::{Result, SlinkError};
pub use hal::{Clock, DiagnosticSink, Direction, Level, Line, NullSink, StdoutSink};
pub use monitor::{CaptureSummary, MonitorConfig, MonitorMode};
pub use protocol::{Command, Slink};
pub use pulse::{classify, within_tolerance, ClassifiedSymbol, Polarity, Pulse};

#[cfg(feature = "serial-sink")]
pub use hal::SerialSink;
