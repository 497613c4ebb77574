//! Input Monitor Example
//!
//! This example scripts some bus traffic on the simulated line and runs
//! the diagnostic monitor over it in each output mode:
//! - Raw pulse timings
//! - Binary + hex decode
//! - Hex-only decode
//!
//! Usage:
//!   cargo run --example monitor
//!
//! On real hardware the same code monitors live bus traffic; swap the
//! simulated line for your GPIO binding and raise the timeout.

use log::info;
use slink_protocol::constants::{
    CMD_AMP_POWER_ON, DEVICE_AMP, MARK_DELIMITER, MARK_ONE, MARK_SYNC, MARK_ZERO,
};
use slink_protocol::sim::SimBus;
use slink_protocol::{MonitorConfig, MonitorMode, Result, Slink, StdoutSink};

/// Script one frame of incoming traffic onto the simulated bus.
fn script_frame(bus: &SimBus, bytes: &[u8]) {
    bus.drive_low_for(MARK_SYNC as u64);
    bus.drive_high_for(MARK_DELIMITER as u64);
    for &byte in bytes {
        for i in (0..8).rev() {
            if byte & (1 << i) != 0 {
                bus.drive_low_for(MARK_ONE as u64);
            } else {
                bus.drive_low_for(MARK_ZERO as u64);
            }
            bus.drive_high_for(MARK_DELIMITER as u64);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    for mode in [MonitorMode::Timing, MonitorMode::BinaryHex, MonitorMode::Hex] {
        let bus = SimBus::new();
        bus.drive_high_for(1_000);
        script_frame(&bus, &[DEVICE_AMP, CMD_AMP_POWER_ON]);
        bus.drive_high_for(10_000);
        script_frame(&bus, &[DEVICE_AMP, CMD_AMP_POWER_ON]);

        let mut slink = Slink::with_sink(bus.line(2), bus.clock(), StdoutSink);
        info!("=== Monitor in {:?} mode ===", mode);
        let config = MonitorConfig {
            timeout_micros: 100_000,
            ..MonitorConfig::new(mode)
        };
        let summary = slink.input_monitor(&config)?;
        info!("Capture summary: {}", serde_json::to_string(&summary).unwrap());
    }

    Ok(())
}
