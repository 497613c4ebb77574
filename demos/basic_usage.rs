//! Basic Usage Example
//!
//! This example demonstrates the core functionality of the S-Link protocol
//! library on the simulated bus, so it runs without any hardware:
//! - Binding the engine to a line and clock
//! - Sending one-byte and multi-byte commands
//! - The send-twice convention for an unacknowledged bus
//! - Inspecting the transmitted waveform pulse by pulse
//!
//! Usage:
//!   cargo run --example basic_usage
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example basic_usage
//!   RUST_LOG=trace cargo run --example basic_usage

use log::info;
use slink_protocol::constants::{
    CMDP_IN_CD, CMD_AMP_SET_INPUT_CHAN, CMD_AMP_VOLUME_UP, DEVICE_AMP,
};
use slink_protocol::sim::SimBus;
use slink_protocol::{classify, Command, Result, Slink};

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bus = SimBus::new();
    let mut slink = Slink::new(bus.line(2), bus.clock());
    info!("Engine bound to pin {}", slink.pin());

    info!("=== Volume Up ===");
    // The bus has no acknowledgement layer: issue every command twice in
    // case the first transmission collided with incoming traffic.
    slink.send(DEVICE_AMP, CMD_AMP_VOLUME_UP);
    slink.send(DEVICE_AMP, CMD_AMP_VOLUME_UP);

    info!("=== Select CD Input ===");
    let select_cd = Command::with_params(
        DEVICE_AMP,
        CMD_AMP_SET_INPUT_CHAN,
        Some(CMDP_IN_CD),
        None,
    );
    slink.send_command(&select_cd);
    slink.send_command(&select_cd);

    info!("=== Transmitted Waveform ===");
    info!(
        "{} low pulses in {} us of virtual bus time",
        bus.low_pulses().len(),
        bus.now()
    );
    for duration in bus.low_pulses().iter().take(9) {
        info!("{:5} us -> {:?}", duration, classify(*duration));
    }

    info!("=== Basic Usage Complete ===");

    Ok(())
}
