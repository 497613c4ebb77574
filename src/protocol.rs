//! The S-Link protocol engine: line-ready sensing, sync and byte
//! transmission, and post-frame padding.
//!
//! S-Link has no bus arbitration logic. Any participant may transmit at
//! any time, so collisions are possible but rare; sampling the line
//! immediately before transmitting prevents them in nearly all cases.
//! There is no acknowledgement layer either: a send always "succeeds",
//! and callers are advised to issue every command twice in case the
//! first transmission collided with a response from another device.

use crate::constants::*;
use crate::error::{Result, SlinkError};
use crate::hal::{Clock, DiagnosticSink, Direction, Level, Line, NullSink};
use log::{debug, trace, warn};

/// One S-Link command: a device ID followed by 1 to 3 command bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    device_id: u8,
    codes: Vec<u8>,
}

impl Command {
    /// A single-byte command addressed to `device_id`.
    pub fn new(device_id: u8, command_id: u8) -> Self {
        Command {
            device_id,
            codes: vec![command_id],
        }
    }

    /// A command with optional second and third command bytes, mirroring
    /// the wire layout `device, cmd1 [, cmd2 [, cmd3]]`.
    pub fn with_params(device_id: u8, command_id: u8, param1: Option<u8>, param2: Option<u8>) -> Self {
        let mut codes = vec![command_id];
        codes.extend(param1);
        codes.extend(param2);
        Command { device_id, codes }
    }

    /// A command from a raw code slice; must hold 1 to 3 bytes.
    pub fn from_codes(device_id: u8, codes: &[u8]) -> Result<Self> {
        if codes.is_empty() || codes.len() > 3 {
            return Err(SlinkError::InvalidCommand { count: codes.len() });
        }
        Ok(Command {
            device_id,
            codes: codes.to_vec(),
        })
    }

    /// Target device ID (first byte on the wire)
    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    /// Command bytes following the device ID
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }
}

/// Scoped output acquisition: switches the line to output on creation and
/// restores input on every exit path, so the line can never be left stuck
/// driving the bus. While a guard exists it is the sole writer.
pub(crate) struct OutputGuard<'a, L: Line> {
    line: &'a mut L,
}

impl<'a, L: Line> OutputGuard<'a, L> {
    pub(crate) fn new(line: &'a mut L) -> Self {
        line.set_direction(Direction::Output);
        OutputGuard { line }
    }

    /// Hold the line low for `MARK_SYNC`, then release for one delimiter.
    /// Marks the beginning of a new transmission.
    pub(crate) fn write_sync<C: Clock>(&mut self, clock: &mut C) {
        self.line.write(Level::Low);
        clock.delay_micros(MARK_SYNC);
        self.line.write(Level::High);
        clock.delay_micros(MARK_DELIMITER);
    }

    /// Pulse-width encode one byte, most significant bit first: the line
    /// is held low `MARK_ONE` for a 1 and `MARK_ZERO` for a 0, and
    /// released high for `MARK_DELIMITER` after every mark.
    ///
    /// The waveform is shaped entirely by busy-wait delays; the engine
    /// does not mask interrupts, so on bare-metal targets any masking
    /// belongs in the [`Clock`] implementation. The 1.2 tolerance band
    /// absorbs small scheduling jitter.
    pub(crate) fn write_byte<C: Clock>(&mut self, clock: &mut C, value: u8) {
        trace!("writing byte {:#04x}", value);
        for i in (0..8).rev() {
            self.line.write(Level::Low);
            if value & (1 << i) != 0 {
                clock.delay_micros(MARK_ONE);
            } else {
                clock.delay_micros(MARK_ZERO);
            }
            self.line.write(Level::High);
            clock.delay_micros(MARK_DELIMITER);
        }
    }
}

impl<L: Line> Drop for OutputGuard<'_, L> {
    fn drop(&mut self) {
        self.line.set_direction(Direction::Input);
    }
}

/// The protocol engine, bound to one line and one clock.
///
/// The diagnostic sink is an optional capability injected at
/// construction; without one the engine still transmits but
/// [`input_monitor`](Slink::input_monitor) is unavailable.
///
/// All operations are synchronous and blocking for their full duration;
/// a [`send_command`](Slink::send_command) blocks for roughly the padded
/// frame length (tens of milliseconds). Nothing else may touch the same
/// pin while an engine owns it.
pub struct Slink<L: Line, C: Clock, S: DiagnosticSink = NullSink> {
    pub(crate) line: L,
    pub(crate) clock: C,
    pub(crate) sink: Option<S>,
}

impl<L: Line, C: Clock> Slink<L, C> {
    /// Bind an engine to `line`, leaving it in input (listening)
    /// direction. No diagnostic sink capability.
    pub fn new(line: L, clock: C) -> Self {
        let mut slink = Slink {
            line,
            clock,
            sink: None,
        };
        slink.init();
        slink
    }
}

impl<L: Line, C: Clock, S: DiagnosticSink> Slink<L, C, S> {
    /// Bind an engine with a diagnostic sink capability, enabling
    /// [`input_monitor`](Slink::input_monitor).
    pub fn with_sink(line: L, clock: C, sink: S) -> Self {
        let mut slink = Slink {
            line,
            clock,
            sink: Some(sink),
        };
        slink.init();
        slink
    }

    /// Set the line to input direction. Idempotent; called on
    /// construction. The line stays input except while transmitting.
    ///
    /// Activating an internal pull-up is not needed: S-Link is already
    /// pulled up to +5.1V by the attached devices. Do not forget a diode
    /// and a 220 Ohm series resistor towards the Control-A1 jack to limit
    /// the current drawn in case of a transmission collision.
    pub fn init(&mut self) {
        self.line.set_direction(Direction::Input);
    }

    /// Identifier of the bound pin
    pub fn pin(&self) -> u8 {
        self.line.pin()
    }

    /// Send a single-byte command to a device.
    pub fn send(&mut self, device_id: u8, command_id: u8) {
        self.send_command(&Command::new(device_id, command_id));
    }

    /// Transmit one command frame: wait for the line to be ready, drive
    /// sync + device byte + command bytes, release the line, then pad
    /// with the line high until `WORD_DELIMITER` microseconds have passed
    /// since transmission began. Padding stops early if another device
    /// starts transmitting meanwhile (the padding rule is apparently not
    /// very strict).
    ///
    /// There is no acknowledgement: this never fails. Issue every command
    /// twice in case the first collided with incoming traffic.
    pub fn send_command(&mut self, command: &Command) {
        debug!(
            "sending frame to device {:#04x}: {:02x?}",
            command.device_id(),
            command.codes()
        );
        self.line.set_direction(Direction::Input);
        self.line_ready();
        let start = self.clock.now_micros();
        {
            let Slink { line, clock, .. } = self;
            let mut tx = OutputGuard::new(line);
            tx.write_sync(clock);
            tx.write_byte(clock, command.device_id());
            for &code in command.codes() {
                tx.write_byte(clock, code);
            }
        }
        // pad the frame (line released high) out to WORD_DELIMITER
        loop {
            self.clock.delay_micros(LOOP_DELAY);
            if self.line.read() == Level::Low {
                debug!("padding aborted, incoming traffic on pin {}", self.line.pin());
                break;
            }
            if self.clock.now_micros() - start >= WORD_DELIMITER as u64 {
                break;
            }
        }
    }

    /// Wait for a continuous `LINE_READY` microseconds of high before
    /// transmitting, polling every `LOOP_DELAY` microseconds and
    /// resetting the count whenever traffic is detected.
    ///
    /// Returns false when `LOOP_TIMEOUT` elapses first; the caller
    /// proceeds regardless, trading correctness for liveness.
    fn line_ready(&mut self) -> bool {
        let begin = self.clock.now_micros();
        let mut last_low = begin;
        loop {
            self.clock.delay_micros(LOOP_DELAY);
            let now = self.clock.now_micros();
            if self.line.read() == Level::Low {
                last_low = now;
            }
            if now - last_low >= LINE_READY as u64 {
                return true;
            }
            if now - begin >= LOOP_TIMEOUT as u64 {
                warn!(
                    "line on pin {} still busy after {}us, transmitting anyway",
                    self.line.pin(),
                    LOOP_TIMEOUT
                );
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::{classify, ClassifiedSymbol};
    use crate::sim::{SimBus, SimClock, SimLine};

    fn engine(bus: &SimBus) -> Slink<SimLine, SimClock> {
        Slink::new(bus.line(2), bus.clock())
    }

    fn decode_pulses(pulses: &[u32]) -> u8 {
        assert_eq!(pulses.len(), 8);
        let mut value = 0u8;
        for (i, &duration) in pulses.iter().enumerate() {
            match classify(duration) {
                ClassifiedSymbol::One => value |= 0x80 >> i,
                ClassifiedSymbol::Zero => {}
                other => panic!("unexpected symbol {:?} for {}us", other, duration),
            }
        }
        value
    }

    #[test]
    fn write_byte_round_trips_all_values() {
        for value in 0..=255u8 {
            let bus = SimBus::new();
            let mut line = bus.line(2);
            let mut clock = bus.clock();
            {
                let mut tx = OutputGuard::new(&mut line);
                tx.write_byte(&mut clock, value);
            }
            assert_eq!(decode_pulses(&bus.low_pulses()), value);
        }
    }

    #[test]
    fn sync_mark_classifies_as_sync() {
        let bus = SimBus::new();
        let mut line = bus.line(2);
        let mut clock = bus.clock();
        {
            let mut tx = OutputGuard::new(&mut line);
            tx.write_sync(&mut clock);
        }
        let pulses = bus.low_pulses();
        assert_eq!(pulses.len(), 1);
        assert_eq!(classify(pulses[0]), ClassifiedSymbol::Sync);
    }

    #[test]
    fn output_guard_restores_input_direction() {
        let bus = SimBus::new();
        let mut line = bus.line(2);
        {
            let _tx = OutputGuard::new(&mut line);
        }
        assert_eq!(
            bus.directions(),
            vec![Direction::Output, Direction::Input]
        );
    }

    #[test]
    fn init_is_idempotent() {
        let bus = SimBus::new();
        let mut slink = engine(&bus);
        slink.init();
        slink.init();
        assert_eq!(slink.pin(), 2);
        assert!(bus.directions().iter().all(|&d| d == Direction::Input));
    }

    #[test]
    fn send_command_frame_decodes_on_the_wire() {
        let bus = SimBus::new();
        let mut slink = engine(&bus);
        slink.send_command(&Command::with_params(
            DEVICE_AMP,
            CMD_AMP_SET_INPUT_CHAN,
            Some(CMDP_IN_CD),
            None,
        ));
        let pulses = bus.low_pulses();
        // sync + 3 bytes
        assert_eq!(pulses.len(), 1 + 3 * 8);
        assert_eq!(classify(pulses[0]), ClassifiedSymbol::Sync);
        assert_eq!(decode_pulses(&pulses[1..9]), DEVICE_AMP);
        assert_eq!(decode_pulses(&pulses[9..17]), CMD_AMP_SET_INPUT_CHAN);
        assert_eq!(decode_pulses(&pulses[17..25]), CMDP_IN_CD);
    }

    #[test]
    fn send_command_restores_input_after_frame() {
        let bus = SimBus::new();
        let mut slink = engine(&bus);
        slink.send(DEVICE_AMP, CMD_AMP_VOLUME_UP);
        let directions = bus.directions();
        assert!(directions.contains(&Direction::Output));
        assert_eq!(directions.last(), Some(&Direction::Input));
    }

    #[test]
    fn send_command_pads_frame_to_word_delimiter() {
        let bus = SimBus::new();
        let mut slink = engine(&bus);
        slink.send(DEVICE_AMP, CMD_AMP_VOLUME_UP);
        // idle line: line_ready takes LINE_READY, then the frame is padded
        // out to WORD_DELIMITER from its start
        assert!(bus.now() >= (LINE_READY + WORD_DELIMITER) as u64);
        assert!(bus.now() < (LINE_READY + WORD_DELIMITER + 1000) as u64);
    }

    #[test]
    fn send_command_stops_padding_on_incoming_traffic() {
        let bus = SimBus::new();
        // quiet long enough for line_ready and the frame itself, then
        // another device starts transmitting during the padding phase
        bus.drive_high_for(28_000);
        bus.drive_low_for(600_000);
        let mut slink = engine(&bus);
        slink.send(DEVICE_AMP, CMD_AMP_VOLUME_UP);
        assert!(bus.now() < (LINE_READY + WORD_DELIMITER) as u64);
        assert!(!bus.low_pulses().is_empty());
    }

    #[test]
    fn line_ready_gives_up_after_loop_timeout() {
        let bus = SimBus::new();
        // line jammed low far longer than the overall timeout
        bus.drive_low_for(1_000_000);
        let mut slink = engine(&bus);
        slink.send(DEVICE_AMP, CMD_AMP_POWER_ON);
        // gave up at LOOP_TIMEOUT and transmitted anyway
        assert!(bus.now() >= LOOP_TIMEOUT as u64);
        assert!(bus.now() < (LOOP_TIMEOUT + WORD_DELIMITER) as u64);
        assert_eq!(bus.low_pulses().len(), 1 + 2 * 8);
    }

    #[test]
    fn line_ready_waits_out_traffic_then_sends() {
        let bus = SimBus::new();
        // a burst of traffic, then the line goes quiet
        bus.drive_low_for(5_000);
        bus.drive_high_for(100_000);
        let mut slink = engine(&bus);
        slink.send(DEVICE_AMP, CMD_AMP_MUTE_ON);
        // waited for the burst plus LINE_READY of continuous high
        assert!(bus.now() >= (5_000 + LINE_READY) as u64);
        assert!(bus.now() < LOOP_TIMEOUT as u64);
        assert_eq!(bus.low_pulses().len(), 1 + 2 * 8);
    }

    #[test]
    fn command_code_count_is_validated() {
        assert!(Command::from_codes(DEVICE_AMP, &[]).is_err());
        assert!(Command::from_codes(DEVICE_AMP, &[1, 2, 3, 4]).is_err());
        let command = Command::from_codes(DEVICE_AMP, &[1, 2, 3]).unwrap();
        assert_eq!(command.codes(), &[1, 2, 3]);
        assert_eq!(command.device_id(), DEVICE_AMP);
    }

    #[test]
    fn with_params_matches_wire_layout() {
        let command = Command::with_params(DEVICE_TUNER, CMD_TUNER_BAND, Some(0), None);
        assert_eq!(command.codes(), &[CMD_TUNER_BAND, 0]);
        let command = Command::new(DEVICE_MD, CMD_CD_PLAY);
        assert_eq!(command.codes(), &[CMD_CD_PLAY]);
    }
}
