//! Protocol constants for S-Link/Control-A1 communication.
//!
//! This module defines all the constants used on the S-Link wire,
//! including pulse timings, tolerance bands, and the published device
//! ID and command opcode tables.
//!
//! Timing reference: http://boehmel.de/slink.htm

/// Sync mark: line held low this long marks the start of a frame (microseconds)
pub const MARK_SYNC: u32 = 2400;

/// One bit: line held low this long encodes a 1 (microseconds)
pub const MARK_ONE: u32 = 1200;

/// Zero bit: line held low this long encodes a 0 (microseconds)
pub const MARK_ZERO: u32 = 600;

/// Delimiter: line released high this long between every mark (microseconds)
pub const MARK_DELIMITER: u32 = 600;

/// Timing detection tolerance; a pulse matches a nominal duration within
/// [nominal / MARK_RANGE, nominal * MARK_RANGE]
pub const MARK_RANGE: f64 = 1.2;

/// Padding after transmitting a command, measured from the start of the
/// frame (microseconds; 45000 should be the correct value...)
pub const WORD_DELIMITER: u32 = 30_000;

/// Continuous high time required on the line before transmitting (microseconds)
pub const LINE_READY: u32 = 3000;

/// Timer tick during a wait operation (microseconds)
pub const LOOP_DELAY: u32 = 25;

/// Total timeout while waiting for the line to become ready (microseconds)
pub const LOOP_TIMEOUT: u32 = 500_000;

/// Longest wait for a single pulse edge while monitoring (microseconds)
pub const PULSE_WAIT: u32 = 3000;

/// Default monitoring window (microseconds)
pub const MONITOR_TIMEOUT: u64 = 10_000_000;

/// Default diagnostic sink rate (bps)
pub const DIAGNOSTIC_RATE: u32 = 115_200;

// Device ID prefixes. Ref. http://boehmel.de/slink.htm

/// MD send commands (to MD recorder), 10110000b
pub const DEVICE_MD: u8 = 0xB0;

/// AMP send commands (to amplifier, e.g. STR-DA50ES), 11000000b
pub const DEVICE_AMP: u8 = 0xC0;

/// TUNER send commands, 11000001b
pub const DEVICE_TUNER: u8 = 0xC1;

/// SUR send commands (to surround), 11000011b
pub const DEVICE_SURROUND: u8 = 0xC3;

/// AMP send commands for newer models like the STR-DA1000ES, 01110000b
pub const DEVICE_AMP_NEW: u8 = 0x70;

/// CDP-CX jukebox, CD player 1, disc number <= 200
pub const DEVICE_CDP_CX1L: u8 = 0x90;

/// CDP-CX jukebox, CD player 1, disc number > 200
pub const DEVICE_CDP_CX1H: u8 = 0x93;

/// CDP-CX jukebox, CD player 2, disc number <= 200
pub const DEVICE_CDP_CX2L: u8 = 0x91;

/// CDP-CX jukebox, CD player 2, disc number > 200
pub const DEVICE_CDP_CX2H: u8 = 0x94;

/// CDP-CX jukebox, CD player 3, disc number <= 200
pub const DEVICE_CDP_CX3L: u8 = 0x92;

/// CDP-CX jukebox, CD player 3, disc number > 200
pub const DEVICE_CDP_CX3H: u8 = 0x95;

/// CDP-CX jukebox, all CD players 1, 2, 3 (200 disc players or less)
pub const DEVICE_CDP_CXALL: u8 = 0x97;

// Commands for AMP/RECEIVER

pub const CMD_AMP_MUTE_ON: u8 = 6;
pub const CMD_AMP_MUTE_OFF: u8 = 7;
pub const CMD_AMP_5_1_IN_ON: u8 = 12;
pub const CMD_AMP_5_1_IN_OFF: u8 = 13;
pub const CMD_AMP_VOLUME_UP: u8 = 20;
pub const CMD_AMP_VOLUME_DOWN: u8 = 21;
pub const CMD_AMP_POWER_ON: u8 = 46;
pub const CMD_AMP_POWER_OFF: u8 = 47;

/// Select input channel (see the `CMDP_IN_*` parameters)
pub const CMD_AMP_SET_INPUT_CHAN: u8 = 0x50;

/// Set 2nd audio: 00=Tuner, 02=CD, 03=DAT, 04=MD, 05=Tape, 0F=Source
pub const CMD_AMP_SET_2ND_IN_AUDIO: u8 = 0x52;

/// Set input type: 01=optical, 02=coax, 04=analog
pub const CMD_AMP_SET_IN_TYPE: u8 = 0x83;

/// 88 SS [8 x CC]: set source name, SS=source (see command 0x50)
pub const CMD_AMP_SET_SOURCE_NAME: u8 = 0x88;

// Commands for TUNER

/// 03 BB: band, BB=00: FM, BB=01: AM
pub const CMD_TUNER_BAND: u8 = 3;
pub const CMD_TUNER_SCAN_UP: u8 = 6;
pub const CMD_TUNER_SCAN_DOWN: u8 = 7;
pub const CMD_TUNER_PRESET_UP: u8 = 8;
pub const CMD_TUNER_PRESET_DOWN: u8 = 9;
pub const CMD_TUNER_MONO: u8 = 10;
pub const CMD_TUNER_STEREO: u8 = 11;

/// 50 BB HH LL: direct tune.
/// BB=00: FM, (HH*256+LL)/100 = frequency in MHz, 50 kHz steps.
/// BB=01: AM, HH*256+LL = frequency in kHz, 9 kHz (USA: 10 kHz) steps.
pub const CMD_TUNER_DIRECT_TUNE: u8 = 0x50;

/// 51 BB NN: preset station, BB=[01..03] bank A..C, NN=[00..09] station
pub const CMD_TUNER_PRESET_STATION: u8 = 0x51;

/// 52 PP: PTY search, 00=None, 01=News, 02=Current Affairs, ...
pub const CMD_TUNER_PTY_SEARCH: u8 = 0x52;

// Commands for CDP, MD

pub const CMD_CD_PLAY: u8 = 0;
pub const CMD_CD_STOP: u8 = 1;
/// Toggle pause
pub const CMD_CD_PAUSE: u8 = 3;
/// Next track
pub const CMD_CD_NEXT: u8 = 8;
/// Previous track
pub const CMD_CD_PREV: u8 = 9;

// Parameters for CMD_AMP_SET_INPUT_CHAN

pub const CMDP_IN_TUNER: u8 = 0;
pub const CMDP_IN_PHONO: u8 = 1;
pub const CMDP_IN_CD: u8 = 2;
pub const CMDP_IN_DAT: u8 = 3;
pub const CMDP_IN_MD: u8 = 4;
pub const CMDP_IN_TAPE: u8 = 5;
pub const CMDP_IN_DIGITAL_AUDIO: u8 = 7;
pub const CMDP_IN_VIDEO1: u8 = 16;
pub const CMDP_IN_VIDEO2: u8 = 17;
pub const CMDP_IN_VIDEO3: u8 = 18;
pub const CMDP_IN_VIDEO4: u8 = 19;
pub const CMDP_IN_DVD_LD: u8 = 21;
pub const CMDP_IN_TV_SAT: u8 = 22;
pub const CMDP_IN_TV: u8 = 23;
pub const CMDP_IN_DVD: u8 = 25;
