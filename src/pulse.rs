//! Pulse classification.
//!
//! S-Link is a pulse-width code: the value of a bit lives entirely in how
//! long the line is held low, and the released-high phase between marks is
//! a fixed separator. Classification is a pure duration check against the
//! nominal timings with a multiplicative tolerance band.

use crate::constants::{MARK_ONE, MARK_RANGE, MARK_SYNC, MARK_ZERO};

/// Polarity of a measured pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Line driven low (data)
    Mark,
    /// Line released high (delimiter)
    Gap,
}

/// One measured pulse. Produced and classified one at a time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    /// Measured duration in microseconds
    pub duration_micros: u32,
    pub polarity: Polarity,
}

impl Pulse {
    /// A low (data) pulse
    pub fn mark(duration_micros: u32) -> Self {
        Pulse {
            duration_micros,
            polarity: Polarity::Mark,
        }
    }

    /// A released-high (delimiter) pulse
    pub fn gap(duration_micros: u32) -> Self {
        Pulse {
            duration_micros,
            polarity: Polarity::Gap,
        }
    }

    /// Classification of this pulse. Only marks carry data; the high
    /// phase is a fixed separator, so gaps classify as unknown.
    pub fn symbol(&self) -> ClassifiedSymbol {
        match self.polarity {
            Polarity::Mark => classify(self.duration_micros),
            Polarity::Gap => ClassifiedSymbol::Unknown,
        }
    }
}

/// What a low-pulse duration decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedSymbol {
    /// Start of a new frame
    Sync,
    /// A 1 bit
    One,
    /// A 0 bit
    Zero,
    /// Outside every tolerance band (noise or a true idle gap)
    Unknown,
}

/// True when `duration_micros` falls within the tolerance band
/// `[nominal / 1.2, nominal * 1.2]` of `nominal_micros`.
pub fn within_tolerance(duration_micros: u32, nominal_micros: u32) -> bool {
    let duration = duration_micros as f64;
    let nominal = nominal_micros as f64;
    duration >= nominal / MARK_RANGE && duration <= nominal * MARK_RANGE
}

/// Classify a low-pulse duration.
///
/// Sync is checked first: its band is the widest and must take precedence
/// so a sync mark is never mis-read as consecutive long one bits.
pub fn classify(duration_micros: u32) -> ClassifiedSymbol {
    if within_tolerance(duration_micros, MARK_SYNC) {
        ClassifiedSymbol::Sync
    } else if within_tolerance(duration_micros, MARK_ONE) {
        ClassifiedSymbol::One
    } else if within_tolerance(duration_micros, MARK_ZERO) {
        ClassifiedSymbol::Zero
    } else {
        ClassifiedSymbol::Unknown
    }
}
