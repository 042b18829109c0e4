use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Link direction of a subframe or connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Downlink (base station to subscribers)
    Dl,
    /// Uplink (subscribers to base station)
    Ul,
}

/// MAC frame number, carried modulo 2^24 in the PHY synchronization field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameNumber(u32);

pub const FRAME_NUMBER_MODULUS: u32 = 1 << 24;

impl FrameNumber {
    pub fn new(v: u32) -> Self {
        FrameNumber(v % FRAME_NUMBER_MODULUS)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn next(self) -> FrameNumber {
        FrameNumber((self.0 + 1) % FRAME_NUMBER_MODULUS)
    }

    /// The 4 LSBs carried in the CDMA allocation IE.
    pub fn lsb4(self) -> u8 {
        (self.0 & 0xF) as u8
    }
}

impl Default for FrameNumber {
    fn default() -> Self {
        FrameNumber(0)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame:{}", self.0)
    }
}

/// The OFDMA PHY supports exactly nine frame duration codes; code 0 is
/// reserved. Any other duration at configuration time is a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDuration {
    Ms2 = 1,
    Ms2p5 = 2,
    Ms4 = 3,
    Ms5 = 4,
    Ms8 = 5,
    Ms10 = 6,
    Ms12p5 = 7,
    Ms20 = 8,
}

impl FrameDuration {
    pub fn from_code(code: u8) -> Option<FrameDuration> {
        match code {
            1 => Some(FrameDuration::Ms2),
            2 => Some(FrameDuration::Ms2p5),
            3 => Some(FrameDuration::Ms4),
            4 => Some(FrameDuration::Ms5),
            5 => Some(FrameDuration::Ms8),
            6 => Some(FrameDuration::Ms10),
            7 => Some(FrameDuration::Ms12p5),
            8 => Some(FrameDuration::Ms20),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn duration(self) -> Duration {
        match self {
            FrameDuration::Ms2 => Duration::from_micros(2000),
            FrameDuration::Ms2p5 => Duration::from_micros(2500),
            FrameDuration::Ms4 => Duration::from_micros(4000),
            FrameDuration::Ms5 => Duration::from_micros(5000),
            FrameDuration::Ms8 => Duration::from_micros(8000),
            FrameDuration::Ms10 => Duration::from_micros(10000),
            FrameDuration::Ms12p5 => Duration::from_micros(12500),
            FrameDuration::Ms20 => Duration::from_micros(20000),
        }
    }
}
