use std::fmt;

use wimax_core::Direction;

/// Modulation and coding pairs the OFDMA downlink/uplink burst profiles
/// can carry. Mapped to DIUC/UIUC codes by the service-flow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodingScheme {
    Bpsk,
    Qpsk12,
    Qpsk34,
    Qam16R12,
    Qam16R34,
    Qam64R12,
    Qam64R23,
    Qam64R34,
}

impl CodingScheme {
    pub fn from_code(v: u8) -> Option<CodingScheme> {
        match v {
            0 => Some(CodingScheme::Bpsk),
            1 => Some(CodingScheme::Qpsk12),
            2 => Some(CodingScheme::Qpsk34),
            3 => Some(CodingScheme::Qam16R12),
            4 => Some(CodingScheme::Qam16R34),
            5 => Some(CodingScheme::Qam64R12),
            6 => Some(CodingScheme::Qam64R23),
            7 => Some(CodingScheme::Qam64R34),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityErr {
    /// The coding scheme carries no payload bits in this direction
    UnsupportedBurstProfile { coding: CodingScheme, direction: Direction },
}

impl fmt::Display for CapacityErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CapacityErr::UnsupportedBurstProfile { coding, direction } => {
                write!(f, "unsupported burst profile {:?} on {:?}", coding, direction)
            }
        }
    }
}

/// Capacity model of the physical layer as seen by the scheduler.
///
/// All bookkeeping is in physical slots (PS): one subchannel wide and
/// `symbols_per_ps` OFDMA symbols long.
pub trait PhyProfile {
    /// Payload bits one PS carries under the given coding scheme.
    /// Zero means the profile is not usable for data in that direction.
    fn bits_per_ps(&self, coding: CodingScheme, direction: Direction) -> u32;

    /// OFDMA symbols that make up one PS column
    fn symbols_per_ps(&self, direction: Direction) -> u32;

    /// Symbols reserved for the downlink preamble at the frame start
    fn preamble_symbols(&self) -> u32 {
        1
    }

    /// Fixed per-frame byte overhead for FCH and the map message headers
    fn frame_overhead_bytes(&self) -> u32 {
        8
    }

    /// Slots needed to carry `byte_count` payload bytes, rounded up.
    fn slots_needed(
        &self,
        byte_count: u32,
        coding: CodingScheme,
        direction: Direction,
    ) -> Result<u32, CapacityErr> {
        let bits = self.bits_per_ps(coding, direction);
        if bits == 0 {
            return Err(CapacityErr::UnsupportedBurstProfile { coding, direction });
        }
        Ok((byte_count * 8).div_ceil(bits))
    }
}

/// OFDMA PUSC capacity table. 48 data carriers per subchannel per symbol;
/// the downlink pairs two symbols per slot, the uplink tiles three.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfdmaPhy;

impl OfdmaPhy {
    /// Payload bits per subchannel for a single OFDMA symbol
    fn bits_per_subchannel_symbol(coding: CodingScheme) -> u32 {
        match coding {
            CodingScheme::Bpsk => 24,
            CodingScheme::Qpsk12 => 48,
            CodingScheme::Qpsk34 => 72,
            CodingScheme::Qam16R12 => 96,
            CodingScheme::Qam16R34 => 144,
            CodingScheme::Qam64R12 => 144,
            CodingScheme::Qam64R23 => 192,
            CodingScheme::Qam64R34 => 216,
        }
    }
}

impl PhyProfile for OfdmaPhy {
    fn bits_per_ps(&self, coding: CodingScheme, direction: Direction) -> u32 {
        Self::bits_per_subchannel_symbol(coding) * self.symbols_per_ps(direction)
    }

    fn symbols_per_ps(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Dl => 2,
            Direction::Ul => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_needed_rounds_up() {
        let phy = OfdmaPhy;
        // QPSK 1/2 downlink: 96 bits = 12 bytes per slot
        assert_eq!(phy.slots_needed(12, CodingScheme::Qpsk12, Direction::Dl), Ok(1));
        assert_eq!(phy.slots_needed(13, CodingScheme::Qpsk12, Direction::Dl), Ok(2));
        assert_eq!(phy.slots_needed(0, CodingScheme::Qpsk12, Direction::Dl), Ok(0));
    }

    #[test]
    fn test_uplink_slot_is_larger() {
        let phy = OfdmaPhy;
        let dl = phy.bits_per_ps(CodingScheme::Qam16R12, Direction::Dl);
        let ul = phy.bits_per_ps(CodingScheme::Qam16R12, Direction::Ul);
        assert_eq!(dl, 192);
        assert_eq!(ul, 288);
    }

    #[test]
    fn test_code_mapping_round_trip() {
        for v in 0..8 {
            assert!(CodingScheme::from_code(v).is_some());
        }
        assert_eq!(CodingScheme::from_code(8), None);
    }
}
