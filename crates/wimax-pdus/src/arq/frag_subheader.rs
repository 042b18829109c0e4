use std::fmt;

use wimax_core::pdu_parse_error::PduParseErr;
use wimax_core::{let_field, BitBuffer, Bsn};

/// Fragmentation state of one ARQ block relative to its SDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragControl {
    /// The block carries an entire SDU
    Unfragmented = 0,
    /// Last fragment of an SDU
    Last = 1,
    /// First fragment of an SDU
    First = 2,
    /// Continuing fragment
    Middle = 3,
}

impl FragControl {
    pub fn from_raw(v: u8) -> FragControl {
        match v & 0x3 {
            0 => FragControl::Unfragmented,
            1 => FragControl::Last,
            2 => FragControl::First,
            _ => FragControl::Middle,
        }
    }
}

/// Fragmentation subheader prefixed to every ARQ block on the wire.
///
/// Layout (16 bits): fc 2, bsn 11, padding 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragSubheader {
    pub fc: FragControl,
    pub bsn: Bsn,
}

/// Encoded size in bytes
pub const FRAG_SUBHEADER_BYTES: u32 = 2;

impl FragSubheader {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, fc, 2);
        let_field!(buf, bsn, 11);
        let_field!(buf, _padding, 3);

        Ok(FragSubheader {
            fc: FragControl::from_raw(fc as u8),
            bsn: Bsn(bsn as u16),
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.fc as u64, 2);
        buf.write_bits(self.bsn.0 as u64, 11);
        buf.write_zeroes(3);
    }
}

impl fmt::Display for FragSubheader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "frag {{ {:?}, {} }}", self.fc, self.bsn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_fc_values() {
        for fc in [FragControl::Unfragmented, FragControl::Last, FragControl::First, FragControl::Middle] {
            let sh = FragSubheader { fc, bsn: Bsn(2047) };
            let mut buf = BitBuffer::new(16);
            sh.to_bitbuf(&mut buf);
            buf.seek(0);
            assert_eq!(FragSubheader::from_bitbuf(&mut buf).unwrap(), sh);
        }
    }
}
