use std::fmt;

use wimax_core::pdu_parse_error::PduParseErr;
use wimax_core::{expect_value, let_field, BitBuffer};

/// Downlink frame control header, always the first bytes of a downlink
/// physical burst after the preamble.
///
/// Layout (32 bits): preamble 8, used_subchannel_map 6,
/// rep_coding_indication 2, range_change_indication 1, coding_indication 3,
/// reserved 4, dl_map_length 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fch {
    pub preamble: u8,
    pub used_subchannel_map: u8,
    pub rep_coding_indication: u8,
    pub range_change_indication: bool,
    pub coding_indication: u8,
    /// Number of DL-MAP IEs following the DL-MAP header
    pub dl_map_length: u8,
}

/// Encoded size in bytes
pub const FCH_BYTES: u32 = 4;

impl Fch {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, preamble, 8);
        let_field!(buf, used_subchannel_map, 6);
        let_field!(buf, rep_coding_indication, 2);
        let_field!(buf, range_change_indication, 1);
        let_field!(buf, coding_indication, 3);
        let_field!(buf, reserved, 4);
        expect_value!(reserved, 0, "fch reserved")?;
        let_field!(buf, dl_map_length, 8);

        Ok(Fch {
            preamble: preamble as u8,
            used_subchannel_map: used_subchannel_map as u8,
            rep_coding_indication: rep_coding_indication as u8,
            range_change_indication: range_change_indication != 0,
            coding_indication: coding_indication as u8,
            dl_map_length: dl_map_length as u8,
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.preamble as u64, 8);
        buf.write_bits(self.used_subchannel_map as u64, 6);
        buf.write_bits(self.rep_coding_indication as u64, 2);
        buf.write_bits(self.range_change_indication as u64, 1);
        buf.write_bits(self.coding_indication as u64, 3);
        buf.write_zeroes(4);
        buf.write_bits(self.dl_map_length as u64, 8);
    }
}

impl fmt::Display for Fch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "fch {{ subch_map: {:#04x}, coding: {}, dl_map_length: {} }}",
            self.used_subchannel_map, self.coding_indication, self.dl_map_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonzero_reserved_bits_rejected() {
        let mut buf = BitBuffer::new(32);
        buf.write_bits(0xC5, 8);
        buf.write_bits(0, 6);
        buf.write_bits(0, 2);
        buf.write_bits(0, 1);
        buf.write_bits(0, 3);
        buf.write_bits(0b1010, 4); // reserved must be zero
        buf.write_bits(3, 8);
        buf.seek(0);
        let err = Fch::from_bitbuf(&mut buf).unwrap_err();
        assert_eq!(err, PduParseErr::InvalidValue { field: "fch reserved", value: 10 });
    }

    #[test]
    fn test_round_trip() {
        let fch = Fch {
            preamble: 0xC5,
            used_subchannel_map: 0x3F,
            rep_coding_indication: 2,
            range_change_indication: true,
            coding_indication: 5,
            dl_map_length: 17,
        };
        let mut buf = BitBuffer::new(32);
        fch.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), FCH_BYTES as usize * 8);
        buf.seek(0);
        assert_eq!(Fch::from_bitbuf(&mut buf).unwrap(), fch);
    }

    #[test]
    fn test_reserved_bits_written_zero() {
        let fch = Fch {
            preamble: 0,
            used_subchannel_map: 0,
            rep_coding_indication: 0,
            range_change_indication: false,
            coding_indication: 0,
            dl_map_length: 0,
        };
        let mut buf = BitBuffer::new(32);
        fch.to_bitbuf(&mut buf);
        assert_eq!(buf.into_bytes(), vec![0, 0, 0, 0]);
    }
}
