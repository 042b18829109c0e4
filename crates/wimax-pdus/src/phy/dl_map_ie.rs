use std::fmt;

use wimax_core::pdu_parse_error::PduParseErr;
use wimax_core::{let_field, BitBuffer};

/// One DL-MAP information element: the position and shape of a downlink
/// burst within the OFDMA time/frequency grid, plus the burst profile
/// (DIUC) it is transmitted with.
///
/// Layout (40 bits): diuc 4, padding 4, symbol_offset 8,
/// subchannel_offset 6, boosting 3, num_symbols 7, num_subchannels 6,
/// rep_coding_indication 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlMapIe {
    pub diuc: u8,
    pub symbol_offset: u8,
    pub subchannel_offset: u8,
    pub boosting: u8,
    pub num_symbols: u8,
    pub num_subchannels: u8,
    pub rep_coding_indication: u8,
}

/// Encoded size in bytes
pub const DL_MAP_IE_BYTES: u32 = 5;

impl DlMapIe {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, diuc, 4);
        let_field!(buf, _padding, 4);
        let_field!(buf, symbol_offset, 8);
        let_field!(buf, subchannel_offset, 6);
        let_field!(buf, boosting, 3);
        let_field!(buf, num_symbols, 7);
        let_field!(buf, num_subchannels, 6);
        let_field!(buf, rep_coding_indication, 2);

        Ok(DlMapIe {
            diuc: diuc as u8,
            symbol_offset: symbol_offset as u8,
            subchannel_offset: subchannel_offset as u8,
            boosting: boosting as u8,
            num_symbols: num_symbols as u8,
            num_subchannels: num_subchannels as u8,
            rep_coding_indication: rep_coding_indication as u8,
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.diuc as u64, 4);
        buf.write_zeroes(4);
        buf.write_bits(self.symbol_offset as u64, 8);
        buf.write_bits(self.subchannel_offset as u64, 6);
        buf.write_bits(self.boosting as u64, 3);
        buf.write_bits(self.num_symbols as u64, 7);
        buf.write_bits(self.num_subchannels as u64, 6);
        buf.write_bits(self.rep_coding_indication as u64, 2);
    }
}

impl fmt::Display for DlMapIe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "dl_map_ie {{ diuc: {}, sym: {}+{}, subch: {}+{} }}",
            self.diuc, self.symbol_offset, self.num_symbols, self.subchannel_offset, self.num_subchannels
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let ie = DlMapIe {
            diuc: 7,
            symbol_offset: 200,
            subchannel_offset: 30,
            boosting: 3,
            num_symbols: 100,
            num_subchannels: 60,
            rep_coding_indication: 1,
        };
        let mut buf = BitBuffer::new(40);
        ie.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), DL_MAP_IE_BYTES as usize * 8);
        buf.seek(0);
        assert_eq!(DlMapIe::from_bitbuf(&mut buf).unwrap(), ie);
    }

    #[test]
    fn test_round_trip_field_extremes() {
        for ie in [
            DlMapIe {
                diuc: 0,
                symbol_offset: 0,
                subchannel_offset: 0,
                boosting: 0,
                num_symbols: 0,
                num_subchannels: 0,
                rep_coding_indication: 0,
            },
            DlMapIe {
                diuc: 15,
                symbol_offset: 255,
                subchannel_offset: 63,
                boosting: 7,
                num_symbols: 127,
                num_subchannels: 63,
                rep_coding_indication: 3,
            },
        ] {
            let mut buf = BitBuffer::new(40);
            ie.to_bitbuf(&mut buf);
            buf.seek(0);
            assert_eq!(DlMapIe::from_bitbuf(&mut buf).unwrap(), ie);
        }
    }

    #[test]
    fn test_consecutive_ies_in_one_buffer() {
        let a = DlMapIe {
            diuc: 1, symbol_offset: 2, subchannel_offset: 3, boosting: 0,
            num_symbols: 4, num_subchannels: 5, rep_coding_indication: 0,
        };
        let b = DlMapIe {
            diuc: 9, symbol_offset: 40, subchannel_offset: 12, boosting: 1,
            num_symbols: 20, num_subchannels: 8, rep_coding_indication: 2,
        };
        let mut buf = BitBuffer::new(80);
        a.to_bitbuf(&mut buf);
        b.to_bitbuf(&mut buf);
        buf.seek(0);
        assert_eq!(DlMapIe::from_bitbuf(&mut buf).unwrap(), a);
        assert_eq!(DlMapIe::from_bitbuf(&mut buf).unwrap(), b);
        assert_eq!(buf.get_len_remaining(), 0);
    }
}
