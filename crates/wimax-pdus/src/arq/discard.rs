use std::fmt;

use wimax_core::pdu_parse_error::PduParseErr;
use wimax_core::{let_field, BitBuffer, Bsn, Cid};

/// Transmitter-to-receiver notice that the inclusive BSN range
/// `[start_bsn, end_bsn]` will never be retransmitted; the receiver should
/// advance its window past it instead of waiting.
///
/// Layout (40 bits): cid 16, start_bsn 11, end_bsn 11, padding 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArqDiscard {
    pub cid: Cid,
    pub start_bsn: Bsn,
    pub end_bsn: Bsn,
}

/// Encoded size in bytes
pub const ARQ_DISCARD_BYTES: u32 = 5;

impl ArqDiscard {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, cid, 16);
        let_field!(buf, start_bsn, 11);
        let_field!(buf, end_bsn, 11);
        let_field!(buf, _padding, 2);

        Ok(ArqDiscard {
            cid: Cid(cid as u16),
            start_bsn: Bsn(start_bsn as u16),
            end_bsn: Bsn(end_bsn as u16),
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.cid.0 as u64, 16);
        buf.write_bits(self.start_bsn.0 as u64, 11);
        buf.write_bits(self.end_bsn.0 as u64, 11);
        buf.write_zeroes(2);
    }
}

impl fmt::Display for ArqDiscard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "arq_discard {{ {}, {}..={} }}", self.cid, self.start_bsn, self.end_bsn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let msg = ArqDiscard {
            cid: Cid(0x0101),
            start_bsn: Bsn(2040),
            end_bsn: Bsn(7),
        };
        let mut buf = BitBuffer::new(40);
        msg.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), ARQ_DISCARD_BYTES as usize * 8);
        buf.seek(0);
        assert_eq!(ArqDiscard::from_bitbuf(&mut buf).unwrap(), msg);
    }

    #[test]
    fn test_truncated() {
        let mut buf = BitBuffer::from_bytes(&[0, 1, 2]);
        assert!(matches!(
            ArqDiscard::from_bitbuf(&mut buf),
            Err(PduParseErr::BufferEnded { .. })
        ));
    }
}
