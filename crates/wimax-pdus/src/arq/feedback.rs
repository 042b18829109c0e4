use std::fmt;

use wimax_core::pdu_parse_error::PduParseErr;
use wimax_core::{let_field, BitBuffer, Bsn, Cid};

/// ACK flavor carried in an ARQ feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArqAckType {
    /// Cumulative ACK only; the NACK bitmap is all-zero and ignored
    Cumulative = 1,
    /// Cumulative ACK plus a selective-NACK bitmap over the window
    CumulativeSelective = 2,
}

impl ArqAckType {
    pub fn from_raw(v: u8) -> Option<ArqAckType> {
        match v {
            1 => Some(ArqAckType::Cumulative),
            2 => Some(ArqAckType::CumulativeSelective),
            _ => None,
        }
    }
}

/// Receiver-to-transmitter ARQ feedback: everything strictly before
/// `cumulative_bsn` is acknowledged; bit i of `nack_bitmap` (MSB first)
/// marks `cumulative_bsn + i` as missing, so bit 0 covers the first gap
/// itself.
///
/// Layout (48 bits): cid 16, ack_type 2, cumulative_bsn 11, nack_bitmap 16,
/// padding 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArqFeedback {
    pub cid: Cid,
    pub ack_type: ArqAckType,
    /// Highest BSN such that all blocks strictly before it are received
    pub cumulative_bsn: Bsn,
    pub nack_bitmap: u16,
}

/// Encoded size in bytes
pub const ARQ_FEEDBACK_BYTES: u32 = 6;

/// Number of window positions, starting at the cumulative BSN, that the
/// selective bitmap can describe
pub const NACK_BITMAP_BITS: u16 = 16;

impl ArqFeedback {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, cid, 16);
        let_field!(buf, ack_type, 2);
        let_field!(buf, cumulative_bsn, 11);
        let_field!(buf, nack_bitmap, 16);
        let_field!(buf, _padding, 3);

        let ack_type = ArqAckType::from_raw(ack_type as u8)
            .ok_or(PduParseErr::InvalidValue { field: "ack_type", value: ack_type })?;

        Ok(ArqFeedback {
            cid: Cid(cid as u16),
            ack_type,
            cumulative_bsn: Bsn(cumulative_bsn as u16),
            nack_bitmap: nack_bitmap as u16,
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.cid.0 as u64, 16);
        buf.write_bits(self.ack_type as u64, 2);
        buf.write_bits(self.cumulative_bsn.0 as u64, 11);
        buf.write_bits(self.nack_bitmap as u64, 16);
        buf.write_zeroes(3);
    }

    /// BSNs marked missing by the selective bitmap, in window order.
    pub fn nacked_bsns(&self) -> Vec<Bsn> {
        let mut out = Vec::new();
        for i in 0..NACK_BITMAP_BITS {
            if self.nack_bitmap & (1 << (NACK_BITMAP_BITS - 1 - i)) != 0 {
                out.push(self.cumulative_bsn.wrapping_add(i));
            }
        }
        out
    }
}

impl fmt::Display for ArqFeedback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "arq_feedback {{ {}, {:?}, cum: {}, nack: {:#06x} }}",
            self.cid, self.ack_type, self.cumulative_bsn, self.nack_bitmap
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let fb = ArqFeedback {
            cid: Cid(511),
            ack_type: ArqAckType::CumulativeSelective,
            cumulative_bsn: Bsn(2047),
            nack_bitmap: 0xA5A5,
        };
        let mut buf = BitBuffer::new(48);
        fb.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), ARQ_FEEDBACK_BYTES as usize * 8);
        buf.seek(0);
        assert_eq!(ArqFeedback::from_bitbuf(&mut buf).unwrap(), fb);
    }

    #[test]
    fn test_invalid_ack_type_rejected() {
        let mut buf = BitBuffer::new(48);
        buf.write_bits(1, 16);
        buf.write_bits(3, 2); // reserved ack type
        buf.write_bits(0, 30);
        buf.seek(0);
        assert_eq!(
            ArqFeedback::from_bitbuf(&mut buf),
            Err(PduParseErr::InvalidValue { field: "ack_type", value: 3 })
        );
    }

    #[test]
    fn test_nacked_bsns_wraps_modulus() {
        let fb = ArqFeedback {
            cid: Cid(1),
            ack_type: ArqAckType::CumulativeSelective,
            cumulative_bsn: Bsn(2046),
            // MSB = the cumulative bsn itself, the first gap
            nack_bitmap: 0b1010_0000_0000_0000,
        };
        assert_eq!(fb.nacked_bsns(), vec![Bsn(2046), Bsn(0)]);
    }
}
