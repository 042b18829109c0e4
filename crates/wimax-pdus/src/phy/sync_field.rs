use std::fmt;

use wimax_core::pdu_parse_error::PduParseErr;
use wimax_core::{let_field, BitBuffer, FrameNumber};

/// PHY synchronization field, the first record of every downlink frame:
/// 8-bit frame duration code followed by the 24-bit frame number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhySyncField {
    pub duration_code: u8,
    pub frame_number: FrameNumber,
}

/// Encoded size in bytes
pub const PHY_SYNC_FIELD_BYTES: u32 = 4;

impl PhySyncField {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, duration_code, 8);
        let_field!(buf, frame_number, 24);

        Ok(PhySyncField {
            duration_code: duration_code as u8,
            frame_number: FrameNumber::new(frame_number as u32),
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.duration_code as u64, 8);
        buf.write_bits(self.frame_number.value() as u64, 24);
    }
}

impl fmt::Display for PhySyncField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "phy_sync {{ duration_code: {}, {} }}", self.duration_code, self.frame_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let field = PhySyncField {
            duration_code: 6,
            frame_number: FrameNumber::new(0xABCDEF),
        };
        let mut buf = BitBuffer::new(32);
        field.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), 32);
        buf.seek(0);
        assert_eq!(PhySyncField::from_bitbuf(&mut buf).unwrap(), field);
    }

    #[test]
    fn test_frame_number_reduced_modulo_2_pow_24() {
        let field = PhySyncField {
            duration_code: 1,
            frame_number: FrameNumber::new((1 << 24) + 7),
        };
        let mut buf = BitBuffer::new(32);
        field.to_bitbuf(&mut buf);
        buf.seek(0);
        let decoded = PhySyncField::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded.frame_number, FrameNumber::new(7));
    }

    #[test]
    fn test_truncated_buffer() {
        let mut buf = BitBuffer::from_bytes(&[0x01, 0x02]);
        assert_eq!(
            PhySyncField::from_bitbuf(&mut buf),
            Err(PduParseErr::BufferEnded { field: Some("frame_number") })
        );
    }
}
