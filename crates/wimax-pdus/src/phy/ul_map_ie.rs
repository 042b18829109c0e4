use std::fmt;

use wimax_core::pdu_parse_error::PduParseErr;
use wimax_core::{let_field, BitBuffer, Cid};

use super::{UIUC_CDMA_ALLOCATION, UIUC_CDMA_RANGE, UIUC_DATA_MAX};

/// Generic uplink data-grant IE for UIUCs 1..=10.
///
/// Layout (32 bits): cid 16, uiuc 4, duration_ps 10, rep_coding_indication 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UlDataGrantIe {
    pub cid: Cid,
    pub uiuc: u8,
    /// Burst length in physical slots
    pub duration_ps: u16,
    pub rep_coding_indication: u8,
}

/// CDMA ranging-invitation IE (UIUC 12): broadcasts the region in which
/// stations may contend with ranging or bandwidth-request codes.
///
/// Layout (56 bits): cid 16, uiuc 4, padding_nibble 4, symbol_offset 8,
/// subchannel_offset 7, num_symbols 7, num_subchannels 7, ranging_method 2,
/// ranging_indicator 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UlRangingInvitationIe {
    pub cid: Cid,
    pub symbol_offset: u8,
    pub subchannel_offset: u8,
    pub num_symbols: u8,
    pub num_subchannels: u8,
    pub ranging_method: u8,
    pub ranging_indicator: bool,
}

/// CDMA allocation IE (UIUC 14): grants one specific contending station an
/// uplink region, echoing back the code/frame/symbol/subchannel on which its
/// contention transmission was heard so the station can recognize itself.
///
/// Layout (64 bits): cid 16, uiuc 4, duration_ps 6, transmission_uiuc 4,
/// rep_coding_indication 2, frame_number_lsb 4, padding_nibble 4,
/// ranging_code 8, ranging_symbol 8, ranging_subchannel 7, bw_request 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UlCdmaAllocationIe {
    pub cid: Cid,
    pub duration_ps: u8,
    /// Burst profile the granted station must transmit with
    pub transmission_uiuc: u8,
    pub rep_coding_indication: u8,
    pub frame_number_lsb: u8,
    pub ranging_code: u8,
    pub ranging_symbol: u8,
    pub ranging_subchannel: u8,
    /// Set when the grant answers a bandwidth-request code
    pub bw_request: bool,
}

/// One UL-MAP information element. The UIUC field is the variant
/// discriminant: 1..=10 generic data grant, 12 ranging invitation,
/// 14 CDMA allocation. Anything else fails decode with `UnknownIeType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UlMapIe {
    DataGrant(UlDataGrantIe),
    RangingInvitation(UlRangingInvitationIe),
    CdmaAllocation(UlCdmaAllocationIe),
}

/// Encoded sizes in bytes, per variant
pub const UL_DATA_GRANT_IE_BYTES: u32 = 4;
pub const UL_RANGING_INVITATION_IE_BYTES: u32 = 7;
pub const UL_CDMA_ALLOCATION_IE_BYTES: u32 = 8;

impl UlMapIe {
    pub fn cid(&self) -> Cid {
        match self {
            UlMapIe::DataGrant(ie) => ie.cid,
            UlMapIe::RangingInvitation(ie) => ie.cid,
            UlMapIe::CdmaAllocation(ie) => ie.cid,
        }
    }

    pub fn uiuc(&self) -> u8 {
        match self {
            UlMapIe::DataGrant(ie) => ie.uiuc,
            UlMapIe::RangingInvitation(_) => UIUC_CDMA_RANGE,
            UlMapIe::CdmaAllocation(_) => UIUC_CDMA_ALLOCATION,
        }
    }

    pub fn encoded_bytes(&self) -> u32 {
        match self {
            UlMapIe::DataGrant(_) => UL_DATA_GRANT_IE_BYTES,
            UlMapIe::RangingInvitation(_) => UL_RANGING_INVITATION_IE_BYTES,
            UlMapIe::CdmaAllocation(_) => UL_CDMA_ALLOCATION_IE_BYTES,
        }
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, cid, 16);
        let_field!(buf, uiuc, 4);
        let cid = Cid(cid as u16);
        let uiuc = uiuc as u8;

        match uiuc {
            1..=UIUC_DATA_MAX => {
                let_field!(buf, duration_ps, 10);
                let_field!(buf, rep_coding_indication, 2);
                Ok(UlMapIe::DataGrant(UlDataGrantIe {
                    cid,
                    uiuc,
                    duration_ps: duration_ps as u16,
                    rep_coding_indication: rep_coding_indication as u8,
                }))
            }
            UIUC_CDMA_RANGE => {
                let_field!(buf, _padding_nibble, 4);
                let_field!(buf, symbol_offset, 8);
                let_field!(buf, subchannel_offset, 7);
                let_field!(buf, num_symbols, 7);
                let_field!(buf, num_subchannels, 7);
                let_field!(buf, ranging_method, 2);
                let_field!(buf, ranging_indicator, 1);
                Ok(UlMapIe::RangingInvitation(UlRangingInvitationIe {
                    cid,
                    symbol_offset: symbol_offset as u8,
                    subchannel_offset: subchannel_offset as u8,
                    num_symbols: num_symbols as u8,
                    num_subchannels: num_subchannels as u8,
                    ranging_method: ranging_method as u8,
                    ranging_indicator: ranging_indicator != 0,
                }))
            }
            UIUC_CDMA_ALLOCATION => {
                let_field!(buf, duration_ps, 6);
                let_field!(buf, transmission_uiuc, 4);
                let_field!(buf, rep_coding_indication, 2);
                let_field!(buf, frame_number_lsb, 4);
                let_field!(buf, _padding_nibble, 4);
                let_field!(buf, ranging_code, 8);
                let_field!(buf, ranging_symbol, 8);
                let_field!(buf, ranging_subchannel, 7);
                let_field!(buf, bw_request, 1);
                Ok(UlMapIe::CdmaAllocation(UlCdmaAllocationIe {
                    cid,
                    duration_ps: duration_ps as u8,
                    transmission_uiuc: transmission_uiuc as u8,
                    rep_coding_indication: rep_coding_indication as u8,
                    frame_number_lsb: frame_number_lsb as u8,
                    ranging_code: ranging_code as u8,
                    ranging_symbol: ranging_symbol as u8,
                    ranging_subchannel: ranging_subchannel as u8,
                    bw_request: bw_request != 0,
                }))
            }
            _ => {
                tracing::debug!("ul-map ie with unsupported uiuc {} on {}", uiuc, cid);
                Err(PduParseErr::UnknownIeType { uiuc, cid: cid.0 })
            }
        }
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        match self {
            UlMapIe::DataGrant(ie) => {
                assert!(ie.uiuc >= 1 && ie.uiuc <= UIUC_DATA_MAX, "data grant uiuc out of range");
                buf.write_bits(ie.cid.0 as u64, 16);
                buf.write_bits(ie.uiuc as u64, 4);
                buf.write_bits(ie.duration_ps as u64, 10);
                buf.write_bits(ie.rep_coding_indication as u64, 2);
            }
            UlMapIe::RangingInvitation(ie) => {
                buf.write_bits(ie.cid.0 as u64, 16);
                buf.write_bits(UIUC_CDMA_RANGE as u64, 4);
                buf.write_zeroes(4);
                buf.write_bits(ie.symbol_offset as u64, 8);
                buf.write_bits(ie.subchannel_offset as u64, 7);
                buf.write_bits(ie.num_symbols as u64, 7);
                buf.write_bits(ie.num_subchannels as u64, 7);
                buf.write_bits(ie.ranging_method as u64, 2);
                buf.write_bits(ie.ranging_indicator as u64, 1);
            }
            UlMapIe::CdmaAllocation(ie) => {
                buf.write_bits(ie.cid.0 as u64, 16);
                buf.write_bits(UIUC_CDMA_ALLOCATION as u64, 4);
                buf.write_bits(ie.duration_ps as u64, 6);
                buf.write_bits(ie.transmission_uiuc as u64, 4);
                buf.write_bits(ie.rep_coding_indication as u64, 2);
                buf.write_bits(ie.frame_number_lsb as u64, 4);
                buf.write_zeroes(4);
                buf.write_bits(ie.ranging_code as u64, 8);
                buf.write_bits(ie.ranging_symbol as u64, 8);
                buf.write_bits(ie.ranging_subchannel as u64, 7);
                buf.write_bits(ie.bw_request as u64, 1);
            }
        }
    }
}

impl fmt::Display for UlMapIe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UlMapIe::DataGrant(ie) => {
                write!(f, "ul_grant {{ {}, uiuc: {}, duration: {} ps }}", ie.cid, ie.uiuc, ie.duration_ps)
            }
            UlMapIe::RangingInvitation(ie) => {
                write!(f, "ul_rng_invite {{ {}, sym: {}+{}, subch: {}+{} }}",
                    ie.cid, ie.symbol_offset, ie.num_symbols, ie.subchannel_offset, ie.num_subchannels)
            }
            UlMapIe::CdmaAllocation(ie) => {
                write!(f, "ul_cdma_alloc {{ {}, code: {}, duration: {} ps, bw_req: {} }}",
                    ie.cid, ie.ranging_code, ie.duration_ps, ie.bw_request)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_grant_round_trip() {
        let ie = UlMapIe::DataGrant(UlDataGrantIe {
            cid: Cid(0x1234),
            uiuc: 7,
            duration_ps: 1023,
            rep_coding_indication: 2,
        });
        let mut buf = BitBuffer::new(32);
        ie.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), UL_DATA_GRANT_IE_BYTES as usize * 8);
        buf.seek(0);
        assert_eq!(UlMapIe::from_bitbuf(&mut buf).unwrap(), ie);
    }

    #[test]
    fn test_ranging_invitation_round_trip() {
        let ie = UlMapIe::RangingInvitation(UlRangingInvitationIe {
            cid: Cid(0xFFFF),
            symbol_offset: 255,
            subchannel_offset: 127,
            num_symbols: 127,
            num_subchannels: 127,
            ranging_method: 3,
            ranging_indicator: true,
        });
        let mut buf = BitBuffer::new(56);
        ie.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), UL_RANGING_INVITATION_IE_BYTES as usize * 8);
        buf.seek(0);
        assert_eq!(UlMapIe::from_bitbuf(&mut buf).unwrap(), ie);
    }

    #[test]
    fn test_cdma_allocation_round_trip() {
        let ie = UlMapIe::CdmaAllocation(UlCdmaAllocationIe {
            cid: Cid(0),
            duration_ps: 63,
            transmission_uiuc: 10,
            rep_coding_indication: 1,
            frame_number_lsb: 0xF,
            ranging_code: 200,
            ranging_symbol: 17,
            ranging_subchannel: 100,
            bw_request: true,
        });
        let mut buf = BitBuffer::new(64);
        ie.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), UL_CDMA_ALLOCATION_IE_BYTES as usize * 8);
        buf.seek(0);
        assert_eq!(UlMapIe::from_bitbuf(&mut buf).unwrap(), ie);
    }

    #[test]
    fn test_unknown_uiuc_rejected_with_context() {
        for uiuc in [0u8, 11, 13, 15] {
            let mut buf = BitBuffer::new(32);
            buf.write_bits(0x0042, 16);
            buf.write_bits(uiuc as u64, 4);
            buf.write_bits(0, 12);
            buf.seek(0);
            assert_eq!(
                UlMapIe::from_bitbuf(&mut buf),
                Err(PduParseErr::UnknownIeType { uiuc, cid: 0x42 })
            );
        }
    }

    #[test]
    fn test_truncated_allocation_ie() {
        let mut buf = BitBuffer::new(32);
        buf.write_bits(1, 16);
        buf.write_bits(UIUC_CDMA_ALLOCATION as u64, 4);
        buf.write_bits(0, 12);
        buf.seek(0);
        assert!(matches!(
            UlMapIe::from_bitbuf(&mut buf),
            Err(PduParseErr::BufferEnded { .. })
        ));
    }

    #[test]
    fn test_mixed_ies_sequential_decode() {
        let grant = UlMapIe::DataGrant(UlDataGrantIe {
            cid: Cid(300), uiuc: 1, duration_ps: 12, rep_coding_indication: 0,
        });
        let alloc = UlMapIe::CdmaAllocation(UlCdmaAllocationIe {
            cid: Cid(0), duration_ps: 9, transmission_uiuc: 1, rep_coding_indication: 0,
            frame_number_lsb: 3, ranging_code: 77, ranging_symbol: 2,
            ranging_subchannel: 5, bw_request: false,
        });
        let mut buf = BitBuffer::new_autoexpand(0);
        grant.to_bitbuf(&mut buf);
        alloc.to_bitbuf(&mut buf);
        buf.seek(0);
        assert_eq!(UlMapIe::from_bitbuf(&mut buf).unwrap(), grant);
        assert_eq!(UlMapIe::from_bitbuf(&mut buf).unwrap(), alloc);
    }
}
