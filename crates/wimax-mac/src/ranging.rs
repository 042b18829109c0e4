//! CDMA ranging-code bookkeeping. The base station cannot tell contending
//! stations apart until they have a CID, so grants echo back the code,
//! frame and region on which the contention transmission was heard.

use std::collections::VecDeque;

use wimax_config::RangingConfig;
use wimax_core::cid::INITIAL_RANGING_CID;
use wimax_core::FrameNumber;
use wimax_pdus::phy::{UlCdmaAllocationIe, UlMapIe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingCodeType {
    /// First contact; answered with RNG-RSP, not a map allocation
    InitialRanging,
    /// Maintenance ranging of an already managed station
    Periodic,
    /// Contention bandwidth request
    BandwidthRequest,
}

/// One CDMA code heard on the ranging channel
#[derive(Debug, Clone, Copy)]
pub struct RangingRecord {
    pub code: u8,
    pub code_type: RangingCodeType,
    pub frame_number: FrameNumber,
    pub symbol: u8,
    pub subchannel: u8,
    pub response_sent: bool,
}

/// FIFO of heard codes awaiting an uplink allocation
pub struct CdmaRangingResolver {
    cfg: RangingConfig,
    pending: VecDeque<RangingRecord>,
}

impl CdmaRangingResolver {
    pub fn new(cfg: RangingConfig) -> Self {
        CdmaRangingResolver { cfg, pending: VecDeque::new() }
    }

    pub fn push_heard(&mut self, record: RangingRecord) {
        tracing::debug!(
            "heard cdma code {} ({:?}) in frame {}",
            record.code,
            record.code_type,
            record.frame_number
        );
        self.pending.push_back(record);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Removes and returns initial-ranging codes; those are answered with a
    /// directed RNG-RSP instead of a map allocation.
    pub fn take_initial_ranging(&mut self) -> Vec<RangingRecord> {
        let mut taken = Vec::new();
        self.pending.retain(|r| {
            if r.code_type == RangingCodeType::InitialRanging {
                taken.push(*r);
                false
            } else {
                true
            }
        });
        taken
    }

    /// Cost in PS of answering one record, transition gap included
    fn cost_ps(&self, record: &RangingRecord) -> u32 {
        let opp = match record.code_type {
            RangingCodeType::BandwidthRequest => self.cfg.request_opp_size_ps,
            _ => self.cfg.ranging_opp_size_ps,
        };
        opp + self.cfg.sstg_ps
    }

    /// Grants pending codes oldest first. A record is only consumed when
    /// its full opportunity fits in what is left of `available_ps`; the
    /// first record that does not fit stops the pass, so a cheaper code
    /// heard later can never jump the queue.
    pub fn resolve(&mut self, available_ps: u32, frame_number: FrameNumber) -> (Vec<UlMapIe>, u32) {
        let mut remaining = available_ps;
        let mut ies = Vec::new();

        let mut kept = VecDeque::new();
        while let Some(record) = self.pending.pop_front() {
            if record.response_sent || record.code_type == RangingCodeType::InitialRanging {
                kept.push_back(record);
                continue;
            }
            let cost = self.cost_ps(&record);
            if cost > remaining {
                kept.push_back(record);
                break;
            }
            remaining -= cost;
            let duration = (cost - self.cfg.sstg_ps).min(63) as u8;
            ies.push(UlMapIe::CdmaAllocation(UlCdmaAllocationIe {
                cid: INITIAL_RANGING_CID,
                duration_ps: duration,
                transmission_uiuc: 1,
                rep_coding_indication: 0,
                frame_number_lsb: record.frame_number.lsb4(),
                ranging_code: record.code,
                ranging_symbol: record.symbol,
                ranging_subchannel: record.subchannel,
                bw_request: record.code_type == RangingCodeType::BandwidthRequest,
            }));
            tracing::debug!(
                "granting {} ps to cdma code {} heard in frame {} (now frame {})",
                duration,
                record.code,
                record.frame_number,
                frame_number
            );
        }
        kept.append(&mut self.pending);
        self.pending = kept;
        (ies, remaining)
    }
}
