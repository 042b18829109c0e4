//! Per-frame bandwidth allocation. Downlink: frame overhead first, then the
//! four management tiers in strict priority, then data flows. Uplink:
//! contention ranging regions, CDMA allocations, then per-flow grants.

use std::collections::HashSet;
use std::fmt;

use wimax_config::StationConfig;
use wimax_core::cid::BROADCAST_CID;
use wimax_core::{BitBuffer, Cid, Direction, FrameNumber};
use wimax_pdus::arq::{frag_subheader::FRAG_SUBHEADER_BYTES, FragSubheader};
use wimax_pdus::phy::dl_map_ie::DL_MAP_IE_BYTES;
use wimax_pdus::phy::{DlMapIe, UlDataGrantIe, UlMapIe, UlRangingInvitationIe, DIUC_BROADCAST};

use crate::alloc_map::AllocationMap;
use crate::phy_adapter::{CapacityErr, CodingScheme, OfdmaPhy, PhyProfile};
use crate::queues::{ConnectionQueues, Discipline, MgmtTier};
use crate::ranging::CdmaRangingResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedErr {
    /// A management PDU that cannot fit even an otherwise empty subframe.
    /// Unrecoverable: the PDU would block its tier forever.
    MgmtPduTooLarge { tier: MgmtTier, bytes: usize, capacity_ps: u32 },
    Capacity(CapacityErr),
}

impl From<CapacityErr> for SchedErr {
    fn from(e: CapacityErr) -> Self {
        SchedErr::Capacity(e)
    }
}

impl fmt::Display for SchedErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchedErr::MgmtPduTooLarge { tier, bytes, capacity_ps } => write!(
                f,
                "{:?} management pdu of {} bytes exceeds the whole subframe ({} ps)",
                tier, bytes, capacity_ps
            ),
            SchedErr::Capacity(e) => write!(f, "{}", e),
        }
    }
}

/// One scheduled downlink burst: its map IE plus the bytes to transmit
#[derive(Debug, Clone)]
pub struct DlGrant {
    pub cid: Cid,
    pub ie: DlMapIe,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DlSchedule {
    pub grants: Vec<DlGrant>,
    pub unused_ps: u32,
}

#[derive(Debug, Clone)]
pub struct UlSchedule {
    pub ies: Vec<UlMapIe>,
    pub unused_ps: u32,
}

/// Burst profile management traffic is always sent with
const MGMT_CODING: CodingScheme = CodingScheme::Qpsk12;

pub struct SubframeScheduler {
    cfg: StationConfig,
    phy: OfdmaPhy,
    pub queues: ConnectionQueues,
    pub ranging: CdmaRangingResolver,
    dl_map: AllocationMap,
    ul_map: AllocationMap,
    frame_number: FrameNumber,
    // Map-message overhead is reserved from the previous frame's IE counts,
    // since this frame's counts only exist once scheduling is done.
    last_dl_ie_count: u32,
    last_ul_map_bytes: u32,
}

impl SubframeScheduler {
    pub fn new(cfg: StationConfig) -> Self {
        let phy = OfdmaPhy;
        let dl_map =
            AllocationMap::new(cfg.num_dl_subchannels as u32, phy.symbols_per_ps(Direction::Dl));
        let data_ul_subchannels = cfg.num_ul_subchannels - cfg.effective_ranging_subchannels();
        let ul_map =
            AllocationMap::new(data_ul_subchannels as u32, phy.symbols_per_ps(Direction::Ul));
        let ranging = CdmaRangingResolver::new(cfg.ranging);
        SubframeScheduler {
            cfg,
            phy,
            queues: ConnectionQueues::new(),
            ranging,
            dl_map,
            ul_map,
            frame_number: FrameNumber::new(0),
            last_dl_ie_count: 0,
            last_ul_map_bytes: 0,
        }
    }

    pub fn frame_number(&self) -> FrameNumber {
        self.frame_number
    }

    pub fn advance_frame(&mut self) {
        self.frame_number = self.frame_number.next();
    }

    fn dl_total_ps(&self) -> u32 {
        let cols = self.cfg.num_dl_symbols as u32 / self.phy.symbols_per_ps(Direction::Dl);
        cols * self.cfg.num_dl_subchannels as u32
    }

    fn ul_total_ps(&self) -> u32 {
        let data_subch =
            (self.cfg.num_ul_subchannels - self.cfg.effective_ranging_subchannels()) as u32;
        let cols = self.cfg.num_ul_symbols as u32 / self.phy.symbols_per_ps(Direction::Ul);
        cols * data_subch
    }

    /// Slots the frame-start overhead eats out of the downlink subframe:
    /// the preamble column plus FCH and the two map messages at the
    /// broadcast profile.
    fn dl_overhead_ps(&self) -> Result<u32, CapacityErr> {
        let preamble_cols = self
            .phy
            .preamble_symbols()
            .div_ceil(self.phy.symbols_per_ps(Direction::Dl));
        let preamble_ps = preamble_cols * self.cfg.num_dl_subchannels as u32;
        let map_bytes = self.phy.frame_overhead_bytes()
            + self.last_dl_ie_count * DL_MAP_IE_BYTES
            + self.last_ul_map_bytes;
        let map_ps = self.phy.slots_needed(map_bytes, MGMT_CODING, Direction::Dl)?;
        Ok(preamble_ps + map_ps)
    }

    ///////// DOWNLINK /////////

    pub fn schedule_downlink(&mut self) -> Result<DlSchedule, SchedErr> {
        let total = self.dl_total_ps();
        let budget = total.saturating_sub(self.dl_overhead_ps()?);
        self.dl_map.reset(budget);
        let mut grants = Vec::new();

        self.schedule_dl_mgmt(budget, &mut grants)?;
        self.schedule_dl_data(&mut grants)?;

        self.dl_map.close();
        let unused_ps = self.dl_map.remaining_ps();
        self.last_dl_ie_count = grants.len() as u32;
        tracing::debug!(
            "frame {}: dl schedule {} bursts, {}/{} ps unused",
            self.frame_number,
            grants.len(),
            unused_ps,
            budget
        );
        Ok(DlSchedule { grants, unused_ps })
    }

    /// Serves the management tiers in strict priority order. A head PDU
    /// that no longer fits defers its whole tier to the next frame; one
    /// that could never fit is a configuration fault.
    fn schedule_dl_mgmt(&mut self, budget: u32, grants: &mut Vec<DlGrant>) -> Result<(), SchedErr> {
        for tier in MgmtTier::ALL {
            while let Some(head) = self.queues.mgmt_queue_mut(tier).front() {
                let bytes = head.len();
                let ps = self.phy.slots_needed(bytes as u32, MGMT_CODING, Direction::Dl)?;
                match self.dl_map.try_allocate(ps) {
                    Some(burst) => {
                        let Some(payload) = self.queues.mgmt_queue_mut(tier).pop_front() else {
                            break;
                        };
                        grants.push(DlGrant {
                            cid: BROADCAST_CID,
                            ie: DlMapIe {
                                diuc: DIUC_BROADCAST,
                                symbol_offset: burst.symbol_offset,
                                subchannel_offset: burst.subchannel_offset,
                                boosting: 0,
                                num_symbols: burst.num_symbols,
                                num_subchannels: burst.num_subchannels,
                                rep_coding_indication: 0,
                            },
                            payload,
                        });
                    }
                    None if ps > budget => {
                        return Err(SchedErr::MgmtPduTooLarge { tier, bytes, capacity_ps: budget });
                    }
                    None => break,
                }
            }
        }
        Ok(())
    }

    /// Serves data flows: strict-priority flows drain first, then the
    /// weighted flows take turns one PDU at a time so one heavy flow
    /// cannot starve its peers within a frame.
    fn schedule_dl_data(&mut self, grants: &mut Vec<DlGrant>) -> Result<(), SchedErr> {
        let order = self.queues.service_order(Direction::Dl);
        let mut blocked: HashSet<Cid> = HashSet::new();

        for &cid in &order {
            let strict = matches!(
                self.queues.flow(cid).map(|f| f.discipline),
                Some(Discipline::StrictPriority)
            );
            if !strict {
                continue;
            }
            while !blocked.contains(&cid) {
                if !self.serve_one_dl_pdu(cid, grants, &mut blocked)? {
                    break;
                }
            }
        }

        loop {
            let mut progress = false;
            for &cid in &order {
                if blocked.contains(&cid) {
                    continue;
                }
                if matches!(
                    self.queues.flow(cid).map(|f| f.discipline),
                    Some(Discipline::StrictPriority)
                ) {
                    continue;
                }
                progress |= self.serve_one_dl_pdu(cid, grants, &mut blocked)?;
            }
            if !progress {
                break;
            }
        }
        Ok(())
    }

    /// Moves at most one PDU (or one ARQ block) of the flow into the map.
    /// Returns whether anything was granted; a failed fit marks the flow
    /// blocked for the rest of the subframe.
    fn serve_one_dl_pdu(
        &mut self,
        cid: Cid,
        grants: &mut Vec<DlGrant>,
        blocked: &mut HashSet<Cid>,
    ) -> Result<bool, SchedErr> {
        let Some(flow) = self.queues.flow_mut(cid) else {
            blocked.insert(cid);
            return Ok(false);
        };
        let coding = flow.coding;
        let diuc = flow.profile_code;

        // Size the head-of-line unit without committing to it.
        let bytes = if let Some(engine) = &flow.arq {
            match engine.peek_transmit() {
                Some(block) => FRAG_SUBHEADER_BYTES as usize + block.payload.len(),
                None => return Ok(false),
            }
        } else {
            match flow.peek_head() {
                Some(pdu) => pdu.len(),
                None => return Ok(false),
            }
        };

        let ps = self.phy.slots_needed(bytes as u32, coding, Direction::Dl)?;
        let Some(burst) = self.dl_map.try_allocate(ps) else {
            blocked.insert(cid);
            return Ok(false);
        };

        let payload = match flow.arq.as_mut() {
            Some(engine) => {
                let Some(block) = engine.peek_transmit() else {
                    return Ok(false);
                };
                let (bsn, fc, body) = (block.bsn, block.fc, block.payload.clone());
                let mut buf = BitBuffer::new(bytes * 8);
                FragSubheader { fc, bsn }.to_bitbuf(&mut buf);
                buf.write_bytes(&body);
                engine.mark_transmitted(bsn);
                buf.into_bytes()
            }
            None => match flow.withdraw_head() {
                Some(pdu) => pdu,
                None => return Ok(false),
            },
        };

        grants.push(DlGrant {
            cid,
            ie: DlMapIe {
                diuc,
                symbol_offset: burst.symbol_offset,
                subchannel_offset: burst.subchannel_offset,
                boosting: 0,
                num_symbols: burst.num_symbols,
                num_subchannels: burst.num_subchannels,
                rep_coding_indication: 0,
            },
            payload,
        });
        Ok(true)
    }

    ///////// UPLINK /////////

    pub fn schedule_uplink(&mut self) -> Result<UlSchedule, SchedErr> {
        self.ul_map.reset(self.ul_total_ps());
        let mut ies = Vec::new();

        if self.cfg.ranging.enabled {
            ies.extend(self.ranging_invitations());
            let (cdma_ies, remaining) =
                self.ranging.resolve(self.ul_map.remaining_ps(), self.frame_number);
            let consumed = self.ul_map.remaining_ps() - remaining;
            if consumed > 0 {
                self.ul_map.try_allocate(consumed);
            }
            ies.extend(cdma_ies);
        }

        self.schedule_ul_data(&mut ies)?;

        self.ul_map.close();
        let unused_ps = self.ul_map.remaining_ps();
        self.last_ul_map_bytes = ies.iter().map(|ie| ie.encoded_bytes()).sum();
        tracing::debug!(
            "frame {}: ul schedule {} ies, {} ps unused",
            self.frame_number,
            ies.len(),
            unused_ps
        );
        Ok(UlSchedule { ies, unused_ps })
    }

    /// Contention regions on the reserved ranging subchannels: the first
    /// half of the subframe takes initial/periodic ranging, the second
    /// half bandwidth-request codes.
    fn ranging_invitations(&self) -> Vec<UlMapIe> {
        let subch_offset = (self.cfg.num_ul_subchannels - self.cfg.ranging.channel_subchannels) as u8;
        let width = self.cfg.ranging.channel_subchannels as u8;
        let half = (self.cfg.num_ul_symbols / 2) as u8;
        let rest = self.cfg.num_ul_symbols as u8 - half;
        vec![
            UlMapIe::RangingInvitation(UlRangingInvitationIe {
                cid: BROADCAST_CID,
                symbol_offset: 0,
                subchannel_offset: subch_offset,
                num_symbols: half,
                num_subchannels: width,
                ranging_method: 0,
                ranging_indicator: true,
            }),
            UlMapIe::RangingInvitation(UlRangingInvitationIe {
                cid: BROADCAST_CID,
                symbol_offset: half,
                subchannel_offset: subch_offset,
                num_symbols: rest,
                num_subchannels: width,
                ranging_method: 1,
                ranging_indicator: true,
            }),
        ]
    }

    /// Grants uplink flows room for their queued bandwidth demand, one
    /// demand entry per turn. Every grant pays the transition gap on top
    /// of its payload slots.
    fn schedule_ul_data(&mut self, ies: &mut Vec<UlMapIe>) -> Result<(), SchedErr> {
        let order = self.queues.service_order(Direction::Ul);
        let sstg = self.cfg.ranging.sstg_ps;
        let mut blocked: HashSet<Cid> = HashSet::new();

        loop {
            let mut progress = false;
            for &cid in &order {
                if blocked.contains(&cid) {
                    continue;
                }
                let Some(flow) = self.queues.flow_mut(cid) else {
                    blocked.insert(cid);
                    continue;
                };
                // ARQ-enabled flows queue their demand as blocks, not PDUs
                let bytes = if let Some(engine) = &flow.arq {
                    match engine.peek_transmit() {
                        Some(block) => FRAG_SUBHEADER_BYTES + block.payload.len() as u32,
                        None => continue,
                    }
                } else {
                    match flow.peek_head() {
                        Some(pdu) => pdu.len() as u32,
                        None => continue,
                    }
                };
                let payload_ps = self.phy.slots_needed(bytes, flow.coding, Direction::Ul)?;
                let uiuc = flow.profile_code;
                if self.ul_map.try_allocate(payload_ps + sstg).is_none() {
                    blocked.insert(cid);
                    continue;
                }
                match flow.arq.as_mut() {
                    Some(engine) => {
                        if let Some(bsn) = engine.peek_transmit().map(|b| b.bsn) {
                            engine.mark_transmitted(bsn);
                        }
                    }
                    None => {
                        flow.withdraw_head();
                    }
                }
                ies.push(UlMapIe::DataGrant(UlDataGrantIe {
                    cid,
                    uiuc,
                    duration_ps: payload_ps as u16,
                    rep_coding_indication: 0,
                }));
                progress = true;
            }
            if !progress {
                break;
            }
        }
        Ok(())
    }
}
