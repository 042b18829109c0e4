//! Per-connection transmit queues: four station-wide management tiers in
//! strict priority order, then admitted service flows keyed by CID.

use std::collections::{BTreeMap, VecDeque};

use wimax_core::{Cid, Direction};

use crate::arq::{ArqEngine, ArqErr};
use crate::phy_adapter::CodingScheme;

/// Management traffic tiers, highest priority first. The variant order is
/// the service order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MgmtTier {
    Broadcast,
    Basic,
    Primary,
    Secondary,
}

impl MgmtTier {
    pub const ALL: [MgmtTier; 4] =
        [MgmtTier::Broadcast, MgmtTier::Basic, MgmtTier::Primary, MgmtTier::Secondary];
}

/// How a data flow competes for leftover capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Served before any weighted flow, e.g. UGS voice
    StrictPriority,
    /// Served round-robin within descending weight
    WeightedFair { weight: u32 },
}

/// One admitted transport connection
pub struct ServiceFlow {
    pub cid: Cid,
    pub direction: Direction,
    pub discipline: Discipline,
    pub coding: CodingScheme,
    /// DIUC (downlink) or UIUC (uplink) of the flow's burst profile
    pub profile_code: u8,
    /// ARQ engine when the connection was admitted with ARQ enabled
    pub arq: Option<ArqEngine>,
    queue: VecDeque<Vec<u8>>,
}

impl ServiceFlow {
    pub fn new(
        cid: Cid,
        direction: Direction,
        discipline: Discipline,
        coding: CodingScheme,
        profile_code: u8,
        arq: Option<ArqEngine>,
    ) -> Self {
        ServiceFlow { cid, direction, discipline, coding, profile_code, arq, queue: VecDeque::new() }
    }

    /// Accepts one SDU for transmission. ARQ flows segment immediately so
    /// the window check happens at admission time.
    pub fn enqueue_sdu(&mut self, sdu: Vec<u8>) -> Result<(), ArqErr> {
        match &mut self.arq {
            Some(engine) => engine.segment(&sdu).map(|_| ()),
            None => {
                self.queue.push_back(sdu);
                Ok(())
            }
        }
    }

    /// Head-of-line PDU for non-ARQ flows
    pub fn peek_head(&self) -> Option<&Vec<u8>> {
        self.queue.front()
    }

    pub fn withdraw_head(&mut self) -> Option<Vec<u8>> {
        self.queue.pop_front()
    }

    pub fn queued_pdus(&self) -> usize {
        self.queue.len()
    }

    pub fn has_backlog(&self) -> bool {
        if !self.queue.is_empty() {
            return true;
        }
        self.arq.as_ref().is_some_and(|e| e.peek_transmit().is_some())
    }

    fn weight(&self) -> u32 {
        match self.discipline {
            Discipline::StrictPriority => u32::MAX,
            Discipline::WeightedFair { weight } => weight,
        }
    }
}

/// All transmit-side queues of one station
pub struct ConnectionQueues {
    mgmt: [VecDeque<Vec<u8>>; 4],
    flows: BTreeMap<Cid, ServiceFlow>,
}

impl Default for ConnectionQueues {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionQueues {
    pub fn new() -> Self {
        ConnectionQueues {
            mgmt: [VecDeque::new(), VecDeque::new(), VecDeque::new(), VecDeque::new()],
            flows: BTreeMap::new(),
        }
    }

    pub fn enqueue_mgmt(&mut self, tier: MgmtTier, pdu: Vec<u8>) {
        self.mgmt[tier as usize].push_back(pdu);
    }

    pub fn mgmt_queue_mut(&mut self, tier: MgmtTier) -> &mut VecDeque<Vec<u8>> {
        &mut self.mgmt[tier as usize]
    }

    pub fn mgmt_backlog(&self, tier: MgmtTier) -> usize {
        self.mgmt[tier as usize].len()
    }

    /// Admits a flow; an existing flow on the same CID is replaced
    pub fn admit_flow(&mut self, flow: ServiceFlow) {
        tracing::info!("admitting flow {} ({:?}, {:?})", flow.cid, flow.direction, flow.discipline);
        self.flows.insert(flow.cid, flow);
    }

    pub fn remove_flow(&mut self, cid: Cid) -> Option<ServiceFlow> {
        let removed = self.flows.remove(&cid);
        if removed.is_some() {
            tracing::info!("removed flow {}", cid);
        }
        removed
    }

    pub fn flow(&self, cid: Cid) -> Option<&ServiceFlow> {
        self.flows.get(&cid)
    }

    pub fn flow_mut(&mut self, cid: Cid) -> Option<&mut ServiceFlow> {
        self.flows.get_mut(&cid)
    }

    pub fn flows(&self) -> impl Iterator<Item = &ServiceFlow> {
        self.flows.values()
    }

    /// Service order for data flows in one direction: strict-priority flows
    /// first, then descending weight, ties broken by ascending CID.
    pub fn service_order(&self, direction: Direction) -> Vec<Cid> {
        let mut cids: Vec<&ServiceFlow> =
            self.flows.values().filter(|f| f.direction == direction).collect();
        cids.sort_by(|a, b| b.weight().cmp(&a.weight()).then(a.cid.0.cmp(&b.cid.0)));
        cids.into_iter().map(|f| f.cid).collect()
    }
}
