//! Base-station MAC: bandwidth scheduling, CDMA ranging resolution and
//! selective-repeat ARQ on top of the `wimax-pdus` wire formats.

pub mod alloc_map;
pub mod arq;
pub mod phy_adapter;
pub mod queues;
pub mod ranging;
pub mod scheduler;

pub use alloc_map::{AllocationMap, BurstDescriptor};
pub use arq::{ArqEngine, ArqErr, ArqState, FeedbackOutcome, RxOutcome};
pub use phy_adapter::{CapacityErr, CodingScheme, OfdmaPhy, PhyProfile};
pub use queues::{ConnectionQueues, Discipline, MgmtTier, ServiceFlow};
pub use ranging::{CdmaRangingResolver, RangingCodeType, RangingRecord};
pub use scheduler::{DlGrant, DlSchedule, SchedErr, SubframeScheduler, UlSchedule};
