use std::fmt;

use serde::Deserialize;

/// 16-bit connection identifier. Immutable once assigned; keys both the
/// per-station service-flow registry and the map IEs on the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Cid(pub u16);

/// CID used by contending stations before any connection is assigned
pub const INITIAL_RANGING_CID: Cid = Cid(0);
/// CID addressing all stations in the cell
pub const BROADCAST_CID: Cid = Cid(0xFFFF);

/// Highest basic-management CID; basic CIDs run 1..=255
pub const BASIC_CID_END: u16 = 0x00FF;
/// Highest primary-management CID; primary CIDs run 256..=510
pub const PRIMARY_CID_END: u16 = 0x01FE;
/// Highest transport/secondary CID
pub const TRANSPORT_CID_END: u16 = 0xFEFE;

/// Connection class, in descending scheduling priority for the management
/// tiers. Broadcast management traffic always goes out first in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CidClass {
    Broadcast,
    Basic,
    Primary,
    Secondary,
    Transport,
}

impl Cid {
    pub fn class(self) -> CidClass {
        match self.0 {
            0xFFFF => CidClass::Broadcast,
            0 => CidClass::Broadcast, // initial ranging shares the broadcast tier
            v if v <= BASIC_CID_END => CidClass::Basic,
            v if v <= PRIMARY_CID_END => CidClass::Primary,
            _ => CidClass::Transport,
        }
    }

    pub fn is_broadcast(self) -> bool {
        self == BROADCAST_CID || self == INITIAL_RANGING_CID
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cid:{}", self.0)
    }
}
