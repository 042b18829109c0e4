pub mod dl_map_ie;
pub mod fch;
pub mod sync_field;
pub mod ul_map_ie;

pub use dl_map_ie::DlMapIe;
pub use fch::Fch;
pub use sync_field::PhySyncField;
pub use ul_map_ie::{UlCdmaAllocationIe, UlDataGrantIe, UlMapIe, UlRangingInvitationIe};

/// UIUC announcing a CDMA ranging/BW-request invitation region
pub const UIUC_CDMA_RANGE: u8 = 12;
/// UIUC granting a specific contending station an allocation
pub const UIUC_CDMA_ALLOCATION: u8 = 14;
/// Highest UIUC naming a plain data burst profile
pub const UIUC_DATA_MAX: u8 = 10;
/// DIUC of the most reliable (broadcast) downlink burst profile
pub const DIUC_BROADCAST: u8 = 0;
