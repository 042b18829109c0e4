use std::fmt;

use wimax_core::cid::TRANSPORT_CID_END;
use wimax_core::{Cid, CidClass, Direction, FrameDuration, BSN_MODULUS};

/// Configuration errors are fatal: the station does not come up on an
/// invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErr {
    IllegalFrameDurationCode { code: u8 },
    /// The ranging channel must leave at least one uplink subchannel for data
    RangingChannelTooWide { ranging: u16, total: u16 },
    ArqWindowTooLarge { window_size: u16 },
    ArqBlockSizeZero,
    EmptyGrid { field: &'static str },
    /// Grid dimension does not fit the map IE geometry fields on the wire
    GridTooLarge { field: &'static str, value: u16, max: u16 },
    BadFlow { cid: u16, reason: &'static str },
    DuplicateFlowCid { cid: u16 },
    MissingField { context: &'static str, field: &'static str },
    UnrecognizedFields { context: &'static str, fields: Vec<String> },
    Io(String),
    Toml(String),
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::IllegalFrameDurationCode { code } => {
                write!(f, "illegal frame duration code {} (legal codes are 1..=8)", code)
            }
            ConfigErr::RangingChannelTooWide { ranging, total } => {
                write!(f, "ranging channel of {} subchannels leaves no data subchannels (uplink total {})", ranging, total)
            }
            ConfigErr::ArqWindowTooLarge { window_size } => {
                write!(f, "ARQ window size {} must be < {}", window_size, BSN_MODULUS)
            }
            ConfigErr::ArqBlockSizeZero => write!(f, "ARQ block size must be non-zero"),
            ConfigErr::EmptyGrid { field } => write!(f, "{} must be non-zero", field),
            ConfigErr::GridTooLarge { field, value, max } => {
                write!(f, "{} = {} does not fit the map IE fields (max {})", field, value, max)
            }
            ConfigErr::BadFlow { cid, reason } => write!(f, "flow cid {}: {}", cid, reason),
            ConfigErr::DuplicateFlowCid { cid } => {
                write!(f, "flow cid {} configured more than once", cid)
            }
            ConfigErr::MissingField { context, field } => {
                write!(f, "missing required field {} in {}", field, context)
            }
            ConfigErr::UnrecognizedFields { context, fields } => {
                write!(f, "unrecognized fields in {}: {:?}", context, fields)
            }
            ConfigErr::Io(e) => write!(f, "config io error: {}", e),
            ConfigErr::Toml(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigErr {}

/// Relative weights of the four management tiers. These only matter for
/// reporting; the scheduler serves the tiers in strict priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MgmtWeights {
    pub broadcast: u32,
    pub basic: u32,
    pub primary: u32,
    pub secondary: u32,
}

impl Default for MgmtWeights {
    fn default() -> Self {
        MgmtWeights { broadcast: 8, basic: 4, primary: 2, secondary: 1 }
    }
}

/// Contention ranging / bandwidth-request channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangingConfig {
    pub enabled: bool,
    /// Subchannels reserved for the ranging channel, deducted from the
    /// uplink grid before data/management grants
    pub channel_subchannels: u16,
    /// Size of one initial/periodic ranging opportunity, in PS
    pub ranging_opp_size_ps: u32,
    /// Size of one contention bandwidth-request opportunity, in PS
    pub request_opp_size_ps: u32,
    /// Subscriber-station transition gap added to each uplink grant, in PS
    pub sstg_ps: u32,
}

impl Default for RangingConfig {
    fn default() -> Self {
        RangingConfig {
            enabled: true,
            channel_subchannels: 2,
            ranging_opp_size_ps: 8,
            request_opp_size_ps: 4,
            sstg_ps: 1,
        }
    }
}

/// Per-flow ARQ defaults, applied when a flow is admitted with ARQ enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArqConfig {
    /// Maximum outstanding blocks; strictly less than the BSN modulus
    pub window_size: u16,
    /// Fragment size in bytes
    pub block_size: u16,
    /// Retransmissions before a block is abandoned
    pub retry_limit: u8,
}

impl Default for ArqConfig {
    fn default() -> Self {
        ArqConfig { window_size: 256, block_size: 64, retry_limit: 4 }
    }
}

/// One pre-provisioned transport connection, admitted when the station
/// comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowConfig {
    pub cid: Cid,
    pub direction: Direction,
    /// Coding scheme code of the flow's burst profile (0..=7)
    pub coding_code: u8,
    /// DIUC (downlink) or UIUC (uplink) announced in the map IEs
    pub profile_code: u8,
    /// Strict-priority flows drain before any weighted flow gets a turn
    pub strict: bool,
    pub weight: u32,
    pub arq: bool,
}

/// Validated station-wide MAC configuration.
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub frame_duration: FrameDuration,
    /// OFDMA grid dimensions per subframe
    pub num_dl_subchannels: u16,
    pub num_ul_subchannels: u16,
    pub num_dl_symbols: u16,
    pub num_ul_symbols: u16,
    pub ranging: RangingConfig,
    pub arq: ArqConfig,
    pub mgmt_weights: MgmtWeights,
    /// Transport connections provisioned at start-up
    pub flows: Vec<FlowConfig>,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            frame_duration: FrameDuration::Ms5,
            num_dl_subchannels: 30,
            num_ul_subchannels: 35,
            num_dl_symbols: 27,
            num_ul_symbols: 18,
            ranging: RangingConfig::default(),
            arq: ArqConfig::default(),
            mgmt_weights: MgmtWeights::default(),
            flows: Vec::new(),
        }
    }
}

impl StationConfig {
    /// Uplink subchannels withheld from data traffic for the ranging channel
    pub fn effective_ranging_subchannels(&self) -> u16 {
        if self.ranging.enabled { self.ranging.channel_subchannels } else { 0 }
    }

    /// Sanity-check the configuration. Any error here is fatal.
    pub fn validate(&self) -> Result<(), ConfigErr> {
        if self.num_dl_subchannels == 0 {
            return Err(ConfigErr::EmptyGrid { field: "num_dl_subchannels" });
        }
        if self.num_ul_subchannels == 0 {
            return Err(ConfigErr::EmptyGrid { field: "num_ul_subchannels" });
        }
        if self.num_dl_symbols == 0 {
            return Err(ConfigErr::EmptyGrid { field: "num_dl_symbols" });
        }
        if self.num_ul_symbols == 0 {
            return Err(ConfigErr::EmptyGrid { field: "num_ul_symbols" });
        }
        // The map IEs carry burst geometry in fixed-width fields: the DL-MAP
        // IE has 7 bits of num_symbols and 6 of num_subchannels, the ranging
        // invitation IE 7 bits of each. A grid wider than those fields could
        // produce a full-subframe burst no IE can describe.
        for (field, value, max) in [
            ("num_dl_symbols", self.num_dl_symbols, 127),
            ("num_dl_subchannels", self.num_dl_subchannels, 63),
            ("num_ul_symbols", self.num_ul_symbols, 127),
            ("num_ul_subchannels", self.num_ul_subchannels, 127),
        ] {
            if value > max {
                return Err(ConfigErr::GridTooLarge { field, value, max });
            }
        }
        if self.ranging.enabled && self.ranging.channel_subchannels >= self.num_ul_subchannels {
            return Err(ConfigErr::RangingChannelTooWide {
                ranging: self.ranging.channel_subchannels,
                total: self.num_ul_subchannels,
            });
        }
        if self.arq.window_size >= BSN_MODULUS {
            return Err(ConfigErr::ArqWindowTooLarge { window_size: self.arq.window_size });
        }
        if self.arq.block_size == 0 {
            return Err(ConfigErr::ArqBlockSizeZero);
        }
        let mut seen = Vec::new();
        for flow in &self.flows {
            if flow.cid.class() != CidClass::Transport || flow.cid.0 > TRANSPORT_CID_END {
                return Err(ConfigErr::BadFlow {
                    cid: flow.cid.0,
                    reason: "cid outside the transport range",
                });
            }
            if flow.coding_code > 7 {
                return Err(ConfigErr::BadFlow {
                    cid: flow.cid.0,
                    reason: "unknown coding scheme code",
                });
            }
            if !flow.strict && flow.weight == 0 {
                return Err(ConfigErr::BadFlow {
                    cid: flow.cid.0,
                    reason: "weighted flow needs a non-zero weight",
                });
            }
            if seen.contains(&flow.cid) {
                return Err(ConfigErr::DuplicateFlowCid { cid: flow.cid.0 });
            }
            seen.push(flow.cid);
        }
        Ok(())
    }
}
