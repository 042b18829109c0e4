use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use wimax_core::{Cid, Direction, FrameDuration};

use crate::station_config::{
    ArqConfig, ConfigErr, FlowConfig, MgmtWeights, RangingConfig, StationConfig,
};

/// Build a validated `StationConfig` from a TOML configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<StationConfig, ConfigErr> {
    let toml_str = std::fs::read_to_string(path).map_err(|e| ConfigErr::Io(e.to_string()))?;
    from_toml_str(&toml_str)
}

/// Build a validated `StationConfig` from a TOML string.
pub fn from_toml_str(toml_str: &str) -> Result<StationConfig, ConfigErr> {
    let root: TomlConfigRoot = toml::from_str(toml_str).map_err(|e| ConfigErr::Toml(e.to_string()))?;

    // Reject unrecognized fields anywhere in the tree; silently ignored
    // options are how misconfigured stations stay misconfigured.
    if !root.extra.is_empty() {
        return Err(ConfigErr::UnrecognizedFields {
            context: "top level",
            fields: sorted_keys(&root.extra),
        });
    }
    if let Some(ref frame) = root.frame {
        if !frame.extra.is_empty() {
            return Err(ConfigErr::UnrecognizedFields { context: "frame", fields: sorted_keys(&frame.extra) });
        }
    }
    if let Some(ref rng) = root.ranging {
        if !rng.extra.is_empty() {
            return Err(ConfigErr::UnrecognizedFields { context: "ranging", fields: sorted_keys(&rng.extra) });
        }
    }
    if let Some(ref arq) = root.arq {
        if !arq.extra.is_empty() {
            return Err(ConfigErr::UnrecognizedFields { context: "arq", fields: sorted_keys(&arq.extra) });
        }
    }
    if let Some(ref w) = root.mgmt_weights {
        if !w.extra.is_empty() {
            return Err(ConfigErr::UnrecognizedFields { context: "mgmt_weights", fields: sorted_keys(&w.extra) });
        }
    }
    if let Some(ref flows) = root.flows {
        for f in flows {
            if !f.extra.is_empty() {
                return Err(ConfigErr::UnrecognizedFields { context: "flows", fields: sorted_keys(&f.extra) });
            }
        }
    }

    let mut cfg = StationConfig::default();

    if let Some(frame) = root.frame {
        if let Some(code) = frame.duration_code {
            cfg.frame_duration = FrameDuration::from_code(code)
                .ok_or(ConfigErr::IllegalFrameDurationCode { code })?;
        }
        if let Some(v) = frame.num_dl_subchannels { cfg.num_dl_subchannels = v; }
        if let Some(v) = frame.num_ul_subchannels { cfg.num_ul_subchannels = v; }
        if let Some(v) = frame.num_dl_symbols { cfg.num_dl_symbols = v; }
        if let Some(v) = frame.num_ul_symbols { cfg.num_ul_symbols = v; }
    }

    if let Some(rng) = root.ranging {
        let d = RangingConfig::default();
        cfg.ranging = RangingConfig {
            enabled: rng.enabled.unwrap_or(d.enabled),
            channel_subchannels: rng.channel_subchannels.unwrap_or(d.channel_subchannels),
            ranging_opp_size_ps: rng.ranging_opp_size_ps.unwrap_or(d.ranging_opp_size_ps),
            request_opp_size_ps: rng.request_opp_size_ps.unwrap_or(d.request_opp_size_ps),
            sstg_ps: rng.sstg_ps.unwrap_or(d.sstg_ps),
        };
    }

    if let Some(arq) = root.arq {
        let d = ArqConfig::default();
        cfg.arq = ArqConfig {
            window_size: arq.window_size.unwrap_or(d.window_size),
            block_size: arq.block_size.unwrap_or(d.block_size),
            retry_limit: arq.retry_limit.unwrap_or(d.retry_limit),
        };
    }

    if let Some(w) = root.mgmt_weights {
        let d = MgmtWeights::default();
        cfg.mgmt_weights = MgmtWeights {
            broadcast: w.broadcast.unwrap_or(d.broadcast),
            basic: w.basic.unwrap_or(d.basic),
            primary: w.primary.unwrap_or(d.primary),
            secondary: w.secondary.unwrap_or(d.secondary),
        };
    }

    if let Some(flows) = root.flows {
        for f in flows {
            let cid = f.cid.ok_or(ConfigErr::MissingField { context: "flows", field: "cid" })?;
            let direction = f
                .direction
                .ok_or(ConfigErr::MissingField { context: "flows", field: "direction" })?;
            cfg.flows.push(FlowConfig {
                cid,
                direction,
                coding_code: f.coding_code.unwrap_or(1),
                profile_code: f.profile_code.unwrap_or(1),
                strict: f.strict.unwrap_or(false),
                weight: f.weight.unwrap_or(1),
                arq: f.arq.unwrap_or(false),
            });
        }
    }

    cfg.validate()?;
    Ok(cfg)
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

#[derive(Debug, Deserialize)]
struct TomlConfigRoot {
    frame: Option<FrameDto>,
    ranging: Option<RangingDto>,
    arq: Option<ArqDto>,
    mgmt_weights: Option<MgmtWeightsDto>,
    flows: Option<Vec<FlowDto>>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FlowDto {
    cid: Option<Cid>,
    direction: Option<Direction>,
    coding_code: Option<u8>,
    profile_code: Option<u8>,
    strict: Option<bool>,
    weight: Option<u32>,
    arq: Option<bool>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FrameDto {
    duration_code: Option<u8>,
    num_dl_subchannels: Option<u16>,
    num_ul_subchannels: Option<u16>,
    num_dl_symbols: Option<u16>,
    num_ul_symbols: Option<u16>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RangingDto {
    enabled: Option<bool>,
    channel_subchannels: Option<u16>,
    ranging_opp_size_ps: Option<u32>,
    request_opp_size_ps: Option<u32>,
    sstg_ps: Option<u32>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ArqDto {
    window_size: Option<u16>,
    block_size: Option<u16>,
    retry_limit: Option<u8>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MgmtWeightsDto {
    broadcast: Option<u32>,
    basic: Option<u32>,
    primary: Option<u32>,
    secondary: Option<u32>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
