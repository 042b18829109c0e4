//! Station configuration for the OFDMA MAC stack.
//!
//! Runtime configuration with validation lives in `station_config`; TOML
//! loading through strict DTOs (unknown fields rejected) in `toml_config`.

pub mod station_config;
pub mod toml_config;

pub use station_config::{
    ArqConfig, ConfigErr, FlowConfig, MgmtWeights, RangingConfig, StationConfig,
};
