//! Bit-exact wire codecs for the OFDMA MAC.
//!
//! Every PDU type exposes `from_bitbuf` / `to_bitbuf` over a
//! `wimax_core::BitBuffer` and round-trips bit-identically. Field layouts
//! follow the OFDMA map formats: fixed-width MSB-first fields, no padding
//! beyond what the records declare.

pub mod arq;
pub mod phy;
