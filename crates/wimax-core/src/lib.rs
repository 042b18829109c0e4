//! Core utilities for the OFDMA MAC stack
//!
//! This crate provides fundamental types used across the stack:
//! - BitBuffer for bit-level PDU manipulation
//! - Cid for connection addressing and management priority classes
//! - Bsn and the modulo-2048 window arithmetic used by the ARQ engine
//! - FrameNumber / FrameDuration for OFDMA frame timing
//! - Common parse-error type and field-reading macros

pub mod bitbuffer;
pub mod cid;
pub mod frame_time;
pub mod pdu_parse_error;
pub mod window;

// Re-export commonly used items
pub use bitbuffer::BitBuffer;
pub use cid::{Cid, CidClass};
pub use frame_time::{Direction, FrameDuration, FrameNumber};
pub use pdu_parse_error::PduParseErr;
pub use window::{is_bsn_in_window, Bsn, BSN_MODULUS};
