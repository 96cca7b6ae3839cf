//! Database query modules.
//!
//! - requests: Request record creation and per-kind listing

pub mod requests;
