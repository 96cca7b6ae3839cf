//! Overseer - media request reconciliation
//!
//! Annotates metadata-provider results with local request state and
//! media-server library availability. The library crate exposes the engine
//! and its collaborators for the binary and for integration testing.

pub mod availability;
pub mod config;
pub mod engine;
pub mod metadata;
pub mod requests;
