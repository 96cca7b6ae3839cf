//! Metadata provider system for discovering media items.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and the [`MediaItem`] snapshot type.
//! - [`providers`] -- Concrete provider implementations (TMDB).

pub mod provider;
pub mod providers;

pub use provider::{Category, MediaItem, MetadataProvider};
