//! Overseer-Common: Shared types and error handling.
//!
//! This crate provides the vocabulary shared by the engine and the request
//! store:
//!
//! - **Typed IDs**: [`MediaId`], the metadata provider's canonical item id
//! - **Core Types**: [`MediaKind`] for partitioning request records
//! - **Error Handling**: the unified [`Error`] type and [`Result`] alias
//!
//! # Examples
//!
//! ```
//! use overseer_common::{Error, MediaId, MediaKind, Result};
//!
//! let id = MediaId::new(603);
//! assert_eq!(id.to_string(), "603");
//! assert_eq!(MediaKind::Movie.to_string(), "movie");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("movie", MediaId::new(1)))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
