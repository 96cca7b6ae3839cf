//! Overseer-DB: Request record persistence
//!
//! This crate stores the local request records that the reconciliation
//! engine joins against, using SQLite with rusqlite and r2d2 connection
//! pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use overseer_common::{MediaId, MediaKind};
//! use overseer_db::models::NewRequest;
//! use overseer_db::pool::{init_pool, get_conn};
//! use overseer_db::queries::requests;
//!
//! let pool = init_pool("/var/lib/overseer/db.sqlite").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let record = requests::create_request(
//!     &conn,
//!     &NewRequest::new(MediaId::new(603), MediaKind::Movie, "The Matrix"),
//! )
//! .unwrap();
//! println!("Requested: {}", record.title);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
