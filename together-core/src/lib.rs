//! Core library for Together Apart.
//!
//! This crate provides the domain models, the quest progress logic, and the
//! database operations for Together Apart, independent of any transport
//! layer.
//!
//! # Usage
//!
//! ```no_run
//! use together_core::db::Database;
//! use together_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let couple_id = uuid::Uuid::new_v4();
//! let quests = db.list_quests_by_couple(couple_id)?;
//! let buckets = partition_quests(&quests);
//! # Ok::<(), together_core::error::DbError>(())
//! ```

pub mod dates;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{DbError, DbResult};
