//! # DriftKV
//!
//! An embedded, log-structured key-value store (Bitcask-style) with:
//! - A single append-only data file, fsynced on every write
//! - CRC32-checksummed records and TTL expiry
//! - Crash recovery by replaying the log, tolerating torn tails
//! - All-or-nothing compaction of deleted and expired keys on close
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 set / get / delete / close                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                               │
//! │          (canonicalize key/value, encode records)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Data File  │◄─replay──│   KeyDir    │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └─────────────┘
//!          │ close
//!          ▼
//!   ┌─────────────┐
//!   │  Compactor  │
//!   │ (2 passes)  │
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use driftkv::{Engine, GetResult};
//!
//! let engine = Engine::open_path("./file.db")?;
//! engine.set("foo", "barbarbar")?;
//! assert_eq!(engine.get("foo")?, GetResult::Value("barbarbar".to_string()));
//! engine.close()?;
//! # Ok::<(), driftkv::DriftError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod record;
pub mod keydir;
pub mod storage;
pub mod compaction;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DriftError, Result};
pub use config::Config;
pub use engine::{Engine, GetResult};
pub use value::Datum;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DriftKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
