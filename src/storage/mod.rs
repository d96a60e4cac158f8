//! Storage Module
//!
//! The data file on disk and the replay that rebuilds the index from it.
//!
//! ## Components
//! - `DataFile`: append-only file handle with fsync-on-write
//! - `recovery`: replay of the data file into a `KeyDir`, torn-tail repair

mod data_file;
mod recovery;

pub use data_file::DataFile;
pub use recovery::{replay, verify, RecoveryResult};
