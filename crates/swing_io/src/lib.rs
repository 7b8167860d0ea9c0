//! crates/swing_io/src/lib.rs
//! Input loading and output writing for the engine.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Every loader validates fully before returning: nothing malformed reaches
//!   the simulation, and no worker is spawned for a bad input.
//! - Details live in submodules; this file only wires them together.

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Read;
use std::path::Path;

use swing_core::CoreError;
use thiserror::Error;

/// Unified error for swing_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, read, create_dir_all, rename, fsync).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON serialization/deserialization errors with a location hint.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Domain checks from swing_core (zero totals, bad shares, bad params).
    #[error("invalid value: {0}")]
    Core(#[from] CoreError),

    /// Generic validation / invariants.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Input exceeded a size limit.
    #[error("limit exceeded: {0}")]
    Limit(&'static str),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json has no pointer; report line/column instead.
        IoError::Json {
            pointer: format!("line {} column {}", e.line(), e.column()),
            msg: e.to_string(),
        }
    }
}

pub mod canonical_json;
pub mod dataset;
pub mod hasher;
pub mod params;
pub mod polls;
pub mod target;

/// Largest JSON input accepted by any loader.
pub const MAX_JSON_BYTES: u64 = 64 * 1024 * 1024;

/// Read a whole file as UTF-8, refusing anything over [`MAX_JSON_BYTES`].
pub(crate) fn read_text_with_limits(path: &Path) -> IoResult<String> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let mut buf = String::new();
    let n = f.take(MAX_JSON_BYTES + 1).read_to_string(&mut buf)?;
    if n as u64 > MAX_JSON_BYTES {
        return Err(IoError::Limit("input file larger than 64 MiB"));
    }
    Ok(buf)
}

pub mod prelude {
    pub use crate::{IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_json_bytes, write_atomic, write_canonical_file};
    pub use crate::dataset::{load_dataset, parse_dataset, LoadedDataset};
    pub use crate::hasher::{sha256_file, sha256_hex};
    pub use crate::params::{load_params, parse_params};
    pub use crate::polls::{load_polls, parse_polls, PollRecord};
    pub use crate::target::{load_regional_targets, parse_regional_targets, target_from_percentages};
}
