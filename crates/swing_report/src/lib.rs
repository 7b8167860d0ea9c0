//! swing_report: pure offline report model + renderers (text/JSON).
//!
//! Rules:
//! - No I/O here. Callers pass results already in memory; the CLI writes files.
//! - Display strings (percentages, seat means) are formatted once, in
//!   `structure`, so both renderers print identical figures.
//! - Stable section order and field names. The JSON root always carries the
//!   run record (engine, seed, params, input digests).

#![deny(unsafe_code)]

use std::fmt;

pub mod render_json;
pub mod render_text;
pub mod structure;

pub use render_json::{render_json, to_json_string};
pub use render_text::render_text;
pub use structure::{
    build_election, build_ensemble, build_poll_series, ReportBody, ReportModel, RunMode, RunRecord,
};

#[derive(Debug)]
pub enum ReportError {
    /// Raw payload could not be turned into JSON.
    Serialize(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serialize(m) => write!(f, "report serialization failed: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Serialize(e.to_string())
    }
}
