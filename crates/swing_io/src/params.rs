//! Parameter-set loader. Every field is optional; missing ones keep their defaults.

use std::path::Path;

use swing_core::SimParams;

use crate::{read_text_with_limits, IoResult};

pub fn load_params(path: &Path) -> IoResult<SimParams> {
    parse_params(&read_text_with_limits(path)?)
}

pub fn parse_params(text: &str) -> IoResult<SimParams> {
    let ps: SimParams = serde_json::from_str(text)?;
    ps.validate_domains()?;
    Ok(ps)
}
