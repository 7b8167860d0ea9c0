//! Target vote shares: named-party percentages with `Other` filled in, plus
//! optional per-region targets shaped `{region: {party: pct}}`.

use std::collections::BTreeMap;
use std::path::Path;

use swing_core::{PartyMap, SupportRatio};

use crate::{read_text_with_limits, IoError, IoResult};

pub fn target_from_percentages(named: &PartyMap<f64>) -> IoResult<SupportRatio> {
    Ok(SupportRatio::from_percentages(named)?)
}

pub fn load_regional_targets(path: &Path) -> IoResult<BTreeMap<String, SupportRatio>> {
    parse_regional_targets(&read_text_with_limits(path)?)
}

pub fn parse_regional_targets(text: &str) -> IoResult<BTreeMap<String, SupportRatio>> {
    let raw: BTreeMap<String, PartyMap<f64>> = serde_json::from_str(text)?;
    raw.into_iter()
        .map(|(region, pct)| {
            let s = SupportRatio::from_percentages(&pct)
                .map_err(|e| IoError::Invalid(format!("regional target {region}: {e}")))?;
            Ok((region, s))
        })
        .collect()
}
