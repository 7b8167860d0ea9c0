//! Dataset loader: constituency records with two prior results each.
//!
//! Wire shape:
//! ```json
//! {"constituencies": [
//!   {"name": "Aldershot", "region": "South East",
//!    "prev2": {"votes": {"Conservative": 20000, "Labour": 15000}, "total_votes": 41000},
//!    "prev1": {"votes": {"Conservative": 18000}, "electorate": 70000, "turnout_pct": 62.5}}
//! ]}
//! ```
//! Total votes come from `total_votes`, else `trunc(electorate × turnout_pct / 100)`.
//! `Other` is always derived as total − Σ named; an explicit `Other` entry is ignored.

use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;
use swing_core::{Constituency, Dataset, Party, PartyMap, VoteCount};

use crate::hasher::sha256_hex;
use crate::{read_text_with_limits, IoError, IoResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResult {
    votes: PartyMap<u64>,
    #[serde(default)]
    total_votes: Option<u64>,
    #[serde(default)]
    electorate: Option<u64>,
    #[serde(default)]
    turnout_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConstituency {
    name: String,
    region: String,
    prev2: RawResult,
    prev1: RawResult,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDataset {
    constituencies: Vec<RawConstituency>,
}

/// A validated dataset plus the SHA-256 of the exact bytes it was read from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub sha256: String,
}

pub fn load_dataset(path: &Path) -> IoResult<LoadedDataset> {
    let text = read_text_with_limits(path)?;
    let dataset = parse_dataset(&text)?;
    info!("loaded {} constituencies from {}", dataset.len(), path.display());
    Ok(LoadedDataset { dataset, sha256: sha256_hex(text.as_bytes()) })
}

pub fn parse_dataset(text: &str) -> IoResult<Dataset> {
    let raw: RawDataset = serde_json::from_str(text)?;
    if raw.constituencies.is_empty() {
        return Err(IoError::Invalid("dataset has no constituencies".into()));
    }

    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(raw.constituencies.len());
    for rc in raw.constituencies {
        let name = rc.name.trim().to_string();
        if name.is_empty() {
            return Err(IoError::Invalid("constituency with empty name".into()));
        }
        if !seen.insert(name.clone()) {
            return Err(IoError::Invalid(format!("duplicate constituency: {name}")));
        }
        let prev2 = build_result(&name, "prev2", rc.prev2)?;
        let prev1 = build_result(&name, "prev1", rc.prev1)?;
        debug!("{name}: prev2 total={} prev1 total={}", prev2.total(), prev1.total());
        out.push(Constituency { name, region: rc.region.trim().to_string(), prev2, prev1 });
    }
    Ok(Dataset::new(out))
}

fn build_result(name: &str, which: &str, r: RawResult) -> IoResult<VoteCount> {
    let total = match (r.total_votes, r.electorate, r.turnout_pct) {
        (Some(t), _, _) => t,
        (None, Some(e), Some(pct)) => {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(IoError::Invalid(format!(
                    "{name}/{which}: turnout_pct must be in [0, 100], got {pct}"
                )));
            }
            (e as f64 * pct / 100.0).trunc() as u64
        }
        _ => {
            return Err(IoError::Invalid(format!(
                "{name}/{which}: needs total_votes or electorate + turnout_pct"
            )))
        }
    };
    if total == 0 {
        return Err(IoError::Invalid(format!("{name}/{which}: total votes is zero")));
    }
    let named = PartyMap::from_fn(|p| if p == Party::Other { 0 } else { r.votes[p] });
    Ok(VoteCount::from_named_with_total(named, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SEATS: &str = r#"{"constituencies":[
        {"name":"Alpha","region":"North",
         "prev2":{"votes":{"Conservative":20000,"Labour":15000},"total_votes":35000},
         "prev1":{"votes":{"Conservative":18000,"Labour":17000},"total_votes":35000}},
        {"name":"Beta","region":"South",
         "prev2":{"votes":{"Lib-Dem":9000,"Green":1000},"electorate":20000,"turnout_pct":62.5},
         "prev1":{"votes":{"Lib-Dem":8000,"UKIP":2000},"total_votes":12000}}
    ]}"#;

    #[test]
    fn parses_and_derives_other() {
        let ds = parse_dataset(TWO_SEATS).unwrap();
        assert_eq!(ds.len(), 2);
        let beta = &ds.constituencies[1];
        assert_eq!(beta.prev2.total(), 12_500);
        assert_eq!(beta.prev2.get(Party::Other), 2_500);
        assert_eq!(beta.prev1.get(Party::Other), 2_000);
        assert_eq!(ds.constituencies[0].prev1.get(Party::Other), 0);
    }

    #[test]
    fn rejects_empty_dataset() {
        let err = parse_dataset(r#"{"constituencies":[]}"#).unwrap_err();
        assert!(matches!(err, IoError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_total() {
        let text = TWO_SEATS.replace(r#""total_votes":12000"#, r#""total_votes":0"#);
        let err = parse_dataset(&text).unwrap_err();
        assert!(err.to_string().contains("total votes is zero"), "{err}");
    }

    #[test]
    fn rejects_unknown_party() {
        let text = TWO_SEATS.replace("\"UKIP\"", "\"Whig\"");
        let err = parse_dataset(&text).unwrap_err();
        assert!(matches!(err, IoError::Json { .. }));
        assert!(err.to_string().contains("Whig"), "{err}");
    }

    #[test]
    fn rejects_negative_votes_and_duplicates() {
        let text = TWO_SEATS.replace("\"Labour\":15000", "\"Labour\":-1");
        assert!(matches!(parse_dataset(&text), Err(IoError::Json { .. })));

        let text = TWO_SEATS.replace("\"Beta\"", "\"Alpha\"");
        let err = parse_dataset(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate constituency"), "{err}");
    }

    #[test]
    fn rejects_missing_totals() {
        let text = TWO_SEATS.replace(r#","electorate":20000,"turnout_pct":62.5"#, "");
        assert!(matches!(parse_dataset(&text), Err(IoError::Invalid(_))));
    }
}
