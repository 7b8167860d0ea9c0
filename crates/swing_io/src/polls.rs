//! Opinion-poll records.
//!
//! `{"polls": [{"date": "2015-04-01", "pollster": "YouGov", "sponsor": "Sun",
//!              "sample_size": 1500, "shares": {"Conservative": 34, "Labour": 33}}]}`
//!
//! Shares are percentages of named parties; `Other` is the remainder.
//! Dates must be real calendar dates written `YYYY-MM-DD`.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use swing_core::{PartyMap, SupportRatio};

use crate::{read_text_with_limits, IoError, IoResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollRecord {
    #[serde(with = "poll_date")]
    pub date: NaiveDate,
    pub pollster: String,
    #[serde(default)]
    pub sponsor: String,
    #[serde(default)]
    pub sample_size: u64,
    pub shares: PartyMap<f64>,
}

impl PollRecord {
    pub fn support(&self) -> IoResult<SupportRatio> {
        SupportRatio::from_percentages(&self.shares)
            .map_err(|e| IoError::Invalid(format!("poll {} {}: {e}", self.date, self.pollster)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPolls {
    polls: Vec<PollRecord>,
}

pub fn load_polls(path: &Path) -> IoResult<Vec<PollRecord>> {
    parse_polls(&read_text_with_limits(path)?)
}

/// Parse and validate every record (dates during parsing, then shares).
/// Order is preserved.
pub fn parse_polls(text: &str) -> IoResult<Vec<PollRecord>> {
    let raw: RawPolls = serde_json::from_str(text)?;
    for p in &raw.polls {
        p.support()?;
    }
    Ok(raw.polls)
}

/// `YYYY-MM-DD` on the wire, `NaiveDate` in memory.
mod poll_date {
    use chrono::NaiveDate;
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, FORMAT)
            .map_err(|e| D::Error::custom(format!("poll date must be YYYY-MM-DD: {raw} ({e})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_core::Party;

    #[test]
    fn parses_polls() {
        let polls = parse_polls(
            r#"{"polls":[{"date":"2015-04-01","pollster":"YouGov","sponsor":"Sun",
                "sample_size":1500,"shares":{"Conservative":34,"Labour":33,"UKIP":13}}]}"#,
        )
        .unwrap();
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].date, NaiveDate::from_ymd_opt(2015, 4, 1).unwrap());
        let s = polls[0].support().unwrap();
        assert!((s.get(Party::Other) - 0.20).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_dates_and_shares() {
        let bad_date = r#"{"polls":[{"date":"01/04/2015","pollster":"X","shares":{}}]}"#;
        assert!(matches!(parse_polls(bad_date), Err(IoError::Json { .. })));
        let bad_share =
            r#"{"polls":[{"date":"2015-04-01","pollster":"X","shares":{"Labour":120}}]}"#;
        assert!(matches!(parse_polls(bad_share), Err(IoError::Invalid(_))));
    }

    #[test]
    fn impossible_calendar_dates_are_rejected() {
        for date in ["2015-02-31", "2010-13-06", "2015-04-31", "2014-02-29"] {
            let text = format!(
                r#"{{"polls":[{{"date":"{date}","pollster":"X","shares":{{"Labour":30}}}}]}}"#
            );
            let err = parse_polls(&text).unwrap_err();
            assert!(err.to_string().contains("YYYY-MM-DD"), "{date}: {err}");
        }
        let leap = r#"{"polls":[{"date":"2016-02-29","pollster":"X","shares":{"Labour":30}}]}"#;
        assert!(parse_polls(leap).is_ok());
    }

    #[test]
    fn dates_serialize_as_iso_strings() {
        let p = PollRecord {
            date: NaiveDate::from_ymd_opt(2015, 5, 7).unwrap(),
            pollster: "ICM".into(),
            sponsor: String::new(),
            sample_size: 0,
            shares: PartyMap::splat(0.0),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["date"], "2015-05-07");
    }
}
