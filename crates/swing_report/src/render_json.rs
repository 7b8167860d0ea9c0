//! render_json.rs: report JSON renderer.
//! Section order: run → title → summary block → data.
//!
//! Key order is the insertion order of `serde_json::Map` (the crate enables
//! `preserve_order`).

use serde_json::{Map as JsonMap, Value};

use crate::structure::{
    ElectionBlock, EnsembleBlock, FlagRow, PollsBlock, ReportBody, ReportModel, RunRecord,
};
use crate::ReportError;

/// Build the top-level report object.
pub fn render_json(m: &ReportModel) -> Result<Value, ReportError> {
    let mut root = obj();
    root.insert("run".into(), run_json(&m.run)?);
    root.insert("title".into(), Value::String(m.title.clone()));
    match &m.body {
        ReportBody::Election(b) => root.insert("election".into(), election_json(b)),
        ReportBody::Ensemble(b) => root.insert("ensemble".into(), ensemble_json(b)),
        ReportBody::Polls(b) => root.insert("polls".into(), polls_json(b)),
    };
    root.insert("data".into(), m.data.clone());
    Ok(Value::Object(root))
}

/// Pretty-printed JSON text with a trailing newline.
pub fn to_json_string(m: &ReportModel) -> Result<String, ReportError> {
    let mut s = serde_json::to_string_pretty(&render_json(m)?)?;
    s.push('\n');
    Ok(s)
}

/* ----------------------- sections ----------------------- */

fn run_json(r: &RunRecord) -> Result<Value, ReportError> {
    let mut o = obj();
    o.insert("engine".into(), Value::String(r.engine.clone()));
    o.insert("version".into(), Value::String(r.version.clone()));
    o.insert("mode".into(), Value::String(r.mode.as_str().into()));
    o.insert("seed".into(), Value::from(r.seed));
    o.insert("workers".into(), Value::from(r.workers));
    o.insert("dataset_sha256".into(), Value::String(r.dataset_sha256.clone()));
    o.insert("params_sha256".into(), Value::String(r.params_sha256.clone()));
    o.insert("params".into(), serde_json::to_value(&r.params)?);
    Ok(Value::Object(o))
}

fn election_json(b: &ElectionBlock) -> Value {
    let mut o = obj();
    o.insert("summary".into(), Value::String(b.summary.clone()));
    o.insert("hung_parliament".into(), Value::Bool(b.hung));
    o.insert("total_seats".into(), Value::from(b.total_seats));
    o.insert("majority_threshold".into(), Value::from(b.threshold));

    let rows = b
        .rows
        .iter()
        .map(|r| {
            let mut row = obj();
            row.insert("party".into(), Value::String(r.party.to_string()));
            row.insert("seats".into(), Value::from(r.seats));
            row.insert("share".into(), Value::String(r.share_pct.clone()));
            row.insert("target".into(), Value::String(r.target_pct.clone()));
            Value::Object(row)
        })
        .collect();
    o.insert("parties".into(), Value::Array(rows));
    o.insert("scenarios".into(), flags_json(&b.scenarios));
    o.insert("seat_winner_is_pop_winner".into(), Value::Bool(b.seat_winner_is_pop_winner));
    o.insert("ties_resolved".into(), Value::from(b.ties_resolved));
    o.insert("too_divergent".into(), Value::Bool(b.too_divergent));
    Value::Object(o)
}

fn ensemble_json(b: &EnsembleBlock) -> Value {
    let mut o = obj();
    o.insert("requested".into(), Value::from(b.requested));
    o.insert("accepted".into(), Value::from(b.accepted));
    o.insert("discarded".into(), Value::from(b.discarded));

    let rows = b
        .rows
        .iter()
        .map(|r| {
            let mut row = obj();
            row.insert("party".into(), Value::String(r.party.to_string()));
            row.insert("win".into(), Value::String(r.win_pct.clone()));
            row.insert("largest".into(), Value::String(r.largest_pct.clone()));
            row.insert("seats_mean".into(), Value::String(r.seats_mean.clone()));
            row.insert("seats_sd".into(), Value::String(r.seats_sd.clone()));
            row.insert(
                "band95".into(),
                Value::Array(vec![
                    Value::String(r.band95.0.clone()),
                    Value::String(r.band95.1.clone()),
                ]),
            );
            Value::Object(row)
        })
        .collect();
    o.insert("parties".into(), Value::Array(rows));
    o.insert("hung".into(), Value::String(b.hung_pct.clone()));

    let mut margin = obj();
    margin.insert("mean".into(), Value::String(b.margin_mean.clone()));
    margin.insert("sd".into(), Value::String(b.margin_sd.clone()));
    o.insert("majority".into(), Value::Object(margin));

    o.insert(
        "max_seats".into(),
        b.max_seats.clone().map_or(Value::Null, Value::String),
    );
    o.insert("scenarios".into(), flags_json(&b.scenarios));
    o.insert("seat_winner_is_pop_winner".into(), Value::String(b.pop_winner_pct.clone()));
    Value::Object(o)
}

fn polls_json(b: &PollsBlock) -> Value {
    let polls = b
        .polls
        .iter()
        .map(|p| {
            let mut o = obj();
            o.insert("date".into(), Value::String(p.date.clone()));
            o.insert("pollster".into(), Value::String(p.pollster.clone()));
            if !p.sponsor.is_empty() {
                o.insert("sponsor".into(), Value::String(p.sponsor.clone()));
            }
            o.insert("sample_size".into(), Value::from(p.sample_size));
            o.insert("leader".into(), Value::String(p.leader.to_string()));
            o.insert("leader_seats_mean".into(), Value::String(p.leader_seats_mean.clone()));
            o.insert("hung".into(), Value::String(p.hung_pct.clone()));
            Value::Object(o)
        })
        .collect();

    let mut trends = obj();
    for t in &b.trends {
        let points = t
            .points
            .iter()
            .map(|(date, mean, sd)| {
                let mut o = obj();
                o.insert("date".into(), Value::String(date.clone()));
                o.insert("mean".into(), Value::String(mean.clone()));
                o.insert("sd".into(), Value::String(sd.clone()));
                Value::Object(o)
            })
            .collect();
        trends.insert(t.party.to_string(), Value::Array(points));
    }

    let mut o = obj();
    o.insert("polls".into(), Value::Array(polls));
    o.insert("trends".into(), Value::Object(trends));
    Value::Object(o)
}

fn flags_json(rows: &[FlagRow]) -> Value {
    Value::Array(
        rows.iter()
            .map(|f| {
                let mut o = obj();
                o.insert("label".into(), Value::String(f.label.clone()));
                o.insert("value".into(), Value::String(f.value.clone()));
                Value::Object(o)
            })
            .collect(),
    )
}

#[inline]
fn obj() -> JsonMap<String, Value> {
    JsonMap::new()
}
