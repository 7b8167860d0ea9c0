//! Plain-text renderer for terminal output.

use std::fmt::Write as _;

use crate::structure::{ElectionBlock, EnsembleBlock, FlagRow, PollsBlock, ReportBody, ReportModel};

pub fn render_text(m: &ReportModel) -> String {
    let mut out = String::new();
    let r = &m.run;
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", m.title);
    let _ = writeln!(
        out,
        "{} {}  seed {}  dataset sha256 {}",
        r.engine,
        r.version,
        r.seed,
        short_digest(&r.dataset_sha256)
    );
    out.push('\n');
    match &m.body {
        ReportBody::Election(b) => election_text(&mut out, b),
        ReportBody::Ensemble(b) => ensemble_text(&mut out, b),
        ReportBody::Polls(b) => polls_text(&mut out, b),
    }
    out
}

fn short_digest(d: &str) -> &str {
    d.get(..12).unwrap_or(d)
}

fn election_text(out: &mut String, b: &ElectionBlock) {
    let _ = writeln!(out, "{}", b.summary);
    let _ = writeln!(out, "Seats: {}, majority threshold {}", b.total_seats, b.threshold);
    out.push('\n');
    let _ = writeln!(out, "{:<14}{:>7}{:>9}{:>9}", "Party", "Seats", "Share", "Target");
    for row in &b.rows {
        let _ = writeln!(
            out,
            "{:<14}{:>7}{:>9}{:>9}",
            row.party.to_string(),
            row.seats,
            row.share_pct,
            row.target_pct
        );
    }
    flags_text(out, &b.scenarios);
    let _ = writeln!(
        out,
        "Seat winner is popular winner: {}",
        if b.seat_winner_is_pop_winner { "yes" } else { "no" }
    );
    let _ = writeln!(out, "Seat ties resolved by lot: {}", b.ties_resolved);
    if b.too_divergent {
        let _ = writeln!(out, "Warning: simulated national share is outside the result tolerance");
    }
}

fn ensemble_text(out: &mut String, b: &EnsembleBlock) {
    let _ = writeln!(
        out,
        "{} accepted of {} requested ({} discarded as divergent)",
        b.accepted, b.requested, b.discarded
    );
    out.push('\n');
    let _ = writeln!(
        out,
        "{:<14}{:>8}{:>10}{:>9}{:>8}  {}",
        "Party", "Win", "Largest", "Seats", "sd", "95% band"
    );
    for row in &b.rows {
        let _ = writeln!(
            out,
            "{:<14}{:>8}{:>10}{:>9}{:>8}  {} - {}",
            row.party.to_string(),
            row.win_pct,
            row.largest_pct,
            row.seats_mean,
            row.seats_sd,
            row.band95.0,
            row.band95.1
        );
    }
    let _ = writeln!(out, "Hung parliament: {}", b.hung_pct);
    let _ = writeln!(out, "Majority: mean {}, sd {}", b.margin_mean, b.margin_sd);
    if let Some(m) = &b.max_seats {
        let _ = writeln!(out, "Most seats in any run: {m}");
    }
    flags_text(out, &b.scenarios);
    let _ = writeln!(out, "Seat winner is popular winner: {}", b.pop_winner_pct);
}

fn polls_text(out: &mut String, b: &PollsBlock) {
    let _ = writeln!(out, "{:<12}{:<16}{:<14}{:>8}{:>8}", "Date", "Pollster", "Leader", "Seats", "Hung");
    for p in &b.polls {
        let _ = writeln!(
            out,
            "{:<12}{:<16}{:<14}{:>8}{:>8}",
            p.date,
            p.pollster,
            p.leader.to_string(),
            p.leader_seats_mean,
            p.hung_pct
        );
    }
    if !b.trends.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Seat trends (mean ± sd):");
        for t in &b.trends {
            let pts: Vec<String> = t.points.iter().map(|(d, m, s)| format!("{d} {m}±{s}")).collect();
            let _ = writeln!(out, "  {}: {}", t.party, pts.join(", "));
        }
    }
}

fn flags_text(out: &mut String, rows: &[FlagRow]) {
    if rows.is_empty() {
        return;
    }
    out.push('\n');
    let _ = writeln!(out, "Scenarios:");
    for f in rows {
        let _ = writeln!(out, "  {}: {}", f.label, f.value);
    }
}
