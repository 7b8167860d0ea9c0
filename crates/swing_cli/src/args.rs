// crates/swing_cli/src/args.rs
//
// CLI argument surface and post-parse checks.
//
// Rules:
// - --data is always required; --params and --regional-targets are optional.
// - Exactly one mode: --single-election, --montecarlo N, or --polls FILE.
// - Party flags are percentages of the national vote; Other is the remainder.
// - Seed accepts decimal u64 or 0x-hex up to 16 nybbles.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use swing_core::{Party, PartyMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Render {
    Text,
    Json,
}

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "swingometer",
    version,
    disable_help_subcommand = true,
    about = "Swing-based seat predictions and Monte Carlo ensembles for first-past-the-post elections"
)]
pub struct Args {
    // --- Inputs ---
    /// Constituency dataset JSON.
    #[arg(long)]
    pub data: PathBuf,
    /// Simulation parameters JSON (every field optional).
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Per-region target shares JSON: {"Scotland": {"SNP": 45, "Labour": 25}, ...}.
    #[arg(long)]
    pub regional_targets: Option<PathBuf>,
    /// Use regional swing where a regional target exists.
    #[arg(long)]
    pub regional: bool,

    // --- Mode ---
    /// Simulate a single election.
    #[arg(short = '1', long, conflicts_with_all = ["iterations", "polls"])]
    pub single_election: bool,
    /// Run a Monte Carlo ensemble of N accepted realizations.
    #[arg(short = 'm', long = "montecarlo", value_name = "N", conflicts_with = "polls")]
    pub iterations: Option<usize>,
    /// Run one ensemble per opinion poll in this JSON file.
    #[arg(long)]
    pub polls: Option<PathBuf>,

    // --- Party support (percent) ---
    #[arg(short = 't', long = "conservative", default_value_t = 0.0)]
    pub conservative: f64,
    #[arg(short = 'l', long = "labour", default_value_t = 0.0)]
    pub labour: f64,
    #[arg(short = 'd', long = "libdem", default_value_t = 0.0)]
    pub libdem: f64,
    #[arg(short = 'n', long = "snp", default_value_t = 0.0)]
    pub snp: f64,
    #[arg(short = 'w', long = "plaid-cymru", default_value_t = 0.0)]
    pub plaid_cymru: f64,
    #[arg(short = 'g', long = "green", default_value_t = 0.0)]
    pub green: f64,
    #[arg(short = 'z', long = "bnp", default_value_t = 0.0)]
    pub bnp: f64,
    #[arg(short = 'u', long = "ukip", default_value_t = 0.0)]
    pub ukip: f64,

    // --- Overrides ---
    /// RNG seed. Decimal u64 or 0x-hex (<= 16 hex digits).
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,
    /// Worker threads (default: available parallelism).
    #[arg(long)]
    pub workers: Option<usize>,
    /// Abort if no result arrives for this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    // --- Output ---
    /// Output format on stdout.
    #[arg(long, value_enum, default_value = "text")]
    pub render: Render,
    /// Also write the JSON report to this file (atomically).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Debug logging.
    #[arg(long, conflicts_with = "quiet")]
    pub debug: bool,
    /// Errors only.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Single,
    MonteCarlo,
    Polls,
}

impl Args {
    pub fn mode(&self) -> Option<Mode> {
        if self.single_election {
            Some(Mode::Single)
        } else if self.polls.is_some() {
            Some(Mode::Polls)
        } else if self.iterations.is_some() {
            Some(Mode::MonteCarlo)
        } else {
            None
        }
    }

    /// Named-party percentages from the flags. `Other` stays 0 (derived later).
    pub fn named_shares(&self) -> PartyMap<f64> {
        let mut m = PartyMap::splat(0.0);
        m.set(Party::Conservative, self.conservative);
        m.set(Party::Labour, self.labour);
        m.set(Party::LibDem, self.libdem);
        m.set(Party::Snp, self.snp);
        m.set(Party::PlaidCymru, self.plaid_cymru);
        m.set(Party::Green, self.green);
        m.set(Party::Bnp, self.bnp);
        m.set(Party::Ukip, self.ukip);
        m
    }
}

/// Errors surfaced by argument validation. Messages are short and stable.
#[derive(Debug)]
pub enum CliError {
    NoMode,
    NoTarget,
    NotFound(String),
    BadCount(&'static str),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NoMode => write!(f, "choose one of --single-election, --montecarlo N or --polls FILE"),
            NoTarget => write!(f, "no national target: give at least one party percentage"),
            NotFound(p) => write!(f, "file not found: {p}"),
            BadCount(s) => write!(f, "{s} must be at least 1"),
        }
    }
}
impl std::error::Error for CliError {}

/// Seed parser: decimal u64 or 0x-hex (1..=16 nybbles).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

/// Entry point used by main.rs. clap itself exits with status 2 on malformed flags.
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

pub fn validate(args: Args) -> Result<Args, CliError> {
    let mode = args.mode().ok_or(CliError::NoMode)?;
    if args.iterations == Some(0) {
        return Err(CliError::BadCount("--montecarlo"));
    }
    if args.workers == Some(0) {
        return Err(CliError::BadCount("--workers"));
    }
    if args.timeout_secs == Some(0) {
        return Err(CliError::BadCount("--timeout-secs"));
    }
    if mode != Mode::Polls && args.named_shares().values().all(|&v| v == 0.0) {
        return Err(CliError::NoTarget);
    }

    ensure_exists(&args.data, "--data")?;
    for (p, label) in [
        (args.params.as_deref(), "--params"),
        (args.regional_targets.as_deref(), "--regional-targets"),
        (args.polls.as_deref(), "--polls"),
    ] {
        if let Some(p) = p {
            ensure_exists(p, label)?;
        }
    }
    Ok(args)
}

fn ensure_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    match fs::metadata(p) {
        Ok(m) if m.is_file() => Ok(()),
        _ => Err(CliError::NotFound(format!("{label} {}", p.display()))),
    }
}
