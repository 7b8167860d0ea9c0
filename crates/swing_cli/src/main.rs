// crates/swing_cli/src/main.rs
//
// load → overrides → model → run (single / Monte Carlo / polls) → render → write.
// Exit codes: 0 ok, 2 validation, 3 run aborted, 4 I/O.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const RUN_ABORTED: i32 = 3;
    pub const IO: i32 = 4;
}

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};

use args::{parse_and_validate as parse_cli, Args, Mode, Render};
use swing_core::{SimParams, SwingMode};
use swing_io::hasher::sha256_canonical;
use swing_io::prelude::*;
use swing_pipeline::{
    run_monte_carlo, run_poll_series, simulate_once, ElectionModel, PipelineError, Progress,
    RunOptions, RunnerError, Targets,
};
use swing_report::{
    build_election, build_ensemble, build_poll_series, render_text, to_json_string, ReportModel,
    RunMode, RunRecord,
};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Bad input data, parameters or targets.
    Validation(String),
    /// Run stalled or lost its workers.
    Aborted(String),
    /// Read/write/path failures.
    Io(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Aborted(m) | MainError::Io(m) => f.write_str(m),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("swingometer: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_logging(&args);

    let rc = match run(&args) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("swingometer: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Aborted(_) => RUN_ABORTED,
        MainError::Io(_) => IO,
    }
}

fn map_io_err(e: IoError) -> MainError {
    match e {
        IoError::Path(m) => MainError::Io(format!("path: {m}")),
        IoError::Limit(m) => MainError::Io(format!("limit: {m}")),
        IoError::Json { pointer, msg } => MainError::Validation(format!("json {pointer}: {msg}")),
        IoError::Core(c) => MainError::Validation(c.to_string()),
        IoError::Invalid(m) => MainError::Validation(m),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Io(io) => map_io_err(io),
        PipelineError::Core(c) => MainError::Validation(c.to_string()),
        PipelineError::Setup(m) => MainError::Validation(m),
        PipelineError::Run(r) => MainError::Aborted(r.to_string()),
    }
}

fn run(args: &Args) -> Result<(), MainError> {
    let started = Instant::now();

    // 1) Parameters + flag overrides
    let mut params = match &args.params {
        Some(p) => load_params(p).map_err(map_io_err)?,
        None => SimParams::default(),
    };
    apply_overrides(&mut params, args);
    params
        .validate_domains()
        .map_err(|e| MainError::Validation(e.to_string()))?;
    let params_sha256 = sha256_canonical(&params).map_err(map_io_err)?;

    // 2) Inputs
    let loaded = load_dataset(&args.data).map_err(map_io_err)?;
    let mut targets = Targets::national(
        target_from_percentages(&args.named_shares()).map_err(map_io_err)?,
    );
    if let Some(p) = &args.regional_targets {
        targets.regional = load_regional_targets(p).map_err(map_io_err)?;
    }

    // 3) Model
    let model = Arc::new(ElectionModel::new(&loaded.dataset, params.clone()).map_err(map_pipeline_err)?);
    let opts = RunOptions::from_params(&params);
    let mode = args.mode().ok_or_else(|| MainError::Validation("no mode".into()))?;
    let record = |m: RunMode| RunRecord::new(m, &params, &loaded.sha256, &params_sha256);

    // 4) Run
    let report = match mode {
        Mode::Single => {
            model.check_targets(&targets);
            let r = simulate_once(&model, &targets, params.seed);
            if r.too_divergent {
                warn!("simulated national share is outside the result tolerance");
            }
            build_election(record(RunMode::SingleElection), &r)
        }
        Mode::MonteCarlo => {
            let bar = ProgressUi::new(opts.iterations as u64, args.quiet);
            let cb = |p: &Progress| bar.update(p);
            let out = run_monte_carlo(&model, targets, &opts, Some(&cb));
            bar.finish();
            match out {
                Ok(rep) => build_ensemble(record(RunMode::MonteCarlo), &rep),
                Err(e) => return Err(aborted(args, record(RunMode::MonteCarlo), e)),
            }
        }
        Mode::Polls => {
            let path = args.polls.as_deref().ok_or_else(|| MainError::Validation("no polls".into()))?;
            let polls = load_polls(path).map_err(map_io_err)?;
            info!("{} polls loaded", polls.len());
            let bar = ProgressUi::new(opts.iterations as u64, args.quiet);
            let cb = |p: &Progress| bar.update(p);
            let out = run_poll_series(&model, polls, &opts, Some(&cb));
            bar.finish();
            let series = out.map_err(map_pipeline_err)?;
            build_poll_series(record(RunMode::PollSeries), &series)
        }
    }
    .map_err(|e| MainError::Io(e.to_string()))?;

    // 5) Output
    emit(args, &report)?;
    info!("done in {:.2?}", started.elapsed());
    Ok(())
}

fn apply_overrides(params: &mut SimParams, args: &Args) {
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if let Some(n) = args.iterations {
        params.iterations = n;
    }
    if let Some(w) = args.workers {
        params.workers = Some(w);
    }
    if let Some(t) = args.timeout_secs {
        params.result_timeout_secs = t;
    }
    if args.regional {
        params.swing_mode = SwingMode::Regional;
    }
}

/// Print the partial report (if any) before failing with exit code 3.
fn aborted(args: &Args, run: RunRecord, e: RunnerError) -> MainError {
    if let Some(partial) = e.partial() {
        match build_ensemble(run, partial) {
            Ok(model) => {
                eprintln!("partial result ({} of {} accepted):", partial.accepted, partial.requested);
                eprint!("{}", render_text(&model));
                if let Some(out) = &args.out {
                    if let Err(w) = write_report(out, &model) {
                        warn!("could not write partial report: {w}");
                    }
                }
            }
            Err(r) => warn!("could not render partial report: {r}"),
        }
    }
    MainError::Aborted(e.to_string())
}

fn emit(args: &Args, report: &ReportModel) -> Result<(), MainError> {
    match args.render {
        Render::Text => print!("{}", render_text(report)),
        Render::Json => print!("{}", to_json_string(report).map_err(|e| MainError::Io(e.to_string()))?),
    }
    if let Some(out) = &args.out {
        write_report(out, report)?;
        if !args.quiet {
            eprintln!("report written to {}", out.display());
        }
    }
    Ok(())
}

fn write_report(path: &Path, report: &ReportModel) -> Result<(), MainError> {
    let text = to_json_string(report).map_err(|e| MainError::Io(e.to_string()))?;
    write_atomic(path, text.as_bytes()).map_err(map_io_err)
}

// ----------------------------- Progress UI -----------------------------

#[cfg(feature = "progress")]
struct ProgressUi(Option<indicatif::ProgressBar>);

#[cfg(feature = "progress")]
impl ProgressUi {
    fn new(len: u64, quiet: bool) -> Self {
        if quiet {
            return Self(None);
        }
        let bar = indicatif::ProgressBar::new(len);
        if let Ok(style) =
            indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} accepted, {msg}")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(200));
        Self(Some(bar))
    }

    fn update(&self, p: &Progress) {
        if let Some(bar) = &self.0 {
            bar.set_position(p.accepted);
            bar.set_message(format!("{} discarded", p.discarded));
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.0 {
            bar.finish_and_clear();
        }
    }
}

/// Without the `progress` feature, progress goes to the debug log only.
#[cfg(not(feature = "progress"))]
struct ProgressUi {
    last: std::cell::Cell<Instant>,
}

#[cfg(not(feature = "progress"))]
impl ProgressUi {
    fn new(_len: u64, _quiet: bool) -> Self {
        Self { last: std::cell::Cell::new(Instant::now()) }
    }

    fn update(&self, p: &Progress) {
        if self.last.get().elapsed() >= Duration::from_secs(5) {
            self.last.set(Instant::now());
            log::debug!("{} / {} accepted ({} discarded)", p.accepted, p.requested, p.discarded);
        }
    }

    fn finish(&self) {}
}
