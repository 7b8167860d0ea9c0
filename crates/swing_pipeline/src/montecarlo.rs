// crates/swing_pipeline/src/montecarlo.rs
//
// Monte Carlo runner. Workers loop: perturb the base targets, simulate, send
// the realization over a bounded channel. The orchestrator folds accepted
// realizations until it has exactly `iterations` of them, discarding divergent
// ones, and aborts if no result arrives within the result timeout.
//
// Every worker is owned by a `WorkerPool`; dropping the pool raises the stop
// flag, drops the receiver (unblocking any `send`) and joins every thread that
// finishes within the grace period. Stragglers are detached, not waited on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use swing_core::{SimParams, SimRng, SupportRatio};
use thiserror::Error;

use crate::election::{ElectionModel, Realization, Targets};
use crate::ensemble::{EnsembleAccumulator, SimulationReport};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no result within {timeout:?}: accepted {accepted} of {requested} ({discarded} discarded)")]
    Stalled {
        accepted: u64,
        requested: usize,
        discarded: u64,
        timeout: Duration,
        partial: Box<SimulationReport>,
    },
    #[error("all workers exited: accepted {accepted} of {requested}")]
    WorkersGone { accepted: u64, requested: usize, partial: Box<SimulationReport> },
    #[error("could not start worker thread: {0}")]
    Spawn(String),
}

impl RunnerError {
    /// The partial report carried by an aborted run.
    pub fn partial(&self) -> Option<&SimulationReport> {
        match self {
            RunnerError::Stalled { partial, .. } | RunnerError::WorkersGone { partial, .. } => {
                Some(partial)
            }
            RunnerError::Spawn(_) => None,
        }
    }
}

/// Snapshot passed to the progress callback after every received result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub accepted: u64,
    pub discarded: u64,
    pub requested: usize,
}

/// Execution knobs, resolved from `SimParams`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub iterations: usize,
    pub workers: usize,
    pub channel_capacity: usize,
    pub result_timeout: Duration,
    pub seed: u64,
}

impl RunOptions {
    pub fn from_params(p: &SimParams) -> Self {
        Self {
            iterations: p.iterations,
            workers: p.worker_count(),
            channel_capacity: p.channel_capacity(),
            result_timeout: p.result_timeout(),
            seed: p.seed,
        }
    }
}

// ----------------------------- Perturbation -----------------------------

/// Add U(−variation, +variation) to every positive share, clamp at 0, renormalize.
/// Zero shares stay zero.
pub fn perturb_support(base: &SupportRatio, variation: f64, rng: &mut SimRng) -> SupportRatio {
    let noisy = base.as_map().map(|_, &s| {
        if s > 0.0 {
            (s + rng.symmetric_uniform(variation)).max(0.0)
        } else {
            0.0
        }
    });
    SupportRatio::renormalize(noisy).unwrap_or(*base)
}

/// Fresh per-realization targets from the immutable base (national first, then
/// regions in name order).
pub fn perturb_targets(base: &Targets, variation: f64, rng: &mut SimRng) -> Targets {
    let national = perturb_support(&base.national, variation, rng);
    let regional = base
        .regional
        .iter()
        .map(|(k, v)| (k.clone(), perturb_support(v, variation, rng)))
        .collect();
    Targets { national, regional }
}

/// One perturbed realization; the single-election mode.
pub fn simulate_once(model: &ElectionModel, base: &Targets, seed: u64) -> Realization {
    let mut rng = SimRng::for_stream(seed, 0);
    let targets = perturb_targets(base, model.params().support_variation, &mut rng);
    model.simulate(&targets, &mut rng)
}

// ----------------------------- Orchestration -----------------------------

struct Folder<'a> {
    acc: EnsembleAccumulator,
    requested: usize,
    log_every: u64,
    progress: Option<&'a dyn Fn(&Progress)>,
}

impl<'a> Folder<'a> {
    fn new(model: &ElectionModel, requested: usize, progress: Option<&'a dyn Fn(&Progress)>) -> Self {
        Self {
            acc: EnsembleAccumulator::new(model.rules(), requested),
            requested,
            log_every: (requested / 10).max(1) as u64,
            progress,
        }
    }

    fn done(&self) -> bool {
        self.acc.accepted() >= self.requested as u64
    }

    fn take(&mut self, r: &Realization) {
        if r.too_divergent {
            self.acc.discard();
            debug!("discarded divergent realization ({} so far)", self.acc.discarded());
        } else {
            self.acc.fold(r);
            debug!("accepted {}/{}: {}", self.acc.accepted(), self.requested, r.summary);
            if self.acc.accepted() % self.log_every == 0 {
                info!(
                    "{}% complete ({} / {}, {} discarded)",
                    percent_done(self.acc.accepted(), self.requested),
                    self.acc.accepted(),
                    self.requested,
                    self.acc.discarded()
                );
            }
        }
        if let Some(cb) = self.progress {
            cb(&Progress {
                accepted: self.acc.accepted(),
                discarded: self.acc.discarded(),
                requested: self.requested,
            });
        }
    }
}

/// Whole percent of `requested`; an empty request counts as complete.
fn percent_done(accepted: u64, requested: usize) -> u64 {
    if requested == 0 {
        100
    } else {
        accepted * 100 / requested as u64
    }
}

/// Single-threaded ensemble on stream 0. Same draws as a one-worker parallel run.
pub fn run_sequential(
    model: &ElectionModel,
    base: &Targets,
    opts: &RunOptions,
    progress: Option<&dyn Fn(&Progress)>,
) -> SimulationReport {
    let variation = model.params().support_variation;
    let mut rng = SimRng::for_stream(opts.seed, 0);
    let mut folder = Folder::new(model, opts.iterations, progress);
    while !folder.done() {
        let targets = perturb_targets(base, variation, &mut rng);
        let r = model.simulate(&targets, &mut rng);
        folder.take(&r);
    }
    folder.acc.finish()
}

/// Parallel ensemble over `opts.workers` threads.
pub fn run_ensemble(
    model: Arc<ElectionModel>,
    base: Arc<Targets>,
    opts: &RunOptions,
    progress: Option<&dyn Fn(&Progress)>,
) -> Result<SimulationReport, RunnerError> {
    model.check_targets(&base);
    let variation = model.params().support_variation;
    let job_model = Arc::clone(&model);
    let job = Arc::new(move |rng: &mut SimRng| {
        let targets = perturb_targets(&base, variation, rng);
        job_model.simulate(&targets, rng)
    });

    let mut folder = Folder::new(&model, opts.iterations, progress);
    let mut failure = None;
    // The error (and its partial report) is built inside the sink, before the
    // pool starts tearing down its workers.
    let out = run_jobs(job, opts, |msg| match msg {
        Ok(r) => {
            folder.take(&r);
            folder.done()
        }
        Err(abort) => {
            failure = Some(abort.to_error(&folder.acc, opts));
            true
        }
    });
    match (out, failure) {
        (Ok(()), _) => Ok(folder.acc.finish()),
        (Err(_), Some(e)) => Err(e),
        (Err(abort), None) => Err(abort.to_error(&folder.acc, opts)),
    }
}

/// Sequential for one worker, threaded otherwise.
pub fn run_monte_carlo(
    model: &Arc<ElectionModel>,
    base: Targets,
    opts: &RunOptions,
    progress: Option<&dyn Fn(&Progress)>,
) -> Result<SimulationReport, RunnerError> {
    if opts.workers <= 1 {
        model.check_targets(&base);
        Ok(run_sequential(model, &base, opts, progress))
    } else {
        run_ensemble(Arc::clone(model), Arc::new(base), opts, progress)
    }
}

#[derive(Debug)]
enum Abort {
    Timeout,
    Disconnected,
    Spawn(String),
}

impl Abort {
    fn to_error(&self, acc: &EnsembleAccumulator, opts: &RunOptions) -> RunnerError {
        let partial = Box::new(acc.finish());
        match self {
            Abort::Timeout => {
                warn!("run stalled after {} accepted realizations", acc.accepted());
                RunnerError::Stalled {
                    accepted: acc.accepted(),
                    requested: opts.iterations,
                    discarded: acc.discarded(),
                    timeout: opts.result_timeout,
                    partial,
                }
            }
            Abort::Disconnected => RunnerError::WorkersGone {
                accepted: acc.accepted(),
                requested: opts.iterations,
                partial,
            },
            Abort::Spawn(e) => RunnerError::Spawn(e.clone()),
        }
    }
}

/// Generic worker loop: each worker calls `job` with its own RNG stream until
/// stopped. `sink` sees every result and returns `true` when it has enough; on
/// an abort it sees the reason once, while the workers are still running.
fn run_jobs<T, F, S>(job: Arc<F>, opts: &RunOptions, mut sink: S) -> Result<(), Abort>
where
    T: Send + 'static,
    F: Fn(&mut SimRng) -> T + Send + Sync + 'static,
    S: FnMut(Result<T, &Abort>) -> bool,
{
    let pool = match WorkerPool::spawn(job, opts) {
        Ok(p) => p,
        Err(abort) => {
            sink(Err(&abort));
            return Err(abort);
        }
    };
    loop {
        let abort = match pool.recv_timeout(opts.result_timeout) {
            Ok(r) => {
                if sink(Ok(r)) {
                    return Ok(());
                }
                continue;
            }
            Err(RecvTimeoutError::Timeout) => Abort::Timeout,
            Err(RecvTimeoutError::Disconnected) => Abort::Disconnected,
        };
        sink(Err(&abort));
        return Err(abort);
    }
}

struct WorkerPool<T> {
    stop: Arc<AtomicBool>,
    rx: Option<Receiver<T>>,
    handles: Vec<JoinHandle<()>>,
    /// How long teardown waits for busy workers before detaching them.
    grace: Duration,
}

impl<T: Send + 'static> WorkerPool<T> {
    fn spawn<F>(job: Arc<F>, opts: &RunOptions) -> Result<Self, Abort>
    where
        F: Fn(&mut SimRng) -> T + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(opts.channel_capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));
        let mut pool = WorkerPool {
            stop: Arc::clone(&stop),
            rx: Some(rx),
            handles: Vec::new(),
            grace: opts.result_timeout,
        };

        for id in 0..opts.workers.max(1) {
            let tx = tx.clone();
            let stop = Arc::clone(&stop);
            let job = Arc::clone(&job);
            let seed = opts.seed;
            let handle = thread::Builder::new()
                .name(format!("swing-worker-{id}"))
                .spawn(move || {
                    let mut rng = SimRng::for_stream(seed, id as u64);
                    while !stop.load(Ordering::Relaxed) {
                        let r = job(&mut rng);
                        if tx.send(r).is_err() {
                            break;
                        }
                    }
                })
                // `pool` drops here on error and joins what already started.
                .map_err(|e| Abort::Spawn(e.to_string()))?;
            pool.handles.push(handle);
        }
        debug!("started {} workers", pool.handles.len());
        Ok(pool)
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        match &self.rx {
            Some(rx) => rx.recv_timeout(timeout),
            None => Err(RecvTimeoutError::Disconnected),
        }
    }
}

impl<T> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        drop(self.rx.take());

        // A worker mid-realization sees the flag (or a failed send) once it
        // finishes; one that never finishes is detached after `grace`.
        let deadline = Instant::now() + self.grace;
        loop {
            let (done, busy): (Vec<_>, Vec<_>) =
                self.handles.drain(..).partition(|h| h.is_finished());
            for h in done {
                if h.join().is_err() {
                    warn!("worker panicked");
                }
            }
            self.handles = busy;
            if self.handles.is_empty() {
                return;
            }
            if Instant::now() >= deadline {
                warn!(
                    "{} worker(s) still busy {:?} after stop; detaching",
                    self.handles.len(),
                    self.grace
                );
                self.handles.clear();
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}
