//! runner/pipeline.rs
//! Pure pipeline wiring (no cipher logic).
//!
//! Roles, one thread each:
//! - generator: fills the bounded batch queue
//! - workers: verify batches, count attempts, publish on match
//! - sampler: periodic `StatsSnapshot`s, latest-wins
//! - supervisor: joins everyone and runs the shutdown sequence

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam::channel::{bounded, select, tick, Receiver, Sender, TrySendError};
use log::{debug, info, warn};

use crate::config::{BackendKind, CrackConfig, FoundCallback};
use crate::constants::STATS_CHANNEL_CAPACITY;
use crate::generator::{Batch, CandidateGenerator};
use crate::runner::cancel::CancelToken;
use crate::runner::parallelism::ParallelismProfile;
use crate::runner::publisher::{CrackResult, ResultPublisher};
use crate::telemetry::{StatsSnapshot, WorkerCounters};
use crate::types::CrackError;
use crate::verifier::{make_backend, start_first_worker, BatchVerifier, VerifierBackend};

/// Configured but not yet started run.
pub struct Runner {
    config: CrackConfig,
    archive: Bytes,
    backend: Option<Arc<dyn VerifierBackend>>,
}

impl Runner {
    pub fn new(config: CrackConfig, archive: impl Into<Bytes>) -> Self {
        Self { config, archive: archive.into(), backend: None }
    }

    /// Bypass backend selection; the given backend is used as is.
    pub fn with_backend(config: CrackConfig, archive: impl Into<Bytes>, backend: Arc<dyn VerifierBackend>) -> Self {
        Self { config, archive: archive.into(), backend: Some(backend) }
    }

    /// Validate, build the first worker, then spawn every role.
    /// Archive errors surface here, before any thread exists.
    pub fn start(self) -> Result<RunHandle, CrackError> {
        let config = self.config.normalized();
        config.validate()?;
        debug!("[PIPELINE] config: {config:?}");

        let backend = match self.backend {
            Some(b) => b,
            None => make_backend(&config),
        };
        let (backend, first_worker) = start_first_worker(backend, &self.archive)?;
        let backend_kind = backend.kind();

        let profile = ParallelismProfile::from_config(&config);
        let counters = Arc::new(WorkerCounters::new(profile.workers));
        let cancel = CancelToken::new();
        let (publisher, result_rx) = ResultPublisher::new();
        let publisher = Arc::new(publisher);
        let started = Instant::now();

        // ---- Channels ----
        let (batch_tx, batch_rx) = bounded::<Batch>(profile.queue_capacity);
        let (stats_tx, stats_rx) = bounded::<StatsSnapshot>(STATS_CHANNEL_CAPACITY);

        info!(
            "[PIPELINE] start: backend={backend_kind}, workers={}, batch={}, lengths={}..={}",
            profile.workers, config.batch_size, config.min_len, config.max_len
        );

        let spawned = Spawned::spawn_all(SpawnArgs {
            config: &config,
            archive: self.archive,
            backend,
            first_worker,
            profile,
            counters: counters.clone(),
            cancel: cancel.clone(),
            publisher: publisher.clone(),
            batch_tx,
            batch_rx,
            stats_tx,
            stats_rx: stats_rx.clone(),
            started,
        });
        let spawned = match spawned {
            Ok(s) => s,
            Err(e) => {
                cancel.cancel();
                return Err(e);
            }
        };

        let supervisor = {
            let token = cancel.clone();
            let publisher = publisher.clone();
            let counters = counters.clone();
            thread::Builder::new()
                .name("zipcrack-supervisor".into())
                .spawn(move || spawned.shutdown(&token, &publisher, &counters))
                .map_err(|e| {
                    cancel.cancel();
                    CrackError::Pipeline(format!("spawn supervisor: {e}"))
                })?
        };

        Ok(RunHandle {
            stats: stats_rx,
            results: result_rx,
            cancel,
            publisher,
            counters,
            started,
            backend: backend_kind,
            supervisor: Some(supervisor),
        })
    }
}

// ============================================================
// Roles
// ============================================================

struct SpawnArgs<'a> {
    config: &'a CrackConfig,
    archive: Bytes,
    backend: Arc<dyn VerifierBackend>,
    first_worker: Box<dyn BatchVerifier>,
    profile: ParallelismProfile,
    counters: Arc<WorkerCounters>,
    cancel: CancelToken,
    publisher: Arc<ResultPublisher>,
    batch_tx: Sender<Batch>,
    batch_rx: Receiver<Batch>,
    stats_tx: Sender<StatsSnapshot>,
    stats_rx: Receiver<StatsSnapshot>,
    started: Instant,
}

struct Spawned {
    generator: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    sampler: JoinHandle<()>,
}

fn spawn_named<F>(name: String, f: F) -> Result<JoinHandle<()>, CrackError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|e| CrackError::Pipeline(format!("spawn {name}: {e}")))
}

impl Spawned {
    fn spawn_all(args: SpawnArgs<'_>) -> Result<Self, CrackError> {
        let SpawnArgs {
            config,
            archive,
            backend,
            first_worker,
            profile,
            counters,
            cancel,
            publisher,
            batch_tx,
            batch_rx,
            stats_tx,
            stats_rx,
            started,
        } = args;

        // ---- Workers ----
        let mut workers = Vec::with_capacity(profile.workers);
        let mut first_worker = Some(first_worker);
        for id in 0..profile.workers {
            let ctx = WorkerCtx {
                id,
                rx: batch_rx.clone(),
                counters: counters.clone(),
                cancel: cancel.clone(),
                publisher: publisher.clone(),
                on_found: config.on_found.clone(),
            };
            let prebuilt = first_worker.take();
            let backend = backend.clone();
            let archive = archive.clone();
            workers.push(spawn_named(format!("zipcrack-worker-{id}"), move || {
                let verifier = match prebuilt {
                    Some(v) => v,
                    None => match backend.new_worker(&archive) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("[WORKER-{id}] failed to start: {e}");
                            return;
                        }
                    },
                };
                run_worker(ctx, verifier);
            })?);
        }
        // Workers hold the only receivers: if all exit, the generator's send fails.
        drop(batch_rx);

        // ---- Generator ----
        let seed = CandidateGenerator::run_seed(profile.workers, config.alphabet.len());
        let generator = CandidateGenerator::new(
            &config.alphabet,
            config.min_len,
            config.max_len,
            config.batch_size,
            seed,
        );
        let generator = {
            let counters = counters.clone();
            let cancel = cancel.clone();
            spawn_named("zipcrack-generator".into(), move || {
                run_generator(generator, batch_tx, &counters, &cancel)
            })?
        };

        // ---- Sampler ----
        let interval = config.report_interval();
        let sampler = spawn_named("zipcrack-stats".into(), move || {
            run_sampler(interval, stats_tx, stats_rx, &counters, &cancel, started)
        })?;

        Ok(Self { generator, workers, sampler })
    }

    /// Join order: producers, then sampler (closes stats), then the final
    /// not-found publication (no-op after a match), then close results.
    fn shutdown(self, cancel: &CancelToken, publisher: &ResultPublisher, counters: &WorkerCounters) {
        if self.generator.join().is_err() {
            warn!("[PIPELINE] generator panicked");
        }
        for (id, w) in self.workers.into_iter().enumerate() {
            if w.join().is_err() {
                warn!("[WORKER-{id}] panicked");
            }
        }
        debug!("[PIPELINE] producers drained");

        cancel.cancel();
        if self.sampler.join().is_err() {
            warn!("[STATS] sampler panicked");
        }

        publisher.publish(CrackResult::not_found());
        publisher.close();

        let found = publisher.result().is_some_and(|r| r.found);
        info!("[PIPELINE] finished: found={found}, attempts={}", counters.total());
    }
}

fn run_generator(
    mut generator: CandidateGenerator,
    tx: Sender<Batch>,
    counters: &WorkerCounters,
    cancel: &CancelToken,
) {
    debug!("[GENERATOR] starting");
    while !cancel.is_cancelled() {
        let batch = generator.next_batch();
        select! {
            send(tx, batch) -> res => match res {
                Ok(()) => counters.record_sent(),
                Err(_) => {
                    debug!("[GENERATOR] no workers left");
                    break;
                }
            },
            recv(cancel.receiver()) -> _ => break,
        }
    }
    debug!("[GENERATOR] exiting");
}

struct WorkerCtx {
    id: usize,
    rx: Receiver<Batch>,
    counters: Arc<WorkerCounters>,
    cancel: CancelToken,
    publisher: Arc<ResultPublisher>,
    on_found: Option<FoundCallback>,
}

fn run_worker(ctx: WorkerCtx, mut verifier: Box<dyn BatchVerifier>) {
    let id = ctx.id;
    debug!("[WORKER-{id}] starting");
    loop {
        select! {
            recv(ctx.rx) -> msg => match msg {
                Ok(batch) => {
                    if !verify_batch(&ctx, verifier.as_mut(), batch) {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(ctx.cancel.receiver()) -> _ => break,
        }
    }
    verifier.close();
    debug!("[WORKER-{id}] exiting");
}

/// Returns `false` once the worker should stop.
fn verify_batch(ctx: &WorkerCtx, verifier: &mut dyn BatchVerifier, batch: Batch) -> bool {
    ctx.counters.record_taken();
    if ctx.cancel.is_cancelled() {
        return false;
    }

    let outcome = verifier.batch_verify(&batch.candidates);
    ctx.counters.add_attempts(ctx.id, outcome.attempts as u64);

    let Some(password) = outcome.match_index.and_then(|i| batch.candidates.get(i)) else {
        return true;
    };
    if ctx.publisher.publish(CrackResult::found(password.as_str())) {
        info!("[WORKER-{}] password found in batch {}", ctx.id, batch.index);
        if let Some(cb) = &ctx.on_found {
            cb(password.as_str());
        }
    }
    ctx.cancel.cancel();
    false
}

fn run_sampler(
    interval: Duration,
    tx: Sender<StatsSnapshot>,
    evict: Receiver<StatsSnapshot>,
    counters: &WorkerCounters,
    cancel: &CancelToken,
    started: Instant,
) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(ticker) -> _ => deliver_latest(&tx, &evict, StatsSnapshot::capture(counters, started)),
            recv(cancel.receiver()) -> _ => break,
        }
    }
    debug!("[STATS] sampler exiting");
}

/// Never blocks: a full channel loses its oldest snapshot.
fn deliver_latest(tx: &Sender<StatsSnapshot>, evict: &Receiver<StatsSnapshot>, snapshot: StatsSnapshot) {
    match tx.try_send(snapshot) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(snapshot)) => {
            let _ = evict.try_recv();
            let _ = tx.try_send(snapshot);
        }
    }
}

// ============================================================
// Handle
// ============================================================

/// Live run. Dropping it cancels the run without waiting.
pub struct RunHandle {
    stats: Receiver<StatsSnapshot>,
    results: Receiver<CrackResult>,
    cancel: CancelToken,
    publisher: Arc<ResultPublisher>,
    counters: Arc<WorkerCounters>,
    started: Instant,
    backend: BackendKind,
    supervisor: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Periodic snapshots; closes when the run ends.
    pub fn stats(&self) -> &Receiver<StatsSnapshot> {
        &self.stats
    }

    /// Exactly one value, then closes.
    pub fn results(&self) -> &Receiver<CrackResult> {
        &self.results
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Backend actually running, after any fallback.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn result(&self) -> Option<CrackResult> {
        self.publisher.result()
    }

    /// On-demand sample, independent of the periodic stream.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::capture(&self.counters, self.started)
    }

    pub fn is_finished(&self) -> bool {
        self.supervisor.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Block until the pipeline has fully shut down.
    pub fn wait(mut self) -> CrackResult {
        if let Some(h) = self.supervisor.take() {
            if h.join().is_err() {
                warn!("[PIPELINE] supervisor panicked");
            }
        }
        self.publisher.result().unwrap_or_else(CrackResult::not_found)
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if self.supervisor.is_some() {
            self.cancel.cancel();
        }
    }
}
