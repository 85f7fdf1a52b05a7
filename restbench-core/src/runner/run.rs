use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::http::Transport;

use super::config::{FlowSpec, RunConfig, RunOptions, StageKind};
use super::error::Result;
use super::exchange::IterationContext;
use super::gate::IterationGate;
use super::report::{Reporter, RunHandle};
use super::stage::run_stage;
use super::stats::{RunResult, RunStats};

/// Start a benchmark run. Validation happens synchronously, before any
/// request is issued; the run itself executes on spawned tasks.
///
/// Must be called from within a Tokio runtime.
pub fn start<T: Transport>(flow: FlowSpec, options: RunOptions, transport: T) -> Result<RunHandle> {
    let cfg = options.validate()?;
    flow.validate()?;

    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = Reporter::new(tx);

    let task = tokio::spawn(drive(Arc::new(flow), cfg, Arc::new(transport), reporter));

    Ok(RunHandle::new(rx, task))
}

async fn drive<T: Transport>(
    flow: Arc<FlowSpec>,
    cfg: RunConfig,
    transport: Arc<T>,
    reporter: Reporter,
) -> Result<RunResult> {
    let stats = Arc::new(RunStats::default());
    let started = Instant::now();

    // One-time setup, with an ephemeral context scoped to this stage run.
    run_stage(
        transport.as_ref(),
        &flow.before,
        StageKind::Before,
        0,
        IterationContext::new(),
        &stats,
        &reporter,
    )
    .await;

    // A fixed pool of `limit` workers pulls iteration indices from the gate,
    // so concurrency stays at min(limit, remaining) throughout and a new
    // iteration starts the moment a slot frees up. With limit == 1 this
    // degenerates to strict index order.
    let gate = Arc::new(IterationGate::new(cfg.requests));
    let workers = cfg.limit.min(cfg.requests);

    let mut handles = Vec::with_capacity(workers as usize);
    for _ in 0..workers {
        let flow = flow.clone();
        let transport = transport.clone();
        let stats = stats.clone();
        let reporter = reporter.clone();
        let gate = gate.clone();

        handles.push(tokio::spawn(async move {
            while let Some(iteration) = gate.next() {
                let ctx = IterationContext::new();
                let ctx = run_stage(
                    transport.as_ref(),
                    &flow.before_main,
                    StageKind::BeforeMain,
                    iteration,
                    ctx,
                    &stats,
                    &reporter,
                )
                .await;
                let ctx = run_stage(
                    transport.as_ref(),
                    &flow.main,
                    StageKind::Main,
                    iteration,
                    ctx,
                    &stats,
                    &reporter,
                )
                .await;
                // Context is discarded when the iteration completes.
                let _ = run_stage(
                    transport.as_ref(),
                    &flow.after_main,
                    StageKind::AfterMain,
                    iteration,
                    ctx,
                    &stats,
                    &reporter,
                )
                .await;
            }
        }));
    }

    for handle in handles {
        handle.await?;
    }

    // One-time teardown, again with an ephemeral context.
    run_stage(
        transport.as_ref(),
        &flow.after,
        StageKind::After,
        0,
        IterationContext::new(),
        &stats,
        &reporter,
    )
    .await;

    Ok(stats.summarize(started.elapsed()))
}
