use crate::http::Transport;

use super::config::{RequestTemplate, StageKind};
use super::exchange::IterationContext;
use super::executor::execute_request;
use super::report::Reporter;
use super::stats::RunStats;

/// Execute one stage invocation: every template strictly in list order,
/// never overlapping, threading one context across them. Returns once the
/// last request has completed (success or failure).
pub(crate) async fn run_stage<T: Transport>(
    transport: &T,
    templates: &[RequestTemplate],
    kind: StageKind,
    iteration: u64,
    mut ctx: IterationContext,
    stats: &RunStats,
    reporter: &Reporter,
) -> IterationContext {
    for template in templates {
        ctx = execute_request(transport, template, kind, iteration, ctx, stats, reporter).await;
    }
    ctx
}
