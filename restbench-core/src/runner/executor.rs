use bytes::Bytes;
use restbench_value::Value;
use std::time::Instant;

use crate::http::{HttpRequest, Transport};
use crate::token;

use super::config::{RequestTemplate, StageKind};
use super::exchange::{Exchange, IterationContext, Outcome, RequestParts, apply_chain};
use super::report::{FailureEvent, Reporter};
use super::stats::RunStats;

/// Success range: 2xx and 3xx. Anything else counts as a failed request.
fn is_success_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Run one request template through the full per-request pipeline:
/// tokenize, pre-hooks, dispatch, post-hooks, record, classify.
///
/// Failures are reported and counted but never propagated; the iteration
/// continues with its remaining requests.
pub(crate) async fn execute_request<T: Transport>(
    transport: &T,
    template: &RequestTemplate,
    stage: StageKind,
    iteration: u64,
    ctx: IterationContext,
    stats: &RunStats,
    reporter: &Reporter,
) -> IterationContext {
    let request = RequestParts {
        method: template.method.clone(),
        url: token::substitute_str(&template.url, iteration),
        headers: token::substitute_headers(&template.headers, iteration),
        json: template
            .json
            .as_ref()
            .map(|v| token::substitute_value(v, iteration)),
    };

    let exchange = Exchange {
        iteration,
        request,
        outcome: None,
        ctx,
    };

    let mut exchange = apply_chain(&template.before_hooks, exchange);

    if exchange.request.json.is_some() && exchange.request.header("content-type").is_none() {
        exchange.request.set_header("Content-Type", "application/json");
    }

    let body = exchange
        .request
        .json
        .as_ref()
        .map_or_else(Bytes::new, |v| Bytes::from(v.to_json_bytes()));

    let req = HttpRequest {
        method: exchange.request.method.clone(),
        url: exchange.request.url.clone(),
        headers: exchange.request.headers.clone(),
        body,
    };
    let method = exchange.request.method.clone();
    let url = exchange.request.url.clone();

    let started = Instant::now();
    let dispatched = transport.execute(req).await;
    let elapsed = started.elapsed();

    let (outcome, failure) = match dispatched {
        Ok(res) => {
            let failure = if is_success_status(res.status) {
                None
            } else {
                Some(format!(
                    "request failed with status {}: {method} {url}",
                    res.status
                ))
            };
            let json = serde_json::from_slice::<serde_json::Value>(&res.body)
                .ok()
                .map(Value::from);
            (
                Outcome::Response {
                    status: res.status,
                    body: res.body,
                    json,
                },
                failure,
            )
        }
        Err(err) => {
            let error = format!("transport error: {err}: {method} {url}");
            (
                Outcome::Failed {
                    error: error.clone(),
                },
                Some(error),
            )
        }
    };

    exchange.outcome = Some(outcome);
    let exchange = apply_chain(&template.after_hooks, exchange);

    stats.record_request(stage, elapsed);

    if let Some(error) = failure {
        stats.record_failure();
        reporter.failure(FailureEvent {
            iteration,
            stage,
            error,
        });
    }

    exchange.ctx
}
