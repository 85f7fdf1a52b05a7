use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

use restbench_core::runner::{RunResult, StageStats};

use crate::cli::OutputFormat;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_summary(&self, result: &RunResult) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(HumanReadableOutput),
        OutputFormat::Json => Box::new(JsonOutput),
    }
}

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_summary(&self, result: &RunResult) -> anyhow::Result<()> {
        println!("{}", render_human(result));
        Ok(())
    }
}

fn format_ms(ms: Option<f64>) -> String {
    ms.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}ms"))
}

fn render_human(result: &RunResult) -> String {
    let mut out = String::new();

    out.push_str("summary\n");
    let elapsed = Duration::from_millis(result.total_elapsed.as_millis() as u64);
    writeln!(
        &mut out,
        "  total elapsed: {}",
        humantime::format_duration(elapsed)
    )
    .ok();
    writeln!(
        &mut out,
        "  failed requests: {}",
        result.failed_requests_total
    )
    .ok();

    for (kind, stats) in result.stages() {
        if stats.meter.count == 0 {
            continue;
        }

        writeln!(&mut out, "\nstage: {kind}").ok();
        writeln!(
            &mut out,
            "  requests: {} ({:.2}/s)",
            stats.meter.count, stats.meter.mean_rate
        )
        .ok();
        writeln!(
            &mut out,
            "  latency = min={} mean={} max={} p95={} sum={}",
            format_ms(stats.histogram.min_ms),
            format_ms(stats.histogram.mean_ms),
            format_ms(stats.histogram.max_ms),
            format_ms(stats.histogram.p95_ms),
            format_ms(stats.histogram.sum_ms),
        )
        .ok();
    }

    out
}

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_summary(&self, result: &RunResult) -> anyhow::Result<()> {
        let line = build_summary_line(result);
        println!("{}", serde_json::to_string(&line)?);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub total_elapsed_ms: u64,
    pub failed_requests_total: u64,
    pub stages: BTreeMap<String, JsonStageStats>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonStageStats {
    pub meter: JsonMeter,
    pub histogram: JsonHistogram,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonMeter {
    pub count: u64,
    pub mean: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonHistogram {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub sum: Option<f64>,
    pub p95: Option<f64>,
}

fn json_stage(stats: &StageStats) -> JsonStageStats {
    JsonStageStats {
        meter: JsonMeter {
            count: stats.meter.count,
            mean: stats.meter.mean_rate,
        },
        histogram: JsonHistogram {
            min: stats.histogram.min_ms,
            max: stats.histogram.max_ms,
            mean: stats.histogram.mean_ms,
            sum: stats.histogram.sum_ms,
            p95: stats.histogram.p95_ms,
        },
    }
}

fn build_summary_line(result: &RunResult) -> JsonSummaryLine {
    let stages = result
        .stages()
        .filter(|(_, stats)| stats.meter.count > 0)
        .map(|(kind, stats)| (kind.to_string(), json_stage(stats)))
        .collect();

    JsonSummaryLine {
        kind: "summary",
        total_elapsed_ms: result.total_elapsed.as_millis() as u64,
        failed_requests_total: result.failed_requests_total,
        stages,
    }
}
