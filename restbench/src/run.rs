use anyhow::Context as _;

use restbench_core::HttpClient;
use restbench_core::runner::{self, RunOptions};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::{flow_file, output};

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let raw = tokio::fs::read_to_string(&args.flow)
        .await
        .with_context(|| format!("cannot read flow file: {}", args.flow.display()))?;

    let file = match flow_file::load(&args.flow, &raw) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("{err:#}");
            return Ok(ExitCode::InvalidInput);
        }
    };
    let file_options = file.options;
    let flow = match file.into_flow() {
        Ok(flow) => flow,
        Err(err) => {
            eprintln!("{err:#}");
            return Ok(ExitCode::InvalidInput);
        }
    };

    // CLI flags win over the flow file's options table.
    let options = RunOptions {
        requests: args.requests.or(file_options.requests),
        limit: args.limit.or(file_options.limit),
    };

    let mut handle = match runner::start(flow, options, HttpClient::default()) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::InvalidInput);
        }
    };

    let printer = match handle.take_failures() {
        Some(mut failures) => {
            let quiet = args.quiet_errors;
            Some(tokio::spawn(async move {
                while let Some(event) = failures.recv().await {
                    if !quiet {
                        eprintln!(
                            "iteration {} [{}]: {}",
                            event.iteration, event.stage, event.error
                        );
                    }
                }
            }))
        }
        None => None,
    };

    let result = handle.wait().await?;
    if let Some(printer) = printer {
        printer.await?;
    }

    output::formatter(args.output).print_summary(&result)?;

    if result.failed_requests_total > 0 {
        Ok(ExitCode::RequestsFailed)
    } else {
        Ok(ExitCode::Success)
    }
}
