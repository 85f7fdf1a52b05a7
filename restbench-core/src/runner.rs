mod config;
mod error;
mod exchange;
mod executor;
mod gate;
pub mod hooks;
mod report;
mod run;
mod stage;
mod stats;

pub use config::{FlowSpec, RequestTemplate, RunConfig, RunOptions, StageKind};
pub use error::{Error, Result};
pub use exchange::{Exchange, Hook, IterationContext, Outcome, RequestParts, apply_chain};
pub use gate::IterationGate;
pub use report::{FailureEvent, RunHandle};
pub use run::start;
pub use stats::{RunResult, RunStats, StageStats, StatsBucket};
