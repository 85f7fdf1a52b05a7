use restbench_value::Value;

use super::error::{Error, Result};
use super::exchange::Hook;

/// The five ordered phases of a flow, using the stage names from the flow
/// definition format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum StageKind {
    #[strum(serialize = "before")]
    Before,

    #[strum(serialize = "beforeMain")]
    BeforeMain,

    #[strum(serialize = "main")]
    Main,

    #[strum(serialize = "afterMain")]
    AfterMain,

    #[strum(serialize = "after")]
    After,
}

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::Before,
        StageKind::BeforeMain,
        StageKind::Main,
        StageKind::AfterMain,
        StageKind::After,
    ];
}

/// A parameterized description of one HTTP request, immutable once the run
/// starts.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub method: http::Method,
    pub url: String,
    pub json: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub before_hooks: Vec<Hook>,
    pub after_hooks: Vec<Hook>,
}

impl RequestTemplate {
    pub fn new(method: http::Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            json: None,
            headers: Vec::new(),
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(http::Method::GET, url)
    }

    pub fn head(url: &str) -> Self {
        Self::new(http::Method::HEAD, url)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(http::Method::DELETE, url)
    }

    pub fn put(url: &str, json: impl Into<Value>) -> Self {
        Self::new(http::Method::PUT, url).with_json(json)
    }

    pub fn post(url: &str, json: impl Into<Value>) -> Self {
        Self::new(http::Method::POST, url).with_json(json)
    }

    #[must_use]
    pub fn with_json(mut self, json: impl Into<Value>) -> Self {
        self.json = Some(json.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_before_hook(mut self, hook: Hook) -> Self {
        self.before_hooks.push(hook);
        self
    }

    #[must_use]
    pub fn with_after_hook(mut self, hook: Hook) -> Self {
        self.after_hooks.push(hook);
        self
    }
}

/// A declarative request flow: five ordered stage lists. `main` must be
/// non-empty; the others may be empty.
#[derive(Debug, Clone, Default)]
pub struct FlowSpec {
    /// Run once, before any iteration.
    pub before: Vec<RequestTemplate>,
    /// Run once per iteration, before `main`.
    pub before_main: Vec<RequestTemplate>,
    /// The per-iteration body.
    pub main: Vec<RequestTemplate>,
    /// Run once per iteration, after `main`.
    pub after_main: Vec<RequestTemplate>,
    /// Run once, after every iteration has completed.
    pub after: Vec<RequestTemplate>,
}

impl FlowSpec {
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> &[RequestTemplate] {
        match kind {
            StageKind::Before => &self.before,
            StageKind::BeforeMain => &self.before_main,
            StageKind::Main => &self.main,
            StageKind::AfterMain => &self.after_main,
            StageKind::After => &self.after,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.main.is_empty() {
            return Err(Error::MissingMain);
        }
        Ok(())
    }
}

/// Raw run options as supplied by a caller; both fields are mandatory and
/// must be positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Total iteration count.
    pub requests: Option<u64>,
    /// Max concurrently active iterations.
    pub limit: Option<u64>,
}

impl RunOptions {
    #[must_use]
    pub fn new(requests: u64, limit: u64) -> Self {
        Self {
            requests: Some(requests),
            limit: Some(limit),
        }
    }

    pub fn validate(self) -> Result<RunConfig> {
        match (self.requests, self.limit) {
            (Some(requests), Some(limit)) if requests > 0 && limit > 0 => {
                Ok(RunConfig { requests, limit })
            }
            _ => Err(Error::InvalidRunOptions),
        }
    }
}

/// Validated run configuration.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub requests: u64,
    pub limit: u64,
}
