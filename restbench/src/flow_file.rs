use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use restbench_core::Value;
use restbench_core::runner::{FlowSpec, RequestTemplate, hooks};

/// On-disk flow definition: five stage lists plus optional run options,
/// using the camelCase field names of the flow format.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlowFile {
    #[serde(default)]
    pub options: OptionsSpec,

    #[serde(default)]
    pub before: Vec<OperationSpec>,
    #[serde(default)]
    pub before_main: Vec<OperationSpec>,
    #[serde(default)]
    pub main: Vec<OperationSpec>,
    #[serde(default)]
    pub after_main: Vec<OperationSpec>,
    #[serde(default)]
    pub after: Vec<OperationSpec>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionsSpec {
    pub requests: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationSpec {
    pub method: String,
    pub url: String,

    #[serde(default)]
    pub json: Option<serde_json::Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub before_hooks: Vec<String>,
    #[serde(default)]
    pub after_hooks: Vec<String>,
}

pub fn load(path: &Path, raw: &str) -> anyhow::Result<FlowFile> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match ext {
        "json" => serde_json::from_str(raw)
            .with_context(|| format!("invalid JSON flow file: {}", path.display())),
        "yaml" | "yml" => serde_yaml::from_str(raw)
            .with_context(|| format!("invalid YAML flow file: {}", path.display())),
        other => anyhow::bail!(
            "unsupported flow file extension `{other}` (expected .yaml, .yml or .json): {}",
            path.display()
        ),
    }
}

fn parse_method(method: &str) -> anyhow::Result<http::Method> {
    let upper = method.to_ascii_uppercase();
    // `del` is the flow-format shorthand for DELETE.
    let name = if upper == "DEL" { "DELETE" } else { &upper };
    http::Method::from_bytes(name.as_bytes())
        .map_err(|_| anyhow::anyhow!("invalid HTTP method `{method}` in flow file"))
}

fn build_template(op: OperationSpec) -> anyhow::Result<RequestTemplate> {
    let mut template = RequestTemplate::new(parse_method(&op.method)?, &op.url);

    if let Some(json) = op.json {
        template = template.with_json(Value::from(json));
    }
    for (name, value) in &op.headers {
        template = template.with_header(name, value);
    }
    for name in &op.before_hooks {
        template = template.with_before_hook(hooks::resolve(name)?);
    }
    for name in &op.after_hooks {
        template = template.with_after_hook(hooks::resolve(name)?);
    }

    Ok(template)
}

fn build_stage(ops: Vec<OperationSpec>) -> anyhow::Result<Vec<RequestTemplate>> {
    ops.into_iter().map(build_template).collect()
}

impl FlowFile {
    pub fn into_flow(self) -> anyhow::Result<FlowSpec> {
        Ok(FlowSpec {
            before: build_stage(self.before)?,
            before_main: build_stage(self.before_main)?,
            main: build_stage(self.main)?,
            after_main: build_stage(self.after_main)?,
            after: build_stage(self.after)?,
        })
    }
}
