use std::path::Path;

use indexmap::IndexMap;
use schemaforge_core::{
    FkGraphReport, Relationship, Schema, build_fk_graph_report, constraints_to_relationships,
    schema_fingerprint, validate_schema,
};
use schemaforge_deparse::{
    DeparseResult, postgres_operations_deparser, postgres_schema_deparser, yaml_schema_deparser,
};
use schemaforge_diff::{build_schema_diff, compare};
use schemaforge_operation::{Operation, ValidationReport, apply_to_schema, validate_operations};
use schemaforge_parse::{SupportedFormat, detect_format, process};
use serde::Serialize;
use serde_json::Value;

use crate::config::{CliConfig, DeparseTarget, OutputFormat};
use crate::{CliError, CliResult};

/// Per-invocation settings after merging flags over the config file.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: Option<SupportedFormat>,
    pub output: OutputFormat,
    pub pretty: bool,
    pub strict: bool,
}

impl Context {
    pub fn new(
        config: &CliConfig,
        format: Option<SupportedFormat>,
        output: Option<OutputFormat>,
        strict: bool,
    ) -> CliResult<Self> {
        let configured = match &config.format {
            Some(raw) => Some(
                raw.parse::<SupportedFormat>()
                    .map_err(CliError::InvalidConfig)?,
            ),
            None => None,
        };
        Ok(Self {
            format: format.or(configured),
            output: output.unwrap_or(config.output),
            pretty: config.pretty,
            strict: strict || config.strict,
        })
    }

    fn render<T: Serialize>(&self, value: &T) -> CliResult<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }

    fn render_schema(&self, schema: &Schema) -> CliResult<String> {
        match self.output {
            OutputFormat::Json => self.render(schema),
            OutputFormat::Yaml => finish(yaml_schema_deparser(schema)),
        }
    }
}

pub fn read_schema(ctx: &Context, path: &Path) -> CliResult<Schema> {
    let source = std::fs::read_to_string(path)?;
    let format = ctx
        .format
        .or_else(|| detect_format(path, &source))
        .ok_or_else(|| CliError::UnknownFormat(path.display().to_string()))?;

    let result = process(format, &source);
    for error in &result.errors {
        tracing::warn!(
            event = "parse_error",
            input = %path.display(),
            format = format.as_str(),
            error = %error
        );
    }
    if ctx.strict && !result.errors.is_empty() {
        return Err(CliError::Parse {
            path: path.display().to_string(),
            errors: result.errors.len(),
        });
    }

    tracing::info!(
        event = "schema_loaded",
        input = %path.display(),
        format = format.as_str(),
        tables = result.value.tables.len()
    );
    Ok(result.value)
}

pub fn run_parse(ctx: &Context, input: &Path) -> CliResult<String> {
    let schema = read_schema(ctx, input)?;
    ctx.render_schema(&schema)
}

/// Classified diff items, or with `patch` the raw operations that turn
/// `before` into `after`.
pub fn run_diff(ctx: &Context, before: &Path, after: &Path, patch: bool) -> CliResult<String> {
    let before = read_schema(ctx, before)?;
    let after = read_schema(ctx, after)?;
    if patch {
        let operations = compare(&serde_json::to_value(&before)?, &serde_json::to_value(&after)?);
        tracing::info!(event = "patch_computed", operations = operations.len());
        return ctx.render(&operations);
    }
    let items = build_schema_diff(&before, &after);
    tracing::info!(event = "diff_computed", items = items.len());
    ctx.render(&items)
}

pub fn run_deparse(
    ctx: &Context,
    input: &Path,
    target: DeparseTarget,
    operations: bool,
) -> CliResult<String> {
    if operations {
        if target != DeparseTarget::Postgres {
            return Err(CliError::InvalidConfig(
                "operation lists can only be deparsed to postgres".to_string(),
            ));
        }
        let operations = read_operations(input)?;
        return finish(postgres_operations_deparser(&operations));
    }

    let schema = read_schema(ctx, input)?;
    match target {
        DeparseTarget::Postgres => finish(postgres_schema_deparser(&schema)),
        DeparseTarget::Yaml => finish(yaml_schema_deparser(&schema)),
    }
}

pub fn run_apply(ctx: &Context, input: &Path, operations: &Path) -> CliResult<String> {
    let schema = read_schema(ctx, input)?;
    let operations = read_operations(operations)?;
    let patched = apply_to_schema(&schema, &operations)?;
    if let Err(err) = validate_schema(&patched) {
        tracing::warn!(event = "patched_schema_invalid", error = %err);
    }
    tracing::info!(event = "operations_applied", operations = operations.len());
    ctx.render_schema(&patched)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub fingerprint: String,
    pub tables: usize,
    pub enums: usize,
    pub validation_error: Option<String>,
    pub relationships: IndexMap<String, Relationship>,
    pub fk_graph: FkGraphReport,
}

pub fn inspect(schema: &Schema) -> CliResult<InspectReport> {
    Ok(InspectReport {
        fingerprint: schema_fingerprint(schema)?,
        tables: schema.tables.len(),
        enums: schema.enums.len(),
        validation_error: validate_schema(schema).err().map(|err| err.to_string()),
        relationships: constraints_to_relationships(schema),
        fk_graph: build_fk_graph_report(schema),
    })
}

pub fn run_inspect(ctx: &Context, input: &Path) -> CliResult<String> {
    let schema = read_schema(ctx, input)?;
    ctx.render(&inspect(&schema)?)
}

fn read_operations(path: &Path) -> CliResult<Vec<Operation>> {
    let document: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    validate_operations(&document)
        .map_err(|report| CliError::InvalidOperations(describe(&report)))?;
    Ok(serde_json::from_value(document)?)
}

fn describe(report: &ValidationReport) -> String {
    report
        .errors
        .iter()
        .map(|issue| format!("{} {}: {}", issue.path, issue.code, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn finish(result: DeparseResult) -> CliResult<String> {
    if result.errors.is_empty() {
        return Ok(result.value);
    }
    for error in &result.errors {
        tracing::warn!(event = "deparse_error", error = %error);
    }
    Err(CliError::Deparse(
        result
            .errors
            .iter()
            .map(|error| error.message.clone())
            .collect::<Vec<_>>()
            .join("; "),
    ))
}
