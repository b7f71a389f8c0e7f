use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use docdelta_diff::{compute_update_with, diff, list_changes, UpdateDirective};
use docdelta_path::has;
use docdelta_records::{group_by_pivots, reconcile, ungroup};
use docdelta_types::{ChangeFilter, Document, IDENTITY_KEY};

use crate::cli::*;
use crate::render;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let output = match cli.command {
        Command::Diff(args) => cmd_diff(args, format),
        Command::Update(args) => cmd_update(args, format),
        Command::Reconcile(args) => cmd_reconcile(args, format),
        Command::Group(args) => cmd_group(args, format),
        Command::Ungroup(args) => cmd_ungroup(args, format),
    }?;
    println!("{output}");
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<String> {
    let old = read_document(&args.old)?;
    let new = read_document(&args.new)?;
    let filter = build_filter(&args.filter, ChangeFilter::default())?;

    match format {
        OutputFormat::Json if args.flat => to_json(&list_changes(&old, &new, &filter)),
        OutputFormat::Json => to_json(&diff(&old, &new, &filter)),
        OutputFormat::Text => Ok(render::changes(&list_changes(&old, &new, &filter))),
    }
}

fn cmd_update(args: UpdateArgs, format: OutputFormat) -> anyhow::Result<String> {
    let mut old = read_document(&args.old)?;
    let new = read_document(&args.new)?;
    let filter = protect_identity(build_filter(&args.filter, ChangeFilter::identity_protected())?);
    let mut directive = compute_update_with(&old, &new, &filter);
    if filter.grab {
        // a grab-list cannot shield `_id` itself; drop what reaches into it
        drop_identity_changes(&mut directive, &old);
    }

    if args.apply {
        directive.apply(&mut old)?;
        return to_json(&old);
    }
    match format {
        OutputFormat::Json => to_json(&directive),
        OutputFormat::Text => Ok(render::update(&directive)),
    }
}

fn cmd_reconcile(args: ReconcileArgs, format: OutputFormat) -> anyhow::Result<String> {
    let old = read_records(&args.old)?;
    let new = read_records(&args.new)?;
    let filter = build_filter(&args.filter, ChangeFilter::default())?;
    let pivots = Pivot::fields(&args.pivots);
    let result = reconcile(&old, &new, &pivots, &filter)?;

    match format {
        OutputFormat::Json => to_json(&result),
        OutputFormat::Text => Ok(render::reconciliation(&result, &pivots)),
    }
}

fn cmd_group(args: GroupArgs, format: OutputFormat) -> anyhow::Result<String> {
    let records = read_records(&args.input)?;
    let grouped = group_by_pivots(
        &records,
        &Pivot::fields(&args.pivots),
        &Pivot::converters(&args.pivots),
    )?;
    match format {
        OutputFormat::Json => to_json(&grouped),
        OutputFormat::Text => Ok(render::tree(&grouped)),
    }
}

fn cmd_ungroup(args: UngroupArgs, _format: OutputFormat) -> anyhow::Result<String> {
    let nested = read_document(&args.input)?;
    let records = ungroup(
        &nested,
        &Pivot::fields(&args.pivots),
        &Pivot::converters(&args.pivots),
    )?;
    to_json(&records)
}

/// Combine a filter file and command-line overrides on top of `base`.
fn build_filter(args: &FilterArgs, base: ChangeFilter) -> anyhow::Result<ChangeFilter> {
    let mut filter = match &args.filter_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read filter {}", path.display()))?;
            ChangeFilter::from_toml_str(&text)
                .with_context(|| format!("invalid filter {}", path.display()))?
        }
        None => base,
    };
    if !args.only.is_empty() {
        filter = filter.only(args.only.iter().cloned());
    } else if !args.exclude.is_empty() {
        filter = filter.excluding(args.exclude.iter().cloned());
    }
    if !args.categories.is_empty() {
        filter = filter.with_categories(args.categories.iter().copied());
    }
    debug!(?filter, "built change filter");
    Ok(filter)
}

/// Keep the identity key out of any update, whatever the grab-list says.
fn protect_identity(mut filter: ChangeFilter) -> ChangeFilter {
    if filter.grab {
        filter.keys.retain(|k| k != IDENTITY_KEY);
    } else if !filter.keys.iter().any(|k| k == IDENTITY_KEY) {
        filter.keys.push(IDENTITY_KEY.to_string());
    }
    filter
}

/// Remove `$unset` entries under the identity key, and `$set` entries that
/// would overwrite an existing value there.
fn drop_identity_changes(directive: &mut UpdateDirective, old: &Document) {
    directive.unset.retain(|path, _| !touches_identity(path));
    directive
        .set
        .retain(|path, _| !touches_identity(path) || has(old, path.as_str()) == Ok(false));
}

fn touches_identity(path: &str) -> bool {
    path == IDENTITY_KEY
        || path
            .strip_prefix(IDENTITY_KEY)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn read_value(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    match read_value(path)? {
        Value::Object(doc) => Ok(doc),
        _ => bail!("{} must hold a JSON object", path.display()),
    }
}

fn read_records(path: &Path) -> anyhow::Result<Vec<Document>> {
    let Value::Array(items) = read_value(path)? else {
        bail!("{} must hold a JSON array of objects", path.display());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(record) => Ok(record),
            _ => bail!("{}: record {} is not an object", path.display(), i),
        })
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
