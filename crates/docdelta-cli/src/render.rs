//! Human-readable rendering of diff, update, and reconciliation results.

use colored::Colorize;
use serde_json::Value;

use docdelta_diff::{Change, ChangeSet, UpdateDirective};
use docdelta_records::Reconciliation;
use docdelta_types::{ChangeKind, Document};

/// One line per change: `-` deleted, `~` updated, `+` created.
pub fn changes(set: &ChangeSet) -> String {
    if set.is_empty() {
        return "No changes.".to_string();
    }
    let mut out = String::new();
    for change in set.iter() {
        let line = match change {
            Change::Deleted { path, value } => {
                format!("{} {}: {}", "-".red().bold(), path.dotted().red(), value)
            }
            Change::Updated { path, old, new } => format!(
                "{} {}: {} -> {}",
                "~".yellow().bold(),
                path.dotted().yellow(),
                old.to_string().dimmed(),
                new
            ),
            Change::Created { path, value } => {
                format!("{} {}: {}", "+".green().bold(), path.dotted().green(), value)
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!(
        "{} deleted, {} updated, {} created",
        set.count(ChangeKind::Deleted).to_string().bold(),
        set.count(ChangeKind::Updated).to_string().bold(),
        set.count(ChangeKind::Created).to_string().bold(),
    ));
    out
}

pub fn update(directive: &UpdateDirective) -> String {
    if directive.is_noop() {
        return format!("{} Documents match; nothing to update.", "✓".green().bold());
    }
    let mut out = String::new();
    if !directive.set.is_empty() {
        out.push_str(&format!("{}\n", "$set".cyan().bold()));
        for (path, value) in &directive.set {
            out.push_str(&format!("  {} = {}\n", path.green(), value));
        }
    }
    if !directive.unset.is_empty() {
        out.push_str(&format!("{}\n", "$unset".cyan().bold()));
        for path in directive.unset.keys() {
            out.push_str(&format!("  {}\n", path.red()));
        }
    }
    out.trim_end().to_string()
}

/// Summary of a reconciliation, naming each record by its pivot values.
pub fn reconciliation(result: &Reconciliation, pivots: &[&str]) -> String {
    if result.is_empty() {
        return "No record changes.".to_string();
    }
    let mut out = String::new();
    for record in &result.deleted {
        out.push_str(&format!("{} {}\n", "-".red().bold(), record_label(record, pivots).red()));
    }
    for changed in &result.changed {
        let touched = changed.diff.deleted.len() + changed.diff.updated.len() + changed.diff.created.len();
        out.push_str(&format!(
            "{} {} ({} top-level field{})\n",
            "~".yellow().bold(),
            record_label(&changed.new, pivots).yellow(),
            touched,
            if touched == 1 { "" } else { "s" }
        ));
    }
    for record in &result.created {
        out.push_str(&format!("{} {}\n", "+".green().bold(), record_label(record, pivots).green()));
    }
    out.push_str(&format!(
        "{} deleted, {} changed, {} created",
        result.deleted.len().to_string().bold(),
        result.changed.len().to_string().bold(),
        result.created.len().to_string().bold(),
    ));
    out
}

fn record_label(record: &Document, pivots: &[&str]) -> String {
    pivots
        .iter()
        .map(|field| match record.get(*field) {
            Some(value) => format!("{field}={value}"),
            None => format!("{field}=?"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Indented key tree; leaves print inline as JSON.
pub fn tree(doc: &Document) -> String {
    let mut out = String::new();
    tree_into(doc, 0, &mut out);
    out.trim_end().to_string()
}

fn tree_into(doc: &Document, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for (key, value) in doc {
        match value {
            Value::Object(inner) => {
                out.push_str(&format!("{indent}{}\n", key.bold()));
                tree_into(inner, depth + 1, out);
            }
            leaf => out.push_str(&format!("{indent}{}: {}\n", key.bold(), leaf)),
        }
    }
}
