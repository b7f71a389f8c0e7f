use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use docdelta_records::KeyConverter;
use docdelta_types::ChangeKind;

#[derive(Parser)]
#[command(
    name = "docdelta",
    about = "Minimal diffs, partial updates, and record reconciliation for JSON documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the changes between two documents
    Diff(DiffArgs),
    /// Compile the $set/$unset update that turns OLD into NEW
    Update(UpdateArgs),
    /// Classify two record lists into deleted, changed, and created records
    Reconcile(ReconcileArgs),
    /// Group a record list into a mapping keyed by pivot values
    Group(GroupArgs),
    /// Flatten a grouped mapping back into a record list
    Ungroup(UngroupArgs),
}

/// Options shared by every command that runs a deep diff.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Load the change filter from a TOML file
    #[arg(long = "filter", value_name = "TOML")]
    pub filter_file: Option<PathBuf>,
    /// Only compare these keys (created keys are always reported)
    #[arg(long, value_delimiter = ',', conflicts_with = "exclude")]
    pub only: Vec<String>,
    /// Ignore these keys when reporting deletions and updates
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
    /// Change kinds to report: created, updated, deleted
    #[arg(long = "category", value_delimiter = ',')]
    pub categories: Vec<ChangeKind>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Emit one entry per changed path instead of the nested summary
    #[arg(long)]
    pub flat: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Apply the update to OLD and print the result
    #[arg(long)]
    pub apply: bool,
}

#[derive(Args)]
pub struct ReconcileArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    /// Pivot field identifying a record (repeatable)
    #[arg(short, long = "pivot", required = true, value_parser = parse_pivot)]
    pub pivots: Vec<Pivot>,
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args)]
pub struct GroupArgs {
    pub input: PathBuf,
    /// Pivot field as NAME[:CONVERTER], outermost first (repeatable)
    #[arg(short, long = "pivot", required = true, value_parser = parse_pivot)]
    pub pivots: Vec<Pivot>,
}

#[derive(Args)]
pub struct UngroupArgs {
    pub input: PathBuf,
    /// Pivot field as NAME[:CONVERTER], outermost first (repeatable)
    #[arg(short, long = "pivot", required = true, value_parser = parse_pivot)]
    pub pivots: Vec<Pivot>,
}

/// A pivot field with the converter used for its mapping keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pivot {
    pub field: String,
    pub converter: KeyConverter,
}

impl Pivot {
    pub fn fields(pivots: &[Pivot]) -> Vec<&str> {
        pivots.iter().map(|p| p.field.as_str()).collect()
    }

    pub fn converters(pivots: &[Pivot]) -> Vec<KeyConverter> {
        pivots.iter().map(|p| p.converter).collect()
    }
}

fn parse_pivot(s: &str) -> Result<Pivot, String> {
    let (field, converter) = match s.split_once(':') {
        Some((field, converter)) => (field, converter.parse()?),
        None => (s, KeyConverter::default()),
    };
    if field.is_empty() {
        return Err("pivot field name is empty".into());
    }
    Ok(Pivot {
        field: field.to_string(),
        converter,
    })
}
