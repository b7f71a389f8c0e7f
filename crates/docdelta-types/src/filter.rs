//! Change filters: which kinds of change to compute and which keys take part.
//!
//! A filter has three parts:
//!
//! - `categories` -- the [`ChangeKind`]s to report.
//! - `keys` -- the grab-list of key names.
//! - `grab` -- polarity. With `grab = false` the listed keys are excluded
//!   from deletion and update reporting; with `grab = true` only the listed
//!   keys are considered.
//!
//! Created keys are never subject to the grab-list.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The identity field that partial updates must never unset or reset.
pub const IDENTITY_KEY: &str = "_id";

/// Category of a change between two documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Key present only in the new document.
    Created,
    /// Key present in both with differing leaf values.
    Updated,
    /// Key present only in the old document.
    Deleted,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [Self::Created, Self::Updated, Self::Deleted];

    /// The lowercase name used as a diff summary branch.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            other => Err(TypeError::InvalidFilter(format!(
                "unknown change category: {other:?}"
            ))),
        }
    }
}

/// Configuration gating which changes a diff reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeFilter {
    /// Change kinds to compute.
    pub categories: BTreeSet<ChangeKind>,
    /// Grab-list of key names.
    pub keys: Vec<String>,
    /// `true`: only `keys` participate. `false`: `keys` are excluded.
    pub grab: bool,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self {
            categories: ChangeKind::ALL.into_iter().collect(),
            keys: Vec::new(),
            grab: false,
        }
    }
}

impl ChangeFilter {
    /// The default filter with [`IDENTITY_KEY`] excluded, used when compiling
    /// partial updates.
    pub fn identity_protected() -> Self {
        Self::default().excluding([IDENTITY_KEY])
    }

    /// Exclude `keys` from deletion and update reporting.
    pub fn excluding<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self.grab = false;
        self
    }

    /// Restrict deletion and update reporting to `keys`.
    pub fn only<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self.grab = true;
        self
    }

    /// Replace the set of reported change kinds.
    pub fn with_categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = ChangeKind>,
    {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Build a filter from category names, rejecting unknown ones.
    pub fn from_names<I, S>(names: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            categories,
            ..Self::default()
        })
    }

    /// Returns `true` if changes of `kind` should be computed.
    pub fn wants(&self, kind: ChangeKind) -> bool {
        self.categories.contains(&kind)
    }

    /// Grab-list polarity test: `grab XOR (key not in keys)`.
    pub fn includes(&self, key: &str) -> bool {
        self.grab ^ !self.keys.iter().any(|k| k == key)
    }

    /// Parse a filter from TOML. Missing fields take their defaults.
    ///
    /// ```
    /// use docdelta_types::{ChangeFilter, ChangeKind};
    ///
    /// let filter = ChangeFilter::from_toml_str(r#"
    ///     categories = ["updated"]
    ///     keys = ["_id"]
    /// "#).unwrap();
    /// assert!(filter.wants(ChangeKind::Updated));
    /// assert!(!filter.wants(ChangeKind::Created));
    /// assert!(!filter.includes("_id"));
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, TypeError> {
        let raw: RawFilter =
            toml::from_str(input).map_err(|e| TypeError::Config(e.to_string()))?;
        raw.try_into()
    }
}

/// Untyped TOML shape, so unknown category names surface as
/// `InvalidFilter` rather than a generic parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawFilter {
    categories: Option<Vec<String>>,
    keys: Vec<String>,
    grab: bool,
}

impl TryFrom<RawFilter> for ChangeFilter {
    type Error = TypeError;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        let base = match raw.categories {
            Some(names) => ChangeFilter::from_names(names)?,
            None => ChangeFilter::default(),
        };
        Ok(ChangeFilter {
            keys: raw.keys,
            grab: raw.grab,
            ..base
        })
    }
}
