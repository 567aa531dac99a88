//! Filter: a membership predicate over (database index, key, logical type).
//!
//! Validation happens eagerly in [`FilterConfig::build`] — failing fast with
//! a descriptive `anyhow::Error` rather than deferring a bad regex or an
//! unrecognized type name to the first key it would have rejected anyway.

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use regex::Regex;

use crate::value::LogicalType;

/// Optional predicates over database index, key, and logical type. An
/// absent axis imposes no constraint on that axis.
pub struct FilterConfig {
    dbs: Option<HashSet<u32>>,
    keys: Option<Regex>,
    types: Option<HashSet<LogicalType>>,
}

impl FilterConfig {
    /// Builds a filter with no constraints: everything matches.
    pub fn none() -> Self {
        FilterConfig {
            dbs: None,
            keys: None,
            types: None,
        }
    }

    /// Builds a filter from its three optional axes. `keys` is an unanchored
    /// regular expression matched against the key interpreted as a string;
    /// `types` entries must be one of `string`, `list`, `set`, `sortedset`,
    /// `hash`.
    pub fn build<I>(dbs: Option<I>, keys: Option<&str>, types: Option<&[&str]>) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let dbs = dbs.map(|it| it.into_iter().collect());

        let keys = keys
            .map(Regex::new)
            .transpose()
            .context("invalid `keys` filter regular expression")?;

        let types = types
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        LogicalType::from_str(name)
                            .ok_or_else(|| anyhow!("unrecognized logical type `{name}` in `types` filter"))
                    })
                    .collect::<Result<HashSet<_>>>()
            })
            .transpose()?;

        Ok(FilterConfig { dbs, keys, types })
    }

    /// The database-only check performed before a key is even read: if
    /// this fails, the driver skip-reads both key and value.
    pub fn accepts_database(&self, db: u32) -> bool {
        match &self.dbs {
            Some(dbs) => dbs.contains(&db),
            None => true,
        }
    }

    /// The full check performed once the key is known: if this fails, the
    /// driver skip-reads the value only.
    pub fn accepts(&self, db: u32, key: &[u8], logical_type: LogicalType) -> bool {
        if !self.accepts_database(db) {
            return false;
        }
        if let Some(types) = &self.types {
            if !types.contains(&logical_type) {
                return false;
            }
        }
        if let Some(keys) = &self.keys {
            let key_str = String::from_utf8_lossy(key);
            if !keys.is_match(&key_str) {
                return false;
            }
        }
        true
    }
}
