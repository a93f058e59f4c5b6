// ==============================================================================
// column_key.rs - Column Name Synthesis
// ==============================================================================
// Description: Canonical column names for trait labels, header fields and
//              statistics
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Naming:
//   <variable>[.<letter>...][.est][.stderr | .pvalue | .pNotZero | .pNot1.0]
// Examples:
//   H2r.A  H2r.A.stderr  H2r.A.pvalue  RhoG.pNot1.0  RhoP.est.pNotZero
// ==============================================================================

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

use crate::models::{StatisticEntry, StatisticKind, TraitLabel};

/// Name of one table column
///
/// Keys depend only on the values they are built from, so the same
/// statistic gets the same key in every report regardless of parse order.
/// A variable printed with dots (`H2r.A`) can produce the same key as a
/// trait-scoped statistic; the table keeps whichever column came first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ColumnKey(String);

impl ColumnKey {
    /// Column holding the name of the trait with this label
    pub fn trait_label(label: TraitLabel) -> Self {
        ColumnKey(label.to_string())
    }

    /// Column holding a header field
    pub fn metadata(field: &str) -> Self {
        ColumnKey(field.to_string())
    }

    /// Column holding a statistic
    pub fn for_statistic(entry: &StatisticEntry) -> Self {
        let mut key = entry.variable.clone();

        for label in &entry.trait_refs {
            key.push('.');
            key.push(label.as_char());
        }

        if entry.derived || entry.kind == StatisticKind::Estimate {
            key.push_str(".est");
        }

        match (entry.kind, entry.qualifier) {
            (StatisticKind::Value | StatisticKind::Estimate, _) => {}
            (StatisticKind::StdErr, _) => key.push_str(".stderr"),
            (StatisticKind::PValue, None) => key.push_str(".pvalue"),
            (StatisticKind::PValue, Some(comparison)) => {
                key.push_str(".p");
                key.push_str(comparison.qualifier());
            }
        }

        ColumnKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for ColumnKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ColumnKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
