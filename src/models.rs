// ==============================================================================
// models.rs - Report Data Models
// ==============================================================================
// Description: Data structures for parsed SOLAR polygenic.out reports
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use serde::{Serialize, Serializer};
use std::fmt;

/// Number of single-letter trait labels available (A-Z)
pub const MAX_TRAITS: usize = 26;

/// Single-letter label assigned to a trait by declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraitLabel(u8);

impl TraitLabel {
    /// Label for the trait at `index` (0 -> A), or None past Z
    pub fn from_index(index: usize) -> Option<Self> {
        if index < MAX_TRAITS {
            Some(TraitLabel(index as u8))
        } else {
            None
        }
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn as_char(&self) -> char {
        (b'A' + self.0) as char
    }
}

impl fmt::Display for TraitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for TraitLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

/// Numeric value together with the exact text the report printed
///
/// Output reproduces `text`, so `1.2345670E-05` is not rewritten as
/// `0.000012345670`.
#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    value: f64,
    text: String,
}

impl Number {
    /// Parse a plain decimal or scientific number
    ///
    /// Rejects the `inf`/`nan` spellings that `f64::from_str` would accept.
    pub fn parse(text: &str) -> Option<Self> {
        let plain = !text.is_empty()
            && text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if !plain {
            return None;
        }

        text.parse::<f64>().ok().map(|value| Number {
            value,
            text: text.to_string(),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.text)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value)
    }
}

/// Scalar cell value: metadata field, trait name, or statistic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(Number),
    Text(String),
}

impl Scalar {
    /// Numbers become `Scalar::Number`, anything else stays text
    pub fn from_text(text: &str) -> Self {
        match Number::parse(text) {
            Some(number) => Scalar::Number(number),
            None => Scalar::Text(text.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Scalar::Number(number) => Some(number),
            Scalar::Text(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(number) => fmt::Display::fmt(number, f),
            Scalar::Text(text) => f.pad(text),
        }
    }
}

impl From<Number> for Scalar {
    fn from(number: Number) -> Self {
        Scalar::Number(number)
    }
}

/// A trait declared in the report header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitDeclaration {
    pub label: TraitLabel,
    pub name: String,
}

/// What a statistic entry measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticKind {
    /// Point estimate printed by the model
    Value,
    /// Standard error of the estimate
    StdErr,
    /// Significance test; qualified by a `Comparison` when it is a
    /// "different from" test
    PValue,
    /// Value of a derived estimate (e.g. RhoP)
    Estimate,
}

/// Null hypothesis of a "different from" significance test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Comparison {
    /// "different from zero"
    Zero,
    /// "different from 1.0"
    One,
}

impl Comparison {
    /// Map the report's wording (`zero`, `1.0`) to a comparison
    pub fn from_report_text(text: &str) -> Option<Self> {
        match text {
            "zero" => Some(Comparison::Zero),
            "1.0" => Some(Comparison::One),
            _ => None,
        }
    }

    /// Qualifier used in column names
    pub fn qualifier(&self) -> &'static str {
        match self {
            Comparison::Zero => "NotZero",
            Comparison::One => "Not1.0",
        }
    }
}

/// One numeric result reported for a variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticEntry {
    /// Variable name as printed, e.g. "H2r", "RhoG"
    pub variable: String,
    /// Traits the statistic refers to, in the order the report names them
    pub trait_refs: Vec<TraitLabel>,
    pub kind: StatisticKind,
    pub qualifier: Option<Comparison>,
    /// Set for every entry of a "Derived Estimate of ..." statistic
    pub derived: bool,
    pub value: Number,
}

/// One parsed polygenic.out report
///
/// Built once by the parser and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    pub traits: Vec<TraitDeclaration>,
    /// Header fields in report order (`Trait` excluded)
    pub metadata: Vec<(String, Scalar)>,
    pub statistics: Vec<StatisticEntry>,
}

impl Record {
    pub fn label_for(&self, trait_name: &str) -> Option<TraitLabel> {
        self.traits
            .iter()
            .find(|declared| declared.name == trait_name)
            .map(|declared| declared.label)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Scalar> {
        self.metadata
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Look up a statistic by its identifying fields
    pub fn statistic(
        &self,
        variable: &str,
        trait_refs: &[TraitLabel],
        kind: StatisticKind,
        qualifier: Option<Comparison>,
    ) -> Option<&StatisticEntry> {
        self.statistics.iter().find(|entry| {
            entry.variable == variable
                && entry.trait_refs == trait_refs
                && entry.kind == kind
                && entry.qualifier == qualifier
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_label_letters() {
        assert_eq!(TraitLabel::from_index(0).unwrap().as_char(), 'A');
        assert_eq!(TraitLabel::from_index(1).unwrap().to_string(), "B");
        assert_eq!(TraitLabel::from_index(25).unwrap().as_char(), 'Z');
        assert!(TraitLabel::from_index(26).is_none());
    }

    #[test]
    fn test_number_keeps_report_text() {
        let number = Number::parse("1.2345670E-05").unwrap();
        assert_eq!(number.to_string(), "1.2345670E-05");
        assert!((number.value() - 1.234567e-5).abs() < 1e-15);

        assert!(Number::parse("nan").is_none());
        assert!(Number::parse("inf").is_none());
        assert!(Number::parse(".").is_none());
        assert!(Number::parse("").is_none());
    }

    #[test]
    fn test_scalar_from_text() {
        assert_eq!(Scalar::from_text("340").to_string(), "340");
        assert!(Scalar::from_text("340").as_number().is_some());
        assert_eq!(
            Scalar::from_text("ped_fam.csv"),
            Scalar::Text("ped_fam.csv".to_string())
        );
    }

    #[test]
    fn test_comparison_qualifiers() {
        assert_eq!(Comparison::from_report_text("zero"), Some(Comparison::Zero));
        assert_eq!(Comparison::from_report_text("1.0"), Some(Comparison::One));
        assert_eq!(Comparison::from_report_text("2.0"), None);
        assert_eq!(Comparison::Zero.qualifier(), "NotZero");
        assert_eq!(Comparison::One.qualifier(), "Not1.0");
    }

    #[test]
    fn test_scalar_json() {
        let number = Scalar::from_text("0.5");
        let text = Scalar::from_text("ped.csv");
        assert_eq!(serde_json::to_string(&number).unwrap(), "0.5");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"ped.csv\"");
    }
}
