// ==============================================================================
// polygenic.rs - SOLAR polygenic.out Report Parser
// ==============================================================================
// Description: Parser for the free-text results written by SOLAR's polygenic
//              command
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// Format: header block of "Key: value" fields, a blank line, then results
// indented by two levels (tabs or 4-space runs)
// Example:
//   	Pedigree:    ped_fam.csv
//   	Phenotypes:  raw_pheno_fam.csv
//   	Trait:       quicki_normal avignon_si0_normal   Individuals:  340
//
//   			 H2r(quicki_normal) is 0.4123456  p = 1.2345670E-05
//   	       H2r(quicki_normal) Std. Error:  0.0912345
//   			 RhoG is 0.5678901
//   	       RhoG different from zero  p = 0.0012345
//   			 Derived Estimate of RhoP is 0.1876543
// ==============================================================================

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    Comparison, Number, Record, Scalar, StatisticEntry, StatisticKind, TraitDeclaration,
    TraitLabel, MAX_TRAITS,
};

/// Line SOLAR writes in place of results when the model failed
pub const INCOMPLETE_RUN_MARKER: &str = "The last run of polygenic did not run to completion.";

const TRAIT_FIELD: &str = "Trait";
const DERIVED_PREFIX: &str = "Derived Estimate of ";

const NUMBER: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

// H2r is 0.1234567
// H2r(trait) is 0.1234567  p = 0.0123456  (Not Significant)
// H2r of trait is 0.1234567 +/- 0.0456789  p = 0.0123456
static ESTIMATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<name>.+?) is (?P<value>{n})(?:\s*\+/-\s*(?P<stderr>{n}))?(?:.*?\s+p\s*=\s*(?P<pvalue>{n}))?",
        n = NUMBER
    ))
    .expect("estimate line pattern")
});

// H2r Std. Error:  0.1234567
static STDERR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<name>.+?)\s+Std\. Error:\s+(?P<value>{n})",
        n = NUMBER
    ))
    .expect("standard error line pattern")
});

// RhoG different from zero  p = 0.1234567
// RhoG different from 1.0   p = 0.1234567
static COMPARISON_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<name>.+?)\s+different from\s+(?P<target>zero|1\.0)\s+p\s*=\s*(?P<pvalue>{n})",
        n = NUMBER
    ))
    .expect("comparison line pattern")
});

static NAME_WITH_TRAIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<variable>.+?)\((?P<trait>.+)\)$").expect("trait suffix pattern")
});

static NAME_BETWEEN_TRAITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<variable>.+?) between (?P<first>.+?) and (?P<second>.+)$")
        .expect("trait pair pattern")
});

static NAME_OF_TRAIT: LazyLock<Regex> = LazyLock::new(|| {
    // Trait names never contain spaces, so the last " of " splits off the trait
    Regex::new(r"^(?P<variable>.+) of (?P<trait>\S+)$").expect("trait reference pattern")
});

/// Errors that can occur while parsing a polygenic.out report
#[derive(Error, Debug)]
pub enum PolygenicParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Carries the report's own incompletion line
    #[error("{0}")]
    IncompleteRun(String),

    #[error("Malformed report at line {line}: {details}")]
    MalformedReport { line: usize, details: String },

    #[error("{count} traits declared; labels A-Z allow at most 26")]
    TraitLabelOverflow { count: usize },
}

impl PolygenicParseError {
    fn malformed(line: usize, details: impl Into<String>) -> Self {
        PolygenicParseError::MalformedReport {
            line,
            details: details.into(),
        }
    }

    /// Whether a run may skip this report and continue with the others
    ///
    /// Failed SOLAR runs and unreadable files can be skipped; a report that
    /// does not follow the expected layout cannot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PolygenicParseError::IncompleteRun(_) | PolygenicParseError::IoError(_)
        )
    }
}

/// Parser for SOLAR polygenic.out reports
pub struct PolygenicParser;

impl PolygenicParser {
    /// Parse the raw text of one report
    ///
    /// # Returns
    /// * `Ok(Record)` - Traits, header metadata and statistics in report order
    /// * `Err(PolygenicParseError)` - The report is incomplete or malformed;
    ///   no partial record is produced
    ///
    /// # Format
    /// 1. Any occurrence of the incompletion marker fails the whole report.
    /// 2. The header runs up to the first blank line. Every token ending in
    ///    `:` starts a field whose value is the following tokens.
    /// 3. The `Trait` field declares the traits, labelled A, B, C, ...
    /// 4. Result lines (indented two levels) are matched against the known
    ///    statement shapes; anything else is ignored.
    pub fn parse(text: &str) -> Result<Record, PolygenicParseError> {
        if text.contains(INCOMPLETE_RUN_MARKER) {
            let line = text
                .lines()
                .find(|line| line.contains(INCOMPLETE_RUN_MARKER))
                .map(str::trim)
                .unwrap_or(INCOMPLETE_RUN_MARKER);
            return Err(PolygenicParseError::IncompleteRun(line.to_string()));
        }

        let mut lines = text.lines().enumerate().map(|(idx, line)| (idx + 1, line));

        let header = Self::read_header(&mut lines)?;
        let traits = Self::declare_traits(&header.trait_names, header.line)?;

        let mut collector = StatisticCollector::new(&traits);
        for (number, line) in lines {
            if is_result_line(line) {
                collector.consume(number, line.trim())?;
            }
        }

        let record = Record {
            statistics: collector.into_entries(),
            metadata: header.metadata,
            traits,
        };

        debug!(
            "Parsed report: {} traits, {} metadata fields, {} statistics",
            record.traits.len(),
            record.metadata.len(),
            record.statistics.len()
        );

        Ok(record)
    }

    /// Read a report from disk and parse it
    ///
    /// # Example
    /// ```no_run
    /// use solar_tabulate::parsers::PolygenicParser;
    ///
    /// let record = PolygenicParser::parse_file("run1/polygenic.out")?;
    /// println!("{} statistics", record.statistics.len());
    /// # Ok::<(), solar_tabulate::parsers::PolygenicParseError>(())
    /// ```
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Record, PolygenicParseError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    fn read_header<'a>(
        lines: &mut impl Iterator<Item = (usize, &'a str)>,
    ) -> Result<Header, PolygenicParseError> {
        let mut start = None;
        let mut fields: Vec<(String, Vec<String>)> = Vec::new();

        for (number, line) in lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                if start.is_some() {
                    break;
                }
                continue;
            }
            start.get_or_insert(number);

            // Tokens before the first key on a line belong to no field
            let mut current: Option<usize> = None;
            for token in line.split_whitespace() {
                match token.strip_suffix(':').filter(|key| !key.is_empty()) {
                    Some(key) => {
                        let index = match fields.iter().position(|(name, _)| name == key) {
                            Some(index) => {
                                fields[index].1.clear();
                                index
                            }
                            None => {
                                fields.push((key.to_string(), Vec::new()));
                                fields.len() - 1
                            }
                        };
                        current = Some(index);
                    }
                    None => {
                        if let Some(index) = current {
                            fields[index].1.push(token.to_string());
                        }
                    }
                }
            }
        }

        let line = start.unwrap_or(1);
        if fields.is_empty() {
            return Err(PolygenicParseError::malformed(
                line,
                "metadata header not found; not a SOLAR polygenic.out file?",
            ));
        }

        let trait_index = fields
            .iter()
            .position(|(name, _)| name == TRAIT_FIELD)
            .ok_or_else(|| {
                PolygenicParseError::malformed(line, "required Trait declaration not found in header")
            })?;
        let (_, trait_names) = fields.remove(trait_index);

        // Fields printed without a value are left out and render as missing
        let metadata = fields
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name, Scalar::from_text(&values.join(" "))))
            .collect();

        Ok(Header {
            line,
            metadata,
            trait_names,
        })
    }

    fn declare_traits(
        names: &[String],
        line: usize,
    ) -> Result<Vec<TraitDeclaration>, PolygenicParseError> {
        if names.len() > MAX_TRAITS {
            return Err(PolygenicParseError::TraitLabelOverflow { count: names.len() });
        }

        let mut traits: Vec<TraitDeclaration> = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if traits.iter().any(|declared| &declared.name == name) {
                return Err(PolygenicParseError::malformed(
                    line,
                    format!("trait '{}' declared more than once", name),
                ));
            }

            let label = TraitLabel::from_index(index)
                .ok_or(PolygenicParseError::TraitLabelOverflow { count: names.len() })?;
            traits.push(TraitDeclaration {
                label,
                name: name.clone(),
            });
        }

        Ok(traits)
    }
}

struct Header {
    line: usize,
    metadata: Vec<(String, Scalar)>,
    trait_names: Vec<String>,
}

/// Results are indented twice with a mix of tabs and 4-space runs
fn is_result_line(line: &str) -> bool {
    let mut levels = 0;
    let mut spaces = 0;

    for c in line.chars() {
        match c {
            // A tab only counts when it does not follow a partial run of spaces
            '\t' if spaces > 0 => return false,
            '\t' => levels += 1,
            ' ' => {
                spaces += 1;
                if spaces == 4 {
                    levels += 1;
                    spaces = 0;
                }
            }
            _ => break,
        }

        if levels >= 2 {
            return true;
        }
    }

    false
}

/// Variable name with the traits and derivation it refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StatisticName {
    variable: String,
    trait_refs: Vec<TraitLabel>,
}

/// Everything reported for one (variable, traits) pair
struct StatisticGroup {
    name: StatisticName,
    derived: bool,
    value: Number,
    stderr: Option<Number>,
    pvalue: Option<Number>,
    comparisons: Vec<(Comparison, Number)>,
}

struct StatisticCollector<'a> {
    traits: &'a [TraitDeclaration],
    groups: Vec<StatisticGroup>,
    positions: HashMap<StatisticName, usize>,
}

impl<'a> StatisticCollector<'a> {
    fn new(traits: &'a [TraitDeclaration]) -> Self {
        Self {
            traits,
            groups: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Try each statement shape in priority order; unmatched lines are skipped
    fn consume(&mut self, line: usize, text: &str) -> Result<(), PolygenicParseError> {
        if let Some(caps) = ESTIMATE_LINE.captures(text) {
            return self.estimate(line, &caps);
        }
        if let Some(caps) = STDERR_LINE.captures(text) {
            return self.standard_error(line, &caps);
        }
        if let Some(caps) = COMPARISON_LINE.captures(text) {
            return self.comparison(line, &caps);
        }

        Ok(())
    }

    fn estimate(&mut self, line: usize, caps: &Captures<'_>) -> Result<(), PolygenicParseError> {
        let (name, derived) = self.resolve_name(line, &caps["name"])?;
        let group = StatisticGroup {
            name: name.clone(),
            derived,
            value: number(line, &caps["value"])?,
            stderr: optional_number(line, caps.name("stderr").map(|m| m.as_str()))?,
            pvalue: optional_number(line, caps.name("pvalue").map(|m| m.as_str()))?,
            comparisons: Vec::new(),
        };

        // A statistic reported twice keeps its first position
        let existing = self.positions.get(&name).copied();
        match existing {
            Some(index) => self.groups[index] = group,
            None => {
                self.positions.insert(name, self.groups.len());
                self.groups.push(group);
            }
        }

        Ok(())
    }

    fn standard_error(
        &mut self,
        line: usize,
        caps: &Captures<'_>,
    ) -> Result<(), PolygenicParseError> {
        let value = number(line, &caps["value"])?;
        let group = self.existing_group(line, &caps["name"], "standard error")?;
        group.stderr = Some(value);
        Ok(())
    }

    fn comparison(&mut self, line: usize, caps: &Captures<'_>) -> Result<(), PolygenicParseError> {
        let target = Comparison::from_report_text(&caps["target"]).ok_or_else(|| {
            PolygenicParseError::malformed(line, format!("unknown comparison '{}'", &caps["target"]))
        })?;
        let pvalue = number(line, &caps["pvalue"])?;
        let group = self.existing_group(line, &caps["name"], "significance test")?;

        match group
            .comparisons
            .iter_mut()
            .find(|(comparison, _)| *comparison == target)
        {
            Some(existing) => existing.1 = pvalue,
            None => group.comparisons.push((target, pvalue)),
        }

        Ok(())
    }

    /// Group a follow-up line refers to; it must already have been reported
    fn existing_group(
        &mut self,
        line: usize,
        raw_name: &str,
        what: &str,
    ) -> Result<&mut StatisticGroup, PolygenicParseError> {
        let (name, _) = self.resolve_name(line, raw_name)?;
        match self.positions.get(&name) {
            Some(&index) => Ok(&mut self.groups[index]),
            None => Err(PolygenicParseError::malformed(
                line,
                format!("{} for '{}' precedes its estimate", what, raw_name),
            )),
        }
    }

    /// Split a printed name into variable, trait references and derivation
    ///
    /// Accepted forms: `Var`, `Var(trait)`, `Var of trait`,
    /// `Var between traitA and traitB`, each optionally prefixed by
    /// `Derived Estimate of `.
    fn resolve_name(
        &self,
        line: usize,
        raw_name: &str,
    ) -> Result<(StatisticName, bool), PolygenicParseError> {
        let raw_name = raw_name.trim();
        let (name, derived) = match raw_name.strip_prefix(DERIVED_PREFIX) {
            Some(rest) => (rest.trim(), true),
            None => (raw_name, false),
        };

        if let Some(caps) = NAME_WITH_TRAIT.captures(name) {
            let label = self.require_label(line, &caps["trait"])?;
            return Ok((statistic_name(&caps["variable"], vec![label]), derived));
        }

        if let Some(caps) = NAME_BETWEEN_TRAITS.captures(name) {
            let first = self.require_label(line, &caps["first"])?;
            let second = self.require_label(line, &caps["second"])?;
            return Ok((statistic_name(&caps["variable"], vec![first, second]), derived));
        }

        if let Some(caps) = NAME_OF_TRAIT.captures(name) {
            if let Some(label) = self.label(&caps["trait"]) {
                return Ok((statistic_name(&caps["variable"], vec![label]), derived));
            }
        }

        // With a single trait every statistic belongs to that trait
        let trait_refs = match self.traits {
            [only] => vec![only.label],
            _ => Vec::new(),
        };

        Ok((statistic_name(name, trait_refs), derived))
    }

    fn label(&self, trait_name: &str) -> Option<TraitLabel> {
        let trait_name = trait_name.trim();
        self.traits
            .iter()
            .find(|declared| declared.name == trait_name)
            .map(|declared| declared.label)
    }

    fn require_label(&self, line: usize, trait_name: &str) -> Result<TraitLabel, PolygenicParseError> {
        self.label(trait_name).ok_or_else(|| {
            PolygenicParseError::malformed(
                line,
                format!("statistic refers to undeclared trait '{}'", trait_name.trim()),
            )
        })
    }

    /// Flatten groups into entries: value, stderr, pvalue, then comparisons
    fn into_entries(self) -> Vec<StatisticEntry> {
        let mut entries = Vec::new();

        for group in self.groups {
            let StatisticName {
                variable,
                trait_refs,
            } = group.name;
            let derived = group.derived;
            let entry = |kind, qualifier, value| StatisticEntry {
                variable: variable.clone(),
                trait_refs: trait_refs.clone(),
                kind,
                qualifier,
                derived,
                value,
            };

            let value_kind = if derived {
                StatisticKind::Estimate
            } else {
                StatisticKind::Value
            };
            entries.push(entry(value_kind, None, group.value));

            if let Some(stderr) = group.stderr {
                entries.push(entry(StatisticKind::StdErr, None, stderr));
            }
            if let Some(pvalue) = group.pvalue {
                entries.push(entry(StatisticKind::PValue, None, pvalue));
            }
            for (comparison, pvalue) in group.comparisons {
                entries.push(entry(StatisticKind::PValue, Some(comparison), pvalue));
            }
        }

        entries
    }
}

fn statistic_name(variable: &str, trait_refs: Vec<TraitLabel>) -> StatisticName {
    StatisticName {
        variable: variable.trim().to_string(),
        trait_refs,
    }
}

fn number(line: usize, text: &str) -> Result<Number, PolygenicParseError> {
    Number::parse(text)
        .ok_or_else(|| PolygenicParseError::malformed(line, format!("invalid number '{}'", text)))
}

fn optional_number(line: usize, text: Option<&str>) -> Result<Option<Number>, PolygenicParseError> {
    text.map(|text| number(line, text)).transpose()
}
