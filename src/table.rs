// ==============================================================================
// table.rs - Wide Table Assembly
// ==============================================================================
// Description: Merges parsed reports into one row-per-report table with a
//              shared column set
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// Column order:
//   1. Trait labels A, B, ... (as many as the widest report declares)
//   2. Header fields, first-seen order across reports
//   3. Statistics, first-seen order across reports
// ==============================================================================

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::column_key::ColumnKey;
use crate::models::{Record, Scalar, TraitLabel};

/// Cells of one report, keyed by column
///
/// Columns a report has no value for are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: HashMap<ColumnKey, Scalar>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.cells.get(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn insert(&mut self, key: ColumnKey, value: Scalar) {
        self.cells.insert(key, value);
    }

    fn contains(&self, key: &ColumnKey) -> bool {
        self.cells.contains_key(key)
    }
}

/// Columns in first-seen order
#[derive(Debug, Clone, Default)]
struct ColumnSet {
    order: Vec<ColumnKey>,
    seen: HashSet<ColumnKey>,
}

impl ColumnSet {
    fn observe(&mut self, key: &ColumnKey) {
        if self.seen.insert(key.clone()) {
            self.order.push(key.clone());
        }
    }
}

/// Accumulates records; the column set is only known once every record
/// has been added
#[derive(Debug, Default)]
pub struct TableAssembler {
    trait_count: usize,
    metadata_columns: ColumnSet,
    statistic_columns: ColumnSet,
    rows: Vec<Row>,
}

impl TableAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record as the next row
    ///
    /// Earlier rows are never modified; new columns only widen the table.
    pub fn add(&mut self, record: &Record) {
        let mut row = Row::default();

        for declared in &record.traits {
            row.insert(
                ColumnKey::trait_label(declared.label),
                Scalar::Text(declared.name.clone()),
            );
        }
        self.trait_count = self.trait_count.max(record.traits.len());

        for (field, value) in &record.metadata {
            let key = ColumnKey::metadata(field);
            if row.contains(&key) {
                warn!("Header field '{}' clashes with a trait label column; ignoring it", field);
                continue;
            }
            self.metadata_columns.observe(&key);
            row.insert(key, value.clone());
        }

        for entry in &record.statistics {
            let key = ColumnKey::for_statistic(entry);
            if row.contains(&key) {
                warn!(
                    "Statistic '{}' clashes with an earlier column of the same report; ignoring it",
                    key
                );
                continue;
            }
            self.statistic_columns.observe(&key);
            row.insert(key, Scalar::from(entry.value.clone()));
        }

        debug!("Added row {} with {} cells", self.rows.len() + 1, row.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fix the column order and hand over the rows
    pub fn finalize(self) -> Table {
        let mut columns = ColumnSet::default();

        for index in 0..self.trait_count {
            if let Some(label) = TraitLabel::from_index(index) {
                columns.observe(&ColumnKey::trait_label(label));
            }
        }
        for key in self
            .metadata_columns
            .order
            .iter()
            .chain(self.statistic_columns.order.iter())
        {
            columns.observe(key);
        }

        debug!(
            "Finalized table: {} rows x {} columns",
            self.rows.len(),
            columns.order.len()
        );

        Table {
            columns: columns.order,
            rows: self.rows,
        }
    }
}

/// Finalized wide table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<ColumnKey>,
    rows: Vec<Row>,
}

impl Table {
    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Scalar> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Cells of `row` in column order; None marks a missing value
    pub fn row_values<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = Option<&'a Scalar>> + 'a {
        self.columns.iter().map(move |column| row.get(column.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Record> for Table {
    fn from_iter<I: IntoIterator<Item = Record>>(records: I) -> Self {
        let mut assembler = TableAssembler::new();
        for record in records {
            assembler.add(&record);
        }
        assembler.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::PolygenicParser;
    use proptest::prelude::*;

    const BIVARIATE_REPORT: &str = "\
\tPedigree:    ped_fam.csv
\tPhenotypes:  raw_pheno_fam.csv
\tTrait:       quicki_normal avignon_si0_normal     Individuals:  340

\t\t\t H2r(quicki_normal) is 0.4123456  p = 1.2345670E-05
\t       H2r(quicki_normal) Std. Error:  0.0912345

\t\t\t H2r(avignon_si0_normal) is 0.2987654
\t       H2r(avignon_si0_normal) Std. Error:  0.1023456

\t\t\t RhoE is -0.1234567  p = 0.0456789
\t       RhoE Std. Error:  0.0612345

\t\t\t RhoG is 0.5678901
\t       RhoG Std. Error:  0.1534567
\t       RhoG different from zero  p = 0.0012345
\t       RhoG different from 1.0   p = 0.0034567

\t\t\t Derived Estimate of RhoP is 0.1876543
\t\t\t RhoP different from zero  p = 3.4567890E-04
";

    const UNIVARIATE_REPORT: &str = "\
\tPedigree:    ped_fam.csv
\tPhenotypes:  raw_pheno_fam.csv
\tTrait:       bmi_normal     Individuals:  512

\t\t\t H2r is 0.3456789  p = 0.0000123
\t       H2r Std. Error:  0.0456789
";

    fn parse(text: &str) -> Record {
        PolygenicParser::parse(text).unwrap()
    }

    fn column_names(table: &Table) -> Vec<&str> {
        table.columns().iter().map(ColumnKey::as_str).collect()
    }

    #[test]
    fn test_bivariate_columns() {
        let table: Table = vec![parse(BIVARIATE_REPORT)].into_iter().collect();

        assert_eq!(
            column_names(&table),
            vec![
                "A",
                "B",
                "Pedigree",
                "Phenotypes",
                "Individuals",
                "H2r.A",
                "H2r.A.stderr",
                "H2r.A.pvalue",
                "H2r.B",
                "H2r.B.stderr",
                "RhoE",
                "RhoE.stderr",
                "RhoE.pvalue",
                "RhoG",
                "RhoG.stderr",
                "RhoG.pNotZero",
                "RhoG.pNot1.0",
                "RhoP.est",
                "RhoP.est.pNotZero",
            ]
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "A").unwrap().to_string(), "quicki_normal");
        assert_eq!(table.cell(0, "B").unwrap().to_string(), "avignon_si0_normal");
        assert_eq!(table.cell(0, "Individuals").unwrap().to_string(), "340");
        assert_eq!(table.cell(0, "H2r.A.pvalue").unwrap().to_string(), "1.2345670E-05");
        assert_eq!(table.cell(0, "RhoP.est.pNotZero").unwrap().to_string(), "3.4567890E-04");
        assert!(table.cell(0, "H2r.B.pvalue").is_none());
    }

    #[test]
    fn test_merge_one_and_two_trait_records() {
        let table: Table = vec![parse(UNIVARIATE_REPORT), parse(BIVARIATE_REPORT)]
            .into_iter()
            .collect();

        let columns = column_names(&table);
        assert_eq!(&columns[..5], &["A", "B", "Pedigree", "Phenotypes", "Individuals"]);
        assert!(columns.contains(&"H2r.B"));
        assert!(columns.contains(&"H2r.B.stderr"));

        // Univariate row has no B columns, but the columns stay in the table
        assert_eq!(table.cell(0, "A").unwrap().to_string(), "bmi_normal");
        assert!(table.cell(0, "B").is_none());
        assert!(table.cell(0, "H2r.B").is_none());
        assert!(table.cell(0, "RhoG").is_none());
        assert_eq!(table.cell(0, "H2r.A.pvalue").unwrap().to_string(), "0.0000123");

        assert_eq!(table.cell(1, "B").unwrap().to_string(), "avignon_si0_normal");

        let values: Vec<_> = table.row_values(&table.rows()[0]).collect();
        assert_eq!(values.len(), columns.len());
        assert!(values[1].is_none());
    }

    #[test]
    fn test_column_set_independent_of_order() {
        let records = [parse(UNIVARIATE_REPORT), parse(BIVARIATE_REPORT)];

        let forward: Table = records.iter().cloned().collect();
        let backward: Table = records.iter().rev().cloned().collect();

        let forward_set: HashSet<_> = forward.columns().iter().collect();
        let backward_set: HashSet<_> = backward.columns().iter().collect();
        assert_eq!(forward_set, backward_set);
        assert_eq!(forward.columns().len(), backward.columns().len());
    }

    #[test]
    fn test_column_order_is_deterministic() {
        let build = || -> Table {
            vec![parse(BIVARIATE_REPORT), parse(UNIVARIATE_REPORT)]
                .into_iter()
                .collect()
        };

        assert_eq!(build().columns(), build().columns());
    }

    #[test]
    fn test_statistic_columns_follow_first_seen_order() {
        let first = parse("\tTrait: x y\n\n\t\tRhoG is 0.1\n");
        let second = parse("\tTrait: x y\n\n\t\tRhoE is 0.2\n\t\tRhoG is 0.3\n");

        let table: Table = vec![first, second].into_iter().collect();
        assert_eq!(column_names(&table), vec!["A", "B", "RhoG", "RhoE"]);
    }

    #[test]
    fn test_adding_rows_does_not_change_earlier_rows() {
        let mut assembler = TableAssembler::new();
        assembler.add(&parse(UNIVARIATE_REPORT));
        let before = assembler.rows[0].clone();

        assembler.add(&parse(BIVARIATE_REPORT));
        assert_eq!(assembler.len(), 2);

        let table = assembler.finalize();
        assert_eq!(table.rows()[0], before);
    }

    #[test]
    fn test_zero_trait_record() {
        let table: Table = vec![parse("\tPedigree: ped.csv\n\tTrait:\n\n\t\tRhoE is 0.5\n")]
            .into_iter()
            .collect();

        assert_eq!(column_names(&table), vec!["Pedigree", "RhoE"]);
    }

    #[test]
    fn test_metadata_clashing_with_trait_label() {
        let table: Table = vec![parse("\tTrait: x\tA: clash\n\n")].into_iter().collect();

        assert_eq!(column_names(&table), vec!["A"]);
        assert_eq!(table.cell(0, "A").unwrap().to_string(), "x");
    }

    #[test]
    fn test_statistic_clashing_with_header_field() {
        let table: Table = vec![parse("\tTrait: x y\tRhoE: note\n\n\t\tRhoE is 0.5\n")]
            .into_iter()
            .collect();

        assert_eq!(column_names(&table), vec!["A", "B", "RhoE"]);
        assert_eq!(table.cell(0, "RhoE").unwrap().to_string(), "note");
    }

    #[test]
    fn test_statistic_clashing_with_trait_label() {
        let table: Table = vec![parse("\tTrait: x y\n\n\t\tA is 0.5\n\t\tRhoG is 0.2\n")]
            .into_iter()
            .collect();

        assert_eq!(column_names(&table), vec!["A", "B", "RhoG"]);
        assert_eq!(table.cell(0, "A").unwrap().to_string(), "x");
        assert_eq!(table.cell(0, "RhoG").unwrap().to_string(), "0.2");
    }

    #[test]
    fn test_dotted_variable_clashing_with_trait_scoped_statistic() {
        let table: Table = vec![parse(
            "\tTrait: bmi height\n\n\t\tH2r(bmi) is 0.4\n\t\tH2r.A is 0.9\n",
        )]
        .into_iter()
        .collect();

        assert_eq!(column_names(&table), vec!["A", "B", "H2r.A"]);
        assert_eq!(table.cell(0, "H2r.A").unwrap().to_string(), "0.4");
    }

    #[test]
    fn test_report_columns_are_distinct() {
        for text in [BIVARIATE_REPORT, UNIVARIATE_REPORT, SMALL_REPORTS[0], SMALL_REPORTS[1]] {
            let record = parse(text);

            let keys: Vec<ColumnKey> = record
                .traits
                .iter()
                .map(|declared| ColumnKey::trait_label(declared.label))
                .chain(record.metadata.iter().map(|(field, _)| ColumnKey::metadata(field)))
                .chain(record.statistics.iter().map(ColumnKey::for_statistic))
                .collect();
            let distinct: HashSet<&ColumnKey> = keys.iter().collect();
            assert_eq!(distinct.len(), keys.len());

            // Nothing was dropped on the way into the row
            let table: Table = vec![record].into_iter().collect();
            assert_eq!(table.rows()[0].len(), keys.len());
        }
    }

    #[test]
    fn test_empty_table() {
        let table = TableAssembler::new().finalize();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    const SMALL_REPORTS: [&str; 2] = [
        "\tTrait: x y\n\n\t\tRhoG is 0.1\n\t\tRhoG Std. Error: 0.01\n",
        "\tPedigree: ped.csv\n\tTrait: q\tSex: both\n\n\t\tH2r is 0.2\n",
    ];

    proptest! {
        /// Property: any ordering of the same records yields the same columns
        #[test]
        fn prop_column_set_independent_of_order(order in Just(vec![0usize, 1, 2, 3]).prop_shuffle()) {
            let reports = [UNIVARIATE_REPORT, BIVARIATE_REPORT, SMALL_REPORTS[0], SMALL_REPORTS[1]];

            let baseline: Table = reports.iter().map(|text| parse(text)).collect();
            let shuffled: Table = order.iter().map(|&i| parse(reports[i])).collect();

            let baseline_set: HashSet<_> = baseline.columns().iter().cloned().collect();
            let shuffled_set: HashSet<_> = shuffled.columns().iter().cloned().collect();
            prop_assert_eq!(baseline_set, shuffled_set);
            prop_assert_eq!(baseline.columns().len(), shuffled.columns().len());
        }
    }
}
