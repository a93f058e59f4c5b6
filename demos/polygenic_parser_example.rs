// ==============================================================================
// polygenic_parser_example.rs - Example of Polygenic Report Parsing
// ==============================================================================
// Description: Demonstrates parsing a SOLAR polygenic.out report and
//              tabulating it with a univariate run
// Author: Matthew Barham
// Created: 2025-11-06
// Modified: 2026-10-17
// Version: 2.0.0
// ==============================================================================

use solar_tabulate::column_key::ColumnKey;
use solar_tabulate::output::{OutputFormat, TableWriter, DEFAULT_NA_VALUE};
use solar_tabulate::parsers::PolygenicParser;
use solar_tabulate::table::Table;
use std::io::Write;
use tempfile::NamedTempFile;

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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Polygenic Report Parser Example ===\n");

    // Write the bivariate report to a temporary polygenic.out
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(BIVARIATE_REPORT.as_bytes())?;
    temp_file.flush()?;

    println!("Created temporary report: {:?}\n", temp_file.path());

    let record = PolygenicParser::parse_file(temp_file.path())?;

    println!("--- Traits ---");
    for declared in &record.traits {
        println!("{}  {}", declared.label, declared.name);
    }

    println!("\n--- Header ---");
    for (field, value) in &record.metadata {
        println!("{:<12} {}", field, value);
    }

    println!("\n--- Statistics ---");
    println!("{:<20} {:>14}", "Column", "Value");
    println!("{:-<35}", "");
    for entry in &record.statistics {
        println!("{:<20} {:>14}", ColumnKey::for_statistic(entry), entry.value);
    }

    // Merge with a univariate run; its B columns come out as NA
    let univariate = PolygenicParser::parse(UNIVARIATE_REPORT)?;
    let table: Table = vec![record, univariate].into_iter().collect();

    println!("\n--- Table ({} rows x {} columns) ---", table.len(), table.columns().len());
    TableWriter::new(OutputFormat::Tsv, DEFAULT_NA_VALUE).write(&table, std::io::stdout())?;

    Ok(())
}
