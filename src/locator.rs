// ==============================================================================
// locator.rs - Report File Location
// ==============================================================================
// Description: Resolves command-line paths to polygenic.out files and reads
//              their text
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File SOLAR writes into each polygenic run directory
pub const REPORT_FILE_NAME: &str = "polygenic.out";

/// Errors that can occur while locating or reading a report
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("SOLAR results not found at '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("could not access '{}': {source}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not a valid text file: {0}")]
    NotText(std::io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A located report and its contents
#[derive(Debug, Clone)]
pub struct ReportSource {
    pub path: PathBuf,
    pub text: String,
}

/// Directories are assumed to be SOLAR run directories and resolve to the
/// report they directly contain; any other path is taken as the report
pub fn resolve_report_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(REPORT_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Resolve `path` and read the report text
pub fn read_report(path: &Path) -> Result<ReportSource, LocateError> {
    let path = resolve_report_path(path);
    debug!("Reading report: {:?}", path);

    if !path.exists() {
        return Err(LocateError::NotFound(path));
    }

    let text = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => LocateError::PermissionDenied {
            path: path.clone(),
            source: e,
        },
        ErrorKind::InvalidData => LocateError::NotText(e),
        _ => LocateError::IoError(e),
    })?;

    Ok(ReportSource { path, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_directory_resolves_to_report() {
        let dir = TempDir::new().unwrap();

        assert_eq!(
            resolve_report_path(dir.path()),
            dir.path().join("polygenic.out")
        );
    }

    #[test]
    fn test_file_resolves_to_itself() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("renamed.out");
        fs::write(&file, "\tTrait: bmi\n").unwrap();

        assert_eq!(resolve_report_path(&file), file);
    }

    #[test]
    fn test_read_report_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(REPORT_FILE_NAME), "\tTrait: bmi\n").unwrap();

        let source = read_report(dir.path()).unwrap();
        assert_eq!(source.path, dir.path().join(REPORT_FILE_NAME));
        assert_eq!(source.text, "\tTrait: bmi\n");
    }

    #[test]
    fn test_nested_report_not_searched() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("run1");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join(REPORT_FILE_NAME), "\tTrait: bmi\n").unwrap();

        match read_report(dir.path()).unwrap_err() {
            LocateError::NotFound(path) => assert_eq!(path, dir.path().join(REPORT_FILE_NAME)),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_binary_file_is_not_text() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(REPORT_FILE_NAME);
        fs::write(&file, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let error = read_report(&file).unwrap_err();
        assert!(matches!(error, LocateError::NotText(_)));
        assert!(error.to_string().starts_with("not a valid text file"));
    }
}
