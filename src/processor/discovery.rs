//! Input discovery for batch processing.
//!
//! Expands the paths given on the command line into a sorted, de-duplicated
//! list of export files: files are taken as given, directories are walked
//! recursively for `*.csv`.

use crate::constants::CSV_EXTENSION;
use crate::error::{PrecipError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Resolve files and directories into the export files to process
pub fn discover_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for input in inputs {
        if !input.exists() {
            return Err(PrecipError::InputNotFound {
                path: input.clone(),
            });
        }

        if input.is_file() {
            files.insert(input.clone());
            continue;
        }

        debug!("Searching for CSV files in: {}", input.display());
        for entry in WalkDir::new(input).follow_links(true) {
            let entry = entry.map_err(|e| PrecipError::ProcessingFailed {
                path: input.clone(),
                reason: format!("Failed to walk directory: {}", e),
            })?;
            if entry.file_type().is_file() && is_csv_file(entry.path()) {
                files.insert(entry.into_path());
            }
        }
    }

    debug!("Discovered {} input files", files.len());
    Ok(files.into_iter().collect())
}

/// Check if a file has a .csv extension (case-insensitive)
pub fn is_csv_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_csv_file() {
        assert!(is_csv_file(Path::new("moab.csv")));
        assert!(is_csv_file(Path::new("MOAB.CSV")));
        assert!(!is_csv_file(Path::new("moab.txt")));
        assert!(!is_csv_file(Path::new("moab")));
    }

    #[test]
    fn test_discovers_nested_csv_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("2020").join("synoptic");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join("meteoblue.csv"), "x").unwrap();
        fs::write(nested.join("moab1.csv"), "x").unwrap();
        fs::write(nested.join("notes.txt"), "x").unwrap();

        let files = discover_inputs(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_csv_file(f)));
    }

    #[test]
    fn test_explicit_files_are_kept_and_deduplicated() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("export.txt");
        fs::write(&file, "x").unwrap();

        let files = discover_inputs(&[file.clone(), file.clone()]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.csv");
        assert!(matches!(
            discover_inputs(&[missing]),
            Err(PrecipError::InputNotFound { .. })
        ));
    }
}
