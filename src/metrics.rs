//! Extraction of per-sample metrics tables from tool report directories.
//!
//! Each submodule handles one report format: it parses a single report into a
//! typed metrics struct and extracts a whole directory of reports into a
//! [`Table`](crate::table::Table) with one record per sample. The sample
//! identifier is recovered from the report file name, which upstream
//! pipelines write as `<sample_id>.<suffix>.txt`.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::errors::Error;
use crate::errors::Result;

pub mod duplication;
pub mod flagstat;
pub mod insert_size;
pub mod sample_sheet;
pub mod wgs;

/// Lists the per-sample report files within `dir`.
///
/// Only files with a `.txt` extension are considered. The sample identifier
/// is the portion of the file name before the first `.`. Results are sorted
/// by sample identifier so that extraction order (and therefore output row
/// order) does not depend on directory listing order.
///
/// The directory itself is required: a missing directory is an error, an
/// empty one yields an empty listing. Two reports resolving to the same
/// sample identifier are also an error.
pub fn sample_files<P>(dir: P) -> Result<Vec<(String, PathBuf)>>
where
    P: AsRef<Path>,
{
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(Error::MissingRequiredFile {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|source| Error::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|source| Error::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();

        if path.extension().map(|ext| ext == "txt").unwrap_or(false) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let sample_id = name.split('.').next().unwrap_or_default().to_string();

            files.push((sample_id, path));
        }
    }

    files.sort();

    for pair in files.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(Error::malformed(
                &pair[1].1,
                format!("duplicate sample id '{}'", pair[1].0),
            ));
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    pub fn test_lists_reports_sorted_by_sample_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s2.markdups.txt"), "x").unwrap();
        std::fs::write(dir.path().join("s1.markdups.txt"), "x").unwrap();
        std::fs::write(dir.path().join("notes.log"), "x").unwrap();

        let files = sample_files(dir.path()).unwrap();

        let ids = files.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["s1", "s2"]);
    }

    #[test]
    pub fn test_an_empty_directory_yields_an_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sample_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    pub fn test_a_missing_directory_is_an_error() {
        let err = sample_files("/nonexistent/flagstat_metrics").unwrap_err();
        assert!(matches!(err, Error::MissingRequiredFile { .. }));
    }

    #[test]
    pub fn test_two_reports_for_one_sample_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s1.markdups.txt"), "x").unwrap();
        std::fs::write(dir.path().join("s1.flagstat.txt"), "x").unwrap();

        let err = sample_files(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }
}
