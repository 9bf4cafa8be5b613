// src/sources/reader.rs
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::core::RawRow;

/// Every `.csv` file under `root` (extension case-insensitive), sorted.
pub fn scan_csv_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Data lake directory {} does not exist", root.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Header row of a CSV, trimmed. Empty when the file has no header.
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_rows_from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parses CSV data into rows keyed by the trimmed header names. Short rows
/// get empty values for their missing columns; extra cells are dropped.
pub fn read_rows_from_reader<R: Read>(rdr: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.as_str(), record.get(i).unwrap_or("")))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_rows_keyed_by_trimmed_headers() {
        let data = " player_id , player_name ,club\n28003,Lionel Messi,Inter Miami\n8198,Cristiano Ronaldo\n";
        let rows = read_rows_from_reader(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("player_name"), Some("Lionel Messi"));
        assert_eq!(rows[1].get("club"), Some(""));
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let rows = read_rows_from_reader("id,name\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_scan_is_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::write(dir.path().join("b/nested/players.CSV"), "id\n").unwrap();
        fs::write(dir.path().join("a.csv"), "id\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = scan_csv_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.csv", "b/nested/players.CSV"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        assert!(scan_csv_files(&dir.path().join("missing")).is_err());
    }
}
