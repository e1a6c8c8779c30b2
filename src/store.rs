use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::models::GraduateRecord;

pub const SUBSET_PREFIX: &str = "mujeres_";

/// Column order of every persisted table; must match the serde field order
/// of `GraduateRecord` and never change between runs.
const COLUMNS: [&str; 7] = [
    "program",
    "full_name",
    "paternal_surname",
    "maternal_surname",
    "first_given_name",
    "second_given_name",
    "graduation_year",
];

/// Replace path-invalid (and Excel-problematic) characters with `_`,
/// keeping accents. Stable across runs so stages agree on file names.
pub fn sanitize_program_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect();
    let sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

pub fn table_path(out_dir: &Path, program: &str) -> PathBuf {
    out_dir.join(format!("{}.csv", sanitize_program_filename(program)))
}

pub fn subset_path(out_dir: &Path, program: &str) -> PathBuf {
    out_dir.join(format!(
        "{SUBSET_PREFIX}{}.csv",
        sanitize_program_filename(program)
    ))
}

pub fn write_table(path: &Path, records: &[GraduateRecord]) -> anyhow::Result<()> {
    // Header written by hand so zero-row tables still carry one.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_table(path: &Path) -> anyhow::Result<Vec<GraduateRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: GraduateRecord =
            result.with_context(|| format!("malformed row in {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}

/// Full program tables in `out_dir`: every `*.csv` not prefixed `mujeres_`,
/// as (file stem, path) pairs sorted by stem. The stem is the program
/// identifier the classify and stats stages key on.
pub fn list_program_tables(out_dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(out_dir)
        .with_context(|| format!("failed to read output directory {}", out_dir.display()))?;
    let mut tables = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().map_or(true, |ext| ext != "csv") {
            continue;
        }
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        if stem.starts_with(SUBSET_PREFIX) {
            continue;
        }
        tables.push((stem, path));
    }
    tables.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(
            sanitize_program_filename("INGENIERÍA EN COMPUTACIÓN"),
            "INGENIERÍA EN COMPUTACIÓN"
        );
        assert_eq!(sanitize_program_filename("A/B:C?"), "A_B_C_");
        assert_eq!(sanitize_program_filename("   "), "unknown");
    }

    #[test]
    fn subset_path_uses_prefix() {
        let path = subset_path(Path::new("output"), "DERECHO");
        assert_eq!(path, PathBuf::from("output/mujeres_DERECHO.csv"));
    }
}
