//! JSON manifest listing the available periods.
//!
//! The manifest is an array in chronological order:
//!
//! ```json
//! [
//!   { "identifier": "world_bc2000.geojson", "label": "2000 BC" },
//!   { "identifier": "world_bc1000.geojson", "label": "1000 BC" }
//! ]
//! ```
//!
//! Ordinals are assigned by position. A missing label defaults to the
//! identifier.

use std::path::Path;

use serde::Deserialize;

use super::{Period, PeriodError, PeriodTable};

/// One manifest entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub identifier: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Parse a manifest document into a period table.
pub fn parse_manifest(json: &str) -> Result<PeriodTable, PeriodError> {
    let entries: Vec<ManifestEntry> = serde_json::from_str(json)?;
    let periods = entries
        .into_iter()
        .enumerate()
        .map(|(ordinal, entry)| {
            let label = entry.label.unwrap_or_else(|| entry.identifier.clone());
            Period::new(ordinal, entry.identifier, label)
        })
        .collect();
    PeriodTable::new(periods)
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<PeriodTable, PeriodError> {
    let json = std::fs::read_to_string(path).map_err(|source| PeriodError::ManifestRead {
        path: path.display().to_string(),
        source,
    })?;
    let table = parse_manifest(&json)?;
    tracing::debug!(path = %path.display(), periods = table.len(), "Loaded period manifest");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_manifest_assigns_ordinals() {
        let table = parse_manifest(
            r#"[
                {"identifier": "world_bc2000.geojson", "label": "2000 BC"},
                {"identifier": "world_100.geojson"}
            ]"#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let second = table.get(1).unwrap();
        assert_eq!(second.ordinal, 1);
        assert_eq!(second.display_label, "world_100.geojson");
        assert_eq!(table.get(0).unwrap().display_label, "2000 BC");
    }

    #[test]
    fn test_parse_manifest_rejects_garbage() {
        assert!(matches!(
            parse_manifest("{not json"),
            Err(PeriodError::ManifestParse(_))
        ));
    }

    #[test]
    fn test_load_manifest_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"identifier": "a"}}, {{"identifier": "b"}}]"#).unwrap();

        let table = load_manifest(file.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_load_manifest_missing_file() {
        let result = load_manifest(Path::new("/nonexistent/periods.json"));
        assert!(matches!(result, Err(PeriodError::ManifestRead { .. })));
    }
}
