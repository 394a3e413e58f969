//! Preset library file format (export / import).
//!
//! Exported files wrap the saved collection in a versioned envelope:
//!
//! ```json
//! { "version": 1, "exported_at": "2026-01-01T00:00:00Z", "presets": [ ... ] }
//! ```
//!
//! Imports only require the envelope to carry a `presets` array; entries
//! are decoded one by one so a single bad entry does not reject the file.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::preset::LayerPreset;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Envelope version written by this client.
pub const LIBRARY_VERSION: u32 = 1;

/// Suggested file name for exports.
pub const EXPORT_FILE_NAME: &str = "maptoposter-layer-presets.json";

// ---------------------------------------------------------------------------
// Export envelope
// ---------------------------------------------------------------------------

/// A portable snapshot of the saved preset collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetLibrary {
    pub version: u32,
    /// UTC timestamp of the export.
    pub exported_at: Timestamp,
    pub presets: Vec<LayerPreset>,
}

impl PresetLibrary {
    pub fn new(presets: Vec<LayerPreset>) -> Self {
        Self {
            version: LIBRARY_VERSION,
            exported_at: chrono::Utc::now(),
            presets,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Format(format!("Failed to encode preset library: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Import envelope
// ---------------------------------------------------------------------------

/// A structurally valid import payload.
///
/// Only the envelope shape has been checked; [`valid_presets`](Self::valid_presets)
/// yields the entries that decode and carry a name and tag key.
#[derive(Debug, Clone)]
pub struct ImportEnvelope {
    pub version: Option<u64>,
    entries: Vec<serde_json::Value>,
}

impl ImportEnvelope {
    /// Parse the text of a library file.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| CoreError::Format(format!("File is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Check the envelope shape: an object whose `presets` field is an array.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        let serde_json::Value::Object(mut obj) = value else {
            return Err(CoreError::Format("Invalid preset file format.".to_string()));
        };

        let entries = match obj.remove("presets") {
            Some(serde_json::Value::Array(entries)) => entries,
            _ => return Err(CoreError::Format("Invalid preset file format.".to_string())),
        };

        Ok(Self {
            version: obj.get("version").and_then(serde_json::Value::as_u64),
            entries,
        })
    }

    /// Number of raw entries, valid or not.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries that decode as presets with a non-empty name and tag key,
    /// in file order.
    pub fn valid_presets(&self) -> Vec<LayerPreset> {
        self.entries
            .iter()
            .filter_map(|entry| serde_json::from_value::<LayerPreset>(entry.clone()).ok())
            .filter(LayerPreset::is_valid)
            .collect()
    }
}

impl From<&PresetLibrary> for ImportEnvelope {
    fn from(library: &PresetLibrary) -> Self {
        Self {
            version: Some(u64::from(library.version)),
            entries: library
                .presets
                .iter()
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Import mode
// ---------------------------------------------------------------------------

/// How an import combines with the current saved collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep current presets; incoming ones replace same-named entries or append.
    Merge,
    /// Replace the saved collection with the incoming presets.
    Overwrite,
}

impl ImportMode {
    /// Interpret a free-text answer (`" Merge "` reads as `Merge`).
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "merge" => Some(Self::Merge),
            "overwrite" => Some(Self::Overwrite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read a library file to completion and check its envelope.
pub async fn read_library_file(path: &Path) -> Result<ImportEnvelope, CoreError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::Storage(format!("Failed to read {}: {e}", path.display())))?;
    ImportEnvelope::parse(&text)
}

/// Write `library` as pretty-printed JSON.
pub async fn write_library_file(path: &Path, library: &PresetLibrary) -> Result<(), CoreError> {
    let json = library.to_json_pretty()?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| CoreError::Storage(format!("Failed to write {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::LayerSettings;
    use assert_matches::assert_matches;

    #[test]
    fn envelope_requires_presets_array() {
        assert_matches!(ImportEnvelope::parse("[]"), Err(CoreError::Format(_)));
        assert_matches!(ImportEnvelope::parse("{}"), Err(CoreError::Format(_)));
        assert_matches!(
            ImportEnvelope::parse(r#"{"presets": {"name": "A"}}"#),
            Err(CoreError::Format(_))
        );
        assert_matches!(ImportEnvelope::parse("not json"), Err(CoreError::Format(_)));
    }

    #[test]
    fn envelope_accepts_missing_version() {
        let envelope = ImportEnvelope::parse(r#"{"presets": []}"#).unwrap();
        assert_eq!(envelope.version, None);
        assert_eq!(envelope.entry_count(), 0);
    }

    #[test]
    fn valid_presets_drops_incomplete_entries() {
        let envelope = ImportEnvelope::parse(
            r#"{"version": 1, "presets": [
                {"name": "A", "settings": {"tag_key": "k"}},
                {"name": "", "settings": {"tag_key": "k"}},
                {"name": "B", "settings": {"tag_key": ""}},
                {"name": "C"},
                42,
                {"name": "D", "settings": {"tag_key": "amenity", "line_width": "0.7"}}
            ]}"#,
        )
        .unwrap();

        let presets = envelope.valid_presets();
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "D"]);
        assert_eq!(presets[1].settings.line_width, 0.7);
        assert_eq!(envelope.entry_count(), 6);
        assert_eq!(envelope.version, Some(1));
    }

    #[test]
    fn library_json_carries_version_and_timestamp() {
        let library = PresetLibrary::new(vec![LayerPreset::new("A", LayerSettings::for_tag("k"))]);
        let value: serde_json::Value =
            serde_json::from_str(&library.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["version"], 1);
        assert!(value["exported_at"].as_str().unwrap().contains('T'));
        assert_eq!(value["presets"][0]["name"], "A");
    }

    #[test]
    fn import_mode_parsing() {
        assert_eq!(ImportMode::parse("merge"), Some(ImportMode::Merge));
        assert_eq!(ImportMode::parse("  OverWrite "), Some(ImportMode::Overwrite));
        assert_eq!(ImportMode::parse("replace"), None);
        assert_eq!(ImportMode::parse(""), None);
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        let library = PresetLibrary::new(vec![
            LayerPreset::new("A", LayerSettings::for_tag("k")).with_description("first"),
        ]);

        write_library_file(&path, &library).await.unwrap();
        let envelope = read_library_file(&path).await.unwrap();

        assert_eq!(envelope.valid_presets(), library.presets);
    }

    #[tokio::test]
    async fn reading_missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_library_file(&dir.path().join("absent.json")).await;
        assert_matches!(result, Err(CoreError::Storage(_)));
    }
}
