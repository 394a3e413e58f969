//! User-facing preset flows.
//!
//! Each action wraps one [`PresetStore`] operation with the checks, the
//! confirmation and the status line the preset panel shows. Failures are
//! reported through [`PresetStatus`] rather than returned, since none of
//! them end the session.

use std::fmt;
use std::path::Path;

use crate::generation::RawFields;
use crate::preset::{LayerPreset, PresetSelector};
use crate::preset_library::{read_library_file, write_library_file, ImportMode};
use crate::preset_store::PresetStore;
use crate::prompt::Confirmer;
use crate::storage::KeyValueStore;

/// Prompt text for the import mode question.
pub const IMPORT_MODE_PROMPT: &str = r#"Import presets: type "merge" or "overwrite"."#;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetStatusKind {
    Success,
    Error,
    Info,
}

/// The status line shown after a preset action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetStatus {
    pub message: String,
    pub kind: PresetStatusKind,
}

impl PresetStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: PresetStatusKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: PresetStatusKind::Error,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: PresetStatusKind::Info,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == PresetStatusKind::Error
    }
}

impl fmt::Display for PresetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Save the custom-layer fields as a preset called `name`.
///
/// On success `active` points at the new preset.
pub fn save_from_fields<S: KeyValueStore>(
    store: &mut PresetStore<S>,
    fields: &RawFields,
    name: &str,
    description: &str,
    active: &mut PresetSelector,
) -> PresetStatus {
    if !fields.custom_layer_enabled {
        return PresetStatus::error("Enable the custom layer before saving a preset.");
    }

    let name = name.trim();
    if name.is_empty() {
        return PresetStatus::error("Please enter a preset name.");
    }

    let settings = fields.custom_layer_settings();
    if settings.tag_key.is_empty() {
        return PresetStatus::error("Please provide a tag key for the preset.");
    }

    let mut preset = LayerPreset::new(name, settings);
    let description = description.trim();
    if !description.is_empty() {
        preset = preset.with_description(description);
    }

    match store.save(preset) {
        Ok(()) => {
            *active = PresetSelector::saved(name);
            PresetStatus::success(format!("Preset \"{name}\" saved."))
        }
        Err(e) => PresetStatus::error(format!("Failed to save preset: {e}")),
    }
}

/// Delete the saved preset `active` points at, after confirmation.
///
/// Returns `None` when the user declines. On success `active` resets to
/// [`PresetSelector::Custom`].
pub fn delete_selected<S: KeyValueStore>(
    store: &mut PresetStore<S>,
    active: &mut PresetSelector,
    confirmer: &mut impl Confirmer,
) -> Option<PresetStatus> {
    let Some(name) = active.saved_name().map(str::to_string) else {
        return Some(PresetStatus::error("Select a saved preset to delete."));
    };

    if !confirmer.confirm(&format!("Delete preset \"{name}\"?")) {
        return None;
    }

    Some(match store.delete(&name) {
        Ok(_) => {
            *active = PresetSelector::Custom;
            PresetStatus::success(format!("Preset \"{name}\" deleted."))
        }
        Err(e) => PresetStatus::error(format!("Failed to delete preset: {e}")),
    })
}

/// Delete every saved preset, after confirmation.
///
/// Returns `None` when the user declines.
pub fn delete_all<S: KeyValueStore>(
    store: &mut PresetStore<S>,
    confirmer: &mut impl Confirmer,
) -> Option<PresetStatus> {
    if !store.has_saved() {
        return Some(PresetStatus::error("No saved presets to delete."));
    }

    if !confirmer.confirm("Delete all saved presets? This cannot be undone.") {
        return None;
    }

    Some(match store.delete_all() {
        Ok(()) => PresetStatus::success("All saved presets deleted."),
        Err(e) => PresetStatus::error(format!("Failed to delete presets: {e}")),
    })
}

/// Write the saved collection to `path` as a library file.
pub async fn export_to<S: KeyValueStore>(store: &PresetStore<S>, path: &Path) -> PresetStatus {
    let Some(library) = store.export() else {
        return PresetStatus::error("No saved presets to export.");
    };

    match write_library_file(path, &library).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), count = library.presets.len(), "Exported layer presets");
            PresetStatus::success("Presets exported.")
        }
        Err(e) => PresetStatus::error(format!("Failed to export presets: {e}")),
    }
}

/// Import a library file, asking for the mode once the file has been
/// read and checked.
pub async fn import_from<S: KeyValueStore>(
    store: &mut PresetStore<S>,
    path: &Path,
    confirmer: &mut impl Confirmer,
) -> PresetStatus {
    let envelope = match read_library_file(path).await {
        Ok(envelope) => envelope,
        Err(e) => return PresetStatus::error(format!("Failed to import presets: {e}")),
    };

    let Some(answer) = confirmer.prompt(IMPORT_MODE_PROMPT, ImportMode::Merge.as_str()) else {
        return PresetStatus::error("Import canceled.");
    };
    let Some(mode) = ImportMode::parse(&answer) else {
        return PresetStatus::error(r#"Import canceled. Use "merge" or "overwrite"."#);
    };

    match store.import(&envelope, mode) {
        Ok(_) => PresetStatus::success(format!("Presets imported ({mode}).")),
        Err(e) => PresetStatus::error(format!("Failed to import presets: {e}")),
    }
}

/// Copy the preset `selector` resolves to into the custom-layer fields.
///
/// Returns the preset description to display. Unknown selectors and
/// `Custom` leave the fields untouched.
pub fn apply_preset<S: KeyValueStore>(
    store: &PresetStore<S>,
    fields: &mut RawFields,
    selector: &PresetSelector,
) -> Option<String> {
    let preset = store.resolve(selector)?;
    fields.apply_preset(preset);
    preset.description.clone().filter(|d| !d.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
