//! The layer-preset store.
//!
//! [`PresetStore`] owns the saved preset collection and merges it with the
//! built-in presets for display and lookup. The saved collection is the
//! sole source of truth in durable storage: every successful mutation
//! writes the whole collection under [`PRESETS_STORAGE_KEY`] before
//! returning, and the in-memory copy is only updated once that write has
//! succeeded.

use crate::error::CoreError;
use crate::preset::{builtin_presets, builtin_preset, LayerPreset, PresetSelector};
use crate::preset_library::{ImportEnvelope, ImportMode, PresetLibrary};
use crate::storage::KeyValueStore;

/// Storage key holding the saved collection (a JSON array, no envelope).
pub const PRESETS_STORAGE_KEY: &str = "customLayerPresets";

/// Display group of a preset list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetGroup {
    Custom,
    BuiltIn,
    Saved,
}

/// One row of the preset picker.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetEntry<'a> {
    pub selector: PresetSelector,
    pub label: &'a str,
    pub description: Option<&'a str>,
    pub group: PresetGroup,
}

/// Built-in plus saved presets, with persistence through `S`.
pub struct PresetStore<S> {
    storage: S,
    saved: Vec<LayerPreset>,
}

impl<S: KeyValueStore> PresetStore<S> {
    /// Load the saved collection from `storage`.
    ///
    /// A read failure or a corrupt stored value yields an empty collection.
    /// Entries that do not decode or lack a name or tag key are dropped, and
    /// duplicate names collapse to the last occurrence.
    pub fn load(storage: S) -> Self {
        let saved = match storage.get(PRESETS_STORAGE_KEY) {
            Ok(Some(raw)) => decode_saved(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read saved presets, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(count = saved.len(), "Loaded saved presets");
        Self { storage, saved }
    }

    /// The saved collection in display order.
    pub fn saved(&self) -> &[LayerPreset] {
        &self.saved
    }

    pub fn saved_count(&self) -> usize {
        self.saved.len()
    }

    pub fn has_saved(&self) -> bool {
        !self.saved.is_empty()
    }

    /// Entries for the preset picker: Custom, then built-ins, then saved.
    ///
    /// The returned iterator is lazy and `Clone`, so it can be walked more
    /// than once; it never touches storage.
    pub fn list(&self) -> impl Iterator<Item = PresetEntry<'_>> + Clone + '_ {
        let custom = std::iter::once(PresetEntry {
            selector: PresetSelector::Custom,
            label: "Custom",
            description: None,
            group: PresetGroup::Custom,
        });

        let builtins = builtin_presets().iter().map(|b| PresetEntry {
            selector: PresetSelector::builtin(b.key),
            label: b.preset.name.as_str(),
            description: b.preset.description.as_deref(),
            group: PresetGroup::BuiltIn,
        });

        let saved = self.saved.iter().map(|p| PresetEntry {
            selector: PresetSelector::saved(p.name.as_str()),
            label: p.name.as_str(),
            description: p.description.as_deref(),
            group: PresetGroup::Saved,
        });

        custom.chain(builtins).chain(saved)
    }

    /// Look up the preset a selector points at.
    ///
    /// Unknown keys and names resolve to `None`, as does `Custom`.
    pub fn resolve(&self, selector: &PresetSelector) -> Option<&LayerPreset> {
        match selector {
            PresetSelector::Custom => None,
            PresetSelector::Builtin(key) => builtin_preset(key),
            PresetSelector::Saved(name) => self.saved.iter().find(|p| &p.name == name),
        }
    }

    /// Save `preset`, replacing a saved preset of the same name or appending.
    ///
    /// A blank colour is stored as the default colour.
    pub fn save(&mut self, preset: LayerPreset) -> Result<(), CoreError> {
        preset.validate()?;
        let preset = preset.normalized();

        let mut next = self.saved.clone();
        let name = preset.name.clone();
        upsert(&mut next, preset);
        self.commit(next)?;

        tracing::info!(name = %name, count = self.saved.len(), "Saved layer preset");
        Ok(())
    }

    /// Delete the saved preset called `name`.
    ///
    /// Returns whether a preset was removed. An absent name is a no-op.
    pub fn delete(&mut self, name: &str) -> Result<bool, CoreError> {
        if !self.saved.iter().any(|p| p.name == name) {
            return Ok(false);
        }

        let next: Vec<_> = self.saved.iter().filter(|p| p.name != name).cloned().collect();
        self.commit(next)?;

        tracing::info!(name = %name, count = self.saved.len(), "Deleted layer preset");
        Ok(true)
    }

    /// Remove every saved preset.
    pub fn delete_all(&mut self) -> Result<(), CoreError> {
        self.storage.remove(PRESETS_STORAGE_KEY)?;
        let removed = std::mem::take(&mut self.saved).len();

        tracing::info!(removed, "Deleted all layer presets");
        Ok(())
    }

    /// Snapshot the saved collection for export.
    ///
    /// Returns `None` when there is nothing to export. Built-ins are never
    /// included.
    pub fn export(&self) -> Option<PresetLibrary> {
        if self.saved.is_empty() {
            return None;
        }
        Some(PresetLibrary::new(self.saved.clone()))
    }

    /// Apply an import envelope.
    ///
    /// `Overwrite` starts from an empty collection, `Merge` from the current
    /// one; each valid incoming preset then replaces a same-named entry or is
    /// appended, so later entries in the file win. Returns the number of
    /// incoming presets applied.
    pub fn import(&mut self, envelope: &ImportEnvelope, mode: ImportMode) -> Result<usize, CoreError> {
        let incoming = envelope.valid_presets();
        let accepted = incoming.len();
        let dropped = envelope.entry_count() - accepted;

        let mut next = match mode {
            ImportMode::Overwrite => Vec::new(),
            ImportMode::Merge => self.saved.clone(),
        };
        for preset in incoming {
            upsert(&mut next, preset);
        }
        self.commit(next)?;

        tracing::info!(
            mode = %mode,
            accepted,
            dropped,
            count = self.saved.len(),
            "Imported layer presets",
        );
        Ok(accepted)
    }

    // ---- private helpers ----

    /// Persist `next`, then make it the in-memory collection.
    fn commit(&mut self, next: Vec<LayerPreset>) -> Result<(), CoreError> {
        let json = serde_json::to_string(&next)
            .map_err(|e| CoreError::Storage(format!("Failed to encode presets: {e}")))?;
        self.storage.set(PRESETS_STORAGE_KEY, &json)?;
        self.saved = next;
        Ok(())
    }
}

/// Replace the same-named entry in place, or append.
fn upsert(presets: &mut Vec<LayerPreset>, preset: LayerPreset) {
    match presets.iter_mut().find(|p| p.name == preset.name) {
        Some(existing) => *existing = preset,
        None => presets.push(preset),
    }
}

fn decode_saved(raw: &str) -> Vec<LayerPreset> {
    let entries = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(_) | Err(_) => {
            tracing::warn!("Stored presets are corrupt, starting empty");
            return Vec::new();
        }
    };

    let mut saved = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<LayerPreset>(entry) {
            Ok(preset) if preset.is_valid() => upsert(&mut saved, preset),
            _ => tracing::warn!("Skipping unreadable stored preset"),
        }
    }
    saved
}
