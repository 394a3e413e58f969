//! Integration tests for the preset store against both storage backends.
//!
//! Covers the library laws (export/overwrite round trip, merge
//! idempotence), built-in isolation, and persistence across reloads.

use std::sync::Arc;

use maptoposter_core::preset::{
    builtin_preset, LayerMode, LayerPreset, LayerSettings, PresetSelector,
};
use maptoposter_core::preset_library::{
    read_library_file, write_library_file, ImportEnvelope, ImportMode,
};
use maptoposter_core::preset_store::{PresetGroup, PresetStore, PRESETS_STORAGE_KEY};
use maptoposter_core::storage::{FileStore, KeyValueStore, MemoryStore};

fn preset(name: &str, tag_key: &str, color: &str) -> LayerPreset {
    LayerPreset::new(
        name,
        LayerSettings {
            color: color.to_string(),
            ..LayerSettings::for_tag(tag_key)
        },
    )
}

fn memory_store(presets: &[LayerPreset]) -> PresetStore<Arc<MemoryStore>> {
    let mut store = PresetStore::load(Arc::new(MemoryStore::new()));
    for p in presets {
        store.save(p.clone()).unwrap();
    }
    store
}

// ---------------------------------------------------------------------------
// Test: library laws
// ---------------------------------------------------------------------------

/// Export followed by an overwrite import reproduces the saved collection.
#[test]
fn export_then_overwrite_reproduces_collection() {
    let source = memory_store(&[
        preset("Trams", "railway", "#112233").with_description("Tram lines"),
        preset("Bars", "amenity", "#aa0000"),
    ]);
    let library = source.export().unwrap();
    let text = library.to_json_pretty().unwrap();

    let mut target = memory_store(&[preset("Old", "k", "#000000")]);
    target
        .import(&ImportEnvelope::parse(&text).unwrap(), ImportMode::Overwrite)
        .unwrap();

    assert_eq!(target.saved(), source.saved());
}

/// Values that would not survive a library file are rejected or
/// normalized on save, so the round trip stays exact.
#[test]
fn saved_presets_survive_round_trip() {
    let mut source = memory_store(&[]);
    source.save(preset("Blank", "amenity", "")).unwrap();
    assert_eq!(source.saved()[0].settings.color, "#333333");

    let infinite = LayerPreset::new(
        "Wide",
        LayerSettings {
            line_width: f64::INFINITY,
            ..LayerSettings::for_tag("railway")
        },
    );
    assert!(source.save(infinite).is_err());
    assert_eq!(source.saved_count(), 1);

    let text = source.export().unwrap().to_json_pretty().unwrap();
    let mut target = memory_store(&[]);
    target
        .import(&ImportEnvelope::parse(&text).unwrap(), ImportMode::Overwrite)
        .unwrap();

    assert_eq!(target.saved(), source.saved());
}

/// Importing the same envelope twice under merge equals importing it once.
#[test]
fn merge_import_is_idempotent() {
    let envelope = ImportEnvelope::parse(
        r#"{"version": 1, "presets": [
            {"name": "A", "settings": {"tag_key": "a"}},
            {"name": "C", "settings": {"tag_key": "c", "mode": "fill"}},
            {"name": "A", "settings": {"tag_key": "a2"}}
        ]}"#,
    )
    .unwrap();

    let mut once = memory_store(&[preset("B", "b", "#000000")]);
    once.import(&envelope, ImportMode::Merge).unwrap();

    let mut twice = memory_store(&[preset("B", "b", "#000000")]);
    twice.import(&envelope, ImportMode::Merge).unwrap();
    twice.import(&envelope, ImportMode::Merge).unwrap();

    assert_eq!(once.saved(), twice.saved());
    assert_eq!(once.saved_count(), 3);
}

/// Merging `A` into `{A, B}` updates `A` and leaves `B` alone.
#[test]
fn merge_replaces_same_name_and_keeps_others() {
    let mut store = memory_store(&[preset("A", "old", "#000000"), preset("B", "b", "#123456")]);
    let envelope =
        ImportEnvelope::parse(r#"{"presets":[{"name":"A","settings":{"tag_key":"k"}}]}"#).unwrap();

    store.import(&envelope, ImportMode::Merge).unwrap();

    assert_eq!(store.saved_count(), 2);
    let a = store.resolve(&PresetSelector::saved("A")).unwrap();
    assert_eq!(a.settings, LayerSettings::for_tag("k"));
    let b = store.resolve(&PresetSelector::saved("B")).unwrap();
    assert_eq!(b, &preset("B", "b", "#123456"));
}

/// Saving an existing name replaces it without growing the collection.
#[test]
fn save_existing_name_does_not_grow() {
    let mut store = memory_store(&[preset("A", "a", "#000000"), preset("B", "b", "#000000")]);
    store.save(preset("B", "b", "#ffffff")).unwrap();

    assert_eq!(store.saved_count(), 2);
    assert_eq!(store.saved()[1].settings.color, "#ffffff");
}

// ---------------------------------------------------------------------------
// Test: built-ins
// ---------------------------------------------------------------------------

/// `builtin:buildings` is fixed no matter how the saved collection changes,
/// and built-ins never appear in an export.
#[test]
fn builtins_are_isolated_from_saved_collection() {
    let expected = builtin_preset("buildings").unwrap().clone();
    let mut store = memory_store(&[]);

    store.save(LayerPreset::new("Buildings", LayerSettings::for_tag("building"))).unwrap();
    let envelope = ImportEnvelope::parse(
        r#"{"presets":[{"name":"Buildings","settings":{"tag_key":"x","mode":"line"}}]}"#,
    )
    .unwrap();
    store.import(&envelope, ImportMode::Overwrite).unwrap();

    let resolved = store.resolve(&PresetSelector::parse("builtin:buildings")).unwrap();
    assert_eq!(resolved, &expected);
    assert_eq!(resolved.settings.mode, LayerMode::Fill);

    let exported = store.export().unwrap();
    assert_eq!(exported.presets.len(), 1);
    assert_eq!(exported.presets[0].settings.tag_key, "x");

    store.delete_all().unwrap();
    assert_eq!(store.resolve(&PresetSelector::builtin("buildings")).unwrap(), &expected);
}

/// The saved group only shows up when there are saved presets.
#[test]
fn saved_group_is_omitted_when_empty() {
    let store = memory_store(&[]);
    assert!(store.list().all(|e| e.group != PresetGroup::Saved));

    let store = memory_store(&[preset("A", "a", "#000000")]);
    let saved: Vec<_> = store.list().filter(|e| e.group == PresetGroup::Saved).collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].selector.to_string(), "saved:A");
}

// ---------------------------------------------------------------------------
// Test: file-backed persistence
// ---------------------------------------------------------------------------

/// Mutations are visible to a store reloaded from the same file.
#[test]
fn file_store_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut store = PresetStore::load(FileStore::new(&path));
    store.save(preset("A", "a", "#000000")).unwrap();
    store.save(preset("B", "b", "#000000")).unwrap();
    store.delete("A").unwrap();

    let reloaded = PresetStore::load(FileStore::new(&path));
    let names: Vec<_> = reloaded.saved().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["B"]);
}

/// A corrupt preset value loads as empty and is replaced by the next save.
#[test]
fn corrupt_stored_value_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let storage = FileStore::new(&path);
    storage.set(PRESETS_STORAGE_KEY, "not json at all").unwrap();

    let mut store = PresetStore::load(storage);
    assert!(!store.has_saved());

    store.save(preset("A", "a", "#000000")).unwrap();
    let reloaded = PresetStore::load(FileStore::new(&path));
    assert_eq!(reloaded.saved_count(), 1);
}

/// Files from older clients with string-typed numbers still import.
#[tokio::test]
async fn older_library_file_imports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.json");
    tokio::fs::write(
        &path,
        r##"{"version": 1, "exported_at": "2024-05-01T10:00:00.000Z", "presets": [
            {"name": "Trams", "description": "", "settings": {
                "tag_key": "railway", "tag_value": "tram", "mode": "line",
                "color": "#445566", "line_width": "0.8", "zorder": "2.7"}}
        ]}"##,
    )
    .await
    .unwrap();

    let envelope = read_library_file(&path).await.unwrap();
    let mut store = memory_store(&[]);
    store.import(&envelope, ImportMode::Merge).unwrap();

    let trams = store.resolve(&PresetSelector::saved("Trams")).unwrap();
    assert_eq!(trams.settings.line_width, 0.8);
    assert_eq!(trams.settings.zorder, 2.7);

    let out = dir.path().join("new.json");
    write_library_file(&out, &store.export().unwrap()).await.unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&out).await.unwrap()).unwrap();
    assert_eq!(written["presets"][0]["settings"]["line_width"], 0.8);
}
