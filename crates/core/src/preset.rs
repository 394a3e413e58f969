//! Custom-layer presets: settings, built-in definitions and selectors.
//!
//! A preset names a reusable custom-layer style (an OSM-style tag filter
//! plus render settings). Built-in presets are process-wide constants
//! addressed as `builtin:<key>`; user presets live in the saved collection
//! owned by [`PresetStore`](crate::preset_store::PresetStore) and are
//! addressed as `saved:<name>`.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::numeric::parse_float;

/* --------------------------------------------------------------------------
   Defaults
   -------------------------------------------------------------------------- */

/// Colour used for a custom layer when none is given.
pub const DEFAULT_LAYER_COLOR: &str = "#333333";

/// Line width used for a custom layer when none is given.
pub const DEFAULT_LAYER_WIDTH: f64 = 0.5;

/// Draw order used for a custom layer when none is given.
pub const DEFAULT_LAYER_ZORDER: f64 = 2.5;

/// Selector prefix for built-in presets.
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Selector prefix for saved presets.
pub const SAVED_PREFIX: &str = "saved:";

/* --------------------------------------------------------------------------
   Settings
   -------------------------------------------------------------------------- */

/// How matched features are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerMode {
    Fill,
    #[default]
    #[serde(other)]
    Line,
}

impl LayerMode {
    /// Parse a form value; anything other than `fill` reads as `line`.
    pub fn from_form(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("fill") {
            Self::Fill
        } else {
            Self::Line
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for LayerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag filter and render style of a custom layer.
///
/// Decoding is tolerant: library files written by older clients store
/// `line_width` and `zorder` as strings, and optional fields may be
/// missing or `null`. Settings are always written back with numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSettings {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tag_key: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tag_value: String,
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: LayerMode,
    #[serde(default = "default_color", deserialize_with = "lenient_color")]
    pub color: String,
    #[serde(default = "default_width", deserialize_with = "lenient_width")]
    pub line_width: f64,
    #[serde(default = "default_zorder", deserialize_with = "lenient_zorder")]
    pub zorder: f64,
}

impl LayerSettings {
    /// Settings for `tag_key` with every other field at its default.
    pub fn for_tag(tag_key: impl Into<String>) -> Self {
        Self {
            tag_key: tag_key.into(),
            tag_value: String::new(),
            mode: LayerMode::default(),
            color: DEFAULT_LAYER_COLOR.to_string(),
            line_width: DEFAULT_LAYER_WIDTH,
            zorder: DEFAULT_LAYER_ZORDER,
        }
    }
}

/// A named, reusable custom-layer definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPreset {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub description: Option<String>,
    pub settings: LayerSettings,
}

impl LayerPreset {
    pub fn new(name: impl Into<String>, settings: LayerSettings) -> Self {
        Self {
            name: name.into(),
            description: None,
            settings,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the fields a saved preset cannot do without (a name and a tag
    /// key) and that its numbers are finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Preset name must not be empty".to_string(),
            ));
        }
        if self.settings.tag_key.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Preset '{}' must have a tag key",
                self.name
            )));
        }
        let s = &self.settings;
        if !s.line_width.is_finite() || !s.zorder.is_finite() {
            return Err(CoreError::Validation(format!(
                "Preset '{}' must have a finite line width and z-order",
                self.name
            )));
        }
        Ok(())
    }

    /// Fill a blank colour with the default, as decoding would.
    pub fn normalized(mut self) -> Self {
        if self.settings.color.trim().is_empty() {
            self.settings.color = DEFAULT_LAYER_COLOR.to_string();
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/* --------------------------------------------------------------------------
   Built-ins
   -------------------------------------------------------------------------- */

/// A built-in preset and the key it is addressed by.
#[derive(Debug)]
pub struct BuiltinPreset {
    pub key: &'static str,
    pub preset: LayerPreset,
}

#[allow(clippy::too_many_arguments)]
fn builtin(
    key: &'static str,
    name: &str,
    description: &str,
    (tag_key, tag_value): (&str, &str),
    mode: LayerMode,
    color: &str,
    line_width: f64,
    zorder: f64,
) -> BuiltinPreset {
    BuiltinPreset {
        key,
        preset: LayerPreset {
            name: name.to_string(),
            description: Some(description.to_string()),
            settings: LayerSettings {
                tag_key: tag_key.to_string(),
                tag_value: tag_value.to_string(),
                mode,
                color: color.to_string(),
                line_width,
                zorder,
            },
        },
    }
}

static BUILTIN_PRESETS: LazyLock<Vec<BuiltinPreset>> = LazyLock::new(|| {
    vec![
        builtin(
            "buildings",
            "Buildings",
            "Building footprints as subtle filled shapes.",
            ("building", ""),
            LayerMode::Fill,
            "#8b8b8b",
            0.3,
            2.3,
        ),
        builtin(
            "railways",
            "Railways",
            "Rail lines for transit corridors and rail yards.",
            ("railway", "rail"),
            LayerMode::Line,
            "#5b5b5b",
            0.6,
            2.6,
        ),
        builtin(
            "cafes",
            "Cafes",
            "Cafe amenities as highlighted POIs.",
            ("amenity", "cafe"),
            LayerMode::Fill,
            "#d97706",
            0.4,
            3.0,
        ),
        builtin(
            "schools",
            "Schools",
            "Schools and campuses as highlighted POIs.",
            ("amenity", "school"),
            LayerMode::Fill,
            "#2563eb",
            0.4,
            3.0,
        ),
    ]
});

/// All built-in presets in display order.
pub fn builtin_presets() -> &'static [BuiltinPreset] {
    &BUILTIN_PRESETS
}

/// Look up a built-in preset by key.
pub fn builtin_preset(key: &str) -> Option<&'static LayerPreset> {
    BUILTIN_PRESETS
        .iter()
        .find(|b| b.key == key)
        .map(|b| &b.preset)
}

/* --------------------------------------------------------------------------
   Selectors
   -------------------------------------------------------------------------- */

/// Addresses an entry of the preset list.
///
/// The empty string is [`PresetSelector::Custom`] (hand-entered layer
/// settings, no preset). Strings without a known prefix also parse as
/// `Custom`, so they resolve to no preset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PresetSelector {
    #[default]
    Custom,
    Builtin(String),
    Saved(String),
}

impl PresetSelector {
    pub fn parse(value: &str) -> Self {
        if let Some(key) = value.strip_prefix(BUILTIN_PREFIX) {
            Self::Builtin(key.to_string())
        } else if let Some(name) = value.strip_prefix(SAVED_PREFIX) {
            Self::Saved(name.to_string())
        } else {
            Self::Custom
        }
    }

    pub fn saved(name: impl Into<String>) -> Self {
        Self::Saved(name.into())
    }

    pub fn builtin(key: impl Into<String>) -> Self {
        Self::Builtin(key.into())
    }

    /// Name of the saved preset this selector points at, if any.
    pub fn saved_name(&self) -> Option<&str> {
        match self {
            Self::Saved(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PresetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom => Ok(()),
            Self::Builtin(key) => write!(f, "{BUILTIN_PREFIX}{key}"),
            Self::Saved(name) => write!(f, "{SAVED_PREFIX}{name}"),
        }
    }
}

impl From<&str> for PresetSelector {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/* --------------------------------------------------------------------------
   Lenient decoding
   -------------------------------------------------------------------------- */

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn loose_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Loose::deserialize(d)? {
        Loose::Number(n) if n.is_finite() => Some(n),
        Loose::Text(s) => parse_float(&s),
        _ => None,
    })
}

fn lenient_width<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(loose_number(d)?.unwrap_or(DEFAULT_LAYER_WIDTH))
}

fn lenient_zorder<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(loose_number(d)?.unwrap_or(DEFAULT_LAYER_ZORDER))
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Loose::deserialize(d)? {
        Loose::Text(s) => Some(s),
        Loose::Number(n) => Some(n.to_string()),
        Loose::Other(_) => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_optional_string(d)?.unwrap_or_default())
}

fn lenient_mode<'de, D: Deserializer<'de>>(d: D) -> Result<LayerMode, D::Error> {
    Ok(lenient_optional_string(d)?
        .map(|m| LayerMode::from_form(&m))
        .unwrap_or_default())
}

fn lenient_color<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_optional_string(d)?
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(default_color))
}

fn default_color() -> String {
    DEFAULT_LAYER_COLOR.to_string()
}

fn default_width() -> f64 {
    DEFAULT_LAYER_WIDTH
}

fn default_zorder() -> f64 {
    DEFAULT_LAYER_ZORDER
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    // --- Selectors ---

    #[test]
    fn selector_parses_known_prefixes() {
        assert_eq!(PresetSelector::parse(""), PresetSelector::Custom);
        assert_eq!(
            PresetSelector::parse("builtin:cafes"),
            PresetSelector::builtin("cafes")
        );
        assert_eq!(
            PresetSelector::parse("saved:My Layer"),
            PresetSelector::saved("My Layer")
        );
    }

    #[test]
    fn selector_unknown_prefix_is_custom() {
        assert_eq!(PresetSelector::parse("theme:noir"), PresetSelector::Custom);
    }

    #[test]
    fn selector_display_matches_parse() {
        for raw in ["", "builtin:railways", "saved:Trams"] {
            assert_eq!(PresetSelector::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn selector_names_are_case_sensitive() {
        assert_ne!(PresetSelector::parse("saved:Trams"), PresetSelector::parse("saved:trams"));
    }

    // --- Built-ins ---

    #[test]
    fn builtins_are_listed_in_fixed_order() {
        let keys: Vec<_> = builtin_presets().iter().map(|b| b.key).collect();
        assert_eq!(keys, ["buildings", "railways", "cafes", "schools"]);
    }

    #[test]
    fn builtin_buildings_definition() {
        let preset = builtin_preset("buildings").unwrap();
        assert_eq!(preset.name, "Buildings");
        assert_eq!(preset.settings.tag_key, "building");
        assert_eq!(preset.settings.tag_value, "");
        assert_eq!(preset.settings.mode, LayerMode::Fill);
        assert_eq!(preset.settings.color, "#8b8b8b");
        assert_eq!(preset.settings.line_width, 0.3);
        assert_eq!(preset.settings.zorder, 2.3);
    }

    #[test]
    fn builtins_are_valid() {
        for b in builtin_presets() {
            assert!(b.preset.is_valid(), "{} should be valid", b.key);
        }
        assert!(builtin_preset("parks").is_none());
    }

    // --- Validation ---

    #[test]
    fn validate_rejects_blank_name() {
        let preset = LayerPreset::new("  ", LayerSettings::for_tag("amenity"));
        let err = preset.validate().unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn validate_rejects_blank_tag_key() {
        let preset = LayerPreset::new("Bars", LayerSettings::for_tag(""));
        let err = preset.validate().unwrap_err();
        assert!(err.to_string().contains("tag key"));
    }

    #[test]
    fn validate_rejects_non_finite_numbers() {
        for (width, zorder) in [(f64::INFINITY, 2.5), (0.5, f64::NAN)] {
            let preset = LayerPreset::new(
                "Trams",
                LayerSettings {
                    line_width: width,
                    zorder,
                    ..LayerSettings::for_tag("railway")
                },
            );
            assert_matches!(preset.validate(), Err(CoreError::Validation(_)));
        }
    }

    #[test]
    fn normalized_fills_blank_color() {
        let preset = LayerPreset::new(
            "Trams",
            LayerSettings {
                color: "  ".into(),
                ..LayerSettings::for_tag("railway")
            },
        );
        assert_eq!(preset.normalized().settings.color, DEFAULT_LAYER_COLOR);
    }

    // --- Decoding ---

    #[test]
    fn decodes_string_numbers_from_older_files() {
        let preset: LayerPreset = serde_json::from_value(json!({
            "name": "Trams",
            "description": "",
            "settings": {
                "tag_key": "railway",
                "tag_value": "tram",
                "mode": "line",
                "color": "#112233",
                "line_width": "0.8",
                "zorder": "2.7"
            }
        }))
        .unwrap();

        assert_eq!(preset.description.as_deref(), Some(""));
        assert_eq!(preset.settings.line_width, 0.8);
        assert_eq!(preset.settings.zorder, 2.7);
    }

    #[test]
    fn decodes_minimal_settings_with_defaults() {
        let preset: LayerPreset =
            serde_json::from_value(json!({"name": "A", "settings": {"tag_key": "k"}})).unwrap();

        assert_eq!(preset.settings, LayerSettings::for_tag("k"));
        assert!(preset.description.is_none());
    }

    #[test]
    fn decodes_garbage_fields_as_defaults() {
        let preset: LayerPreset = serde_json::from_value(json!({
            "name": "A",
            "settings": {
                "tag_key": "k",
                "tag_value": null,
                "mode": null,
                "color": "",
                "line_width": "wide",
                "zorder": [1]
            }
        }))
        .unwrap();

        assert_eq!(preset.settings.mode, LayerMode::Line);
        assert_eq!(preset.settings.color, DEFAULT_LAYER_COLOR);
        assert_eq!(preset.settings.line_width, DEFAULT_LAYER_WIDTH);
        assert_eq!(preset.settings.zorder, DEFAULT_LAYER_ZORDER);
    }

    #[test]
    fn encodes_numbers_and_omits_missing_description() {
        let preset = LayerPreset::new("A", LayerSettings::for_tag("k"));
        let value = serde_json::to_value(&preset).unwrap();

        assert!(value.get("description").is_none());
        assert_eq!(value["settings"]["line_width"], json!(0.5));
        assert_eq!(value["settings"]["mode"], json!("line"));
    }

    #[test]
    fn layer_mode_from_form() {
        assert_eq!(LayerMode::from_form("fill"), LayerMode::Fill);
        assert_eq!(LayerMode::from_form(" FILL "), LayerMode::Fill);
        assert_eq!(LayerMode::from_form("line"), LayerMode::Line);
        assert_eq!(LayerMode::from_form(""), LayerMode::Line);
    }
}
