//! Themes, theme drafts and geocoding results.
//!
//! These are the collaborator contracts around the core: the backend owns
//! the theme catalogue and the geocoder, the client only lists, filters and
//! submits.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::generation::{Coordinates, RawFields};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// Preview colours of a theme card. Themes may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    pub bg: Option<String>,
    pub text: Option<String>,
    pub water: Option<String>,
    pub parks: Option<String>,
    pub road_motorway: Option<String>,
    pub road_primary: Option<String>,
    pub road_residential: Option<String>,
}

/// One entry of `GET /api/themes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub colors: ThemeColors,
}

/// A full theme as returned by `GET /api/theme/{id}`.
///
/// Colour keys vary between themes, so everything besides the name and
/// description is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl ThemeDetail {
    /// A colour property (`"bg"`, `"road_primary"`, ...) if present.
    pub fn color(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Themes whose name or description contains `query`, ignoring case.
pub fn filter_themes<'a>(themes: &'a [ThemeSummary], query: &str) -> Vec<&'a ThemeSummary> {
    let query = query.trim().to_lowercase();
    themes
        .iter()
        .filter(|t| {
            query.is_empty()
                || t.name.to_lowercase().contains(&query)
                || t.description.to_lowercase().contains(&query)
        })
        .collect()
}

/// The theme preselected when the user has not picked one.
pub fn default_theme(themes: &[ThemeSummary]) -> Option<&ThemeSummary> {
    themes.first()
}

// ---------------------------------------------------------------------------
// Theme creation
// ---------------------------------------------------------------------------

/// A new theme as entered in the theme creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeDraft {
    pub name: String,
    pub description: String,
    pub bg: String,
    pub text: String,
    pub gradient_color: String,
    pub water: String,
    pub parks: String,
    pub road_motorway: String,
    pub road_primary: String,
    pub road_secondary: String,
    pub road_tertiary: String,
    pub road_residential: String,
    pub road_default: String,
}

impl Default for ThemeDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            bg: "#FFFFFF".into(),
            text: "#000000".into(),
            gradient_color: "#FFFFFF".into(),
            water: "#C0C0C0".into(),
            parks: "#F0F0F0".into(),
            road_motorway: "#0A0A0A".into(),
            road_primary: "#1A1A1A".into(),
            road_secondary: "#2A2A2A".into(),
            road_tertiary: "#3A3A3A".into(),
            road_residential: "#4A4A4A".into(),
            road_default: "#3A3A3A".into(),
        }
    }
}

impl ThemeDraft {
    fn colors(&self) -> [(&'static str, &str); 11] {
        [
            ("bg", &self.bg),
            ("text", &self.text),
            ("gradient_color", &self.gradient_color),
            ("water", &self.water),
            ("parks", &self.parks),
            ("road_motorway", &self.road_motorway),
            ("road_primary", &self.road_primary),
            ("road_secondary", &self.road_secondary),
            ("road_tertiary", &self.road_tertiary),
            ("road_residential", &self.road_residential),
            ("road_default", &self.road_default),
        ]
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Please enter a theme name".to_string()));
        }
        if let Some((key, value)) = self.colors().into_iter().find(|(_, v)| !HEX_COLOR.is_match(v)) {
            return Err(CoreError::Validation(format!(
                "Invalid colour for {key}: '{value}' (expected #RRGGBB)"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

/// A resolved address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub coordinates: Coordinates,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl GeocodeResult {
    /// Store the coordinates and fill city and country when the geocoder
    /// reported them.
    pub fn apply_to(&self, fields: &mut RawFields) {
        fields.coordinates = Some(self.coordinates);
        if let Some(city) = self.city.as_deref().filter(|c| !c.trim().is_empty()) {
            fields.city = city.to_string();
        }
        if let Some(country) = self.country.as_deref().filter(|c| !c.trim().is_empty()) {
            fields.country = country.to_string();
        }
    }
}

/// Check an address before it is sent to the geocoder.
pub fn validate_address(address: &str) -> Result<&str, CoreError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(CoreError::Validation("Please enter an address".to_string()));
    }
    Ok(address)
}
