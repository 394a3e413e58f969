//! Generation configuration assembly.
//!
//! [`RawFields`] mirrors the poster form as the user left it: free-text
//! inputs stay strings, toggles are bools. [`build_config`] turns one
//! snapshot of those fields into an immutable [`GenerationConfig`], the
//! payload of a single generate request. Assembly is a pure function of
//! its inputs: numeric fields are coerced with fixed per-field defaults,
//! transport toggles are reduced to network types, and at most one custom
//! layer is emitted.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::numeric::{coerce_float, parse_float};
use crate::preset::{
    LayerMode, LayerPreset, LayerSettings, DEFAULT_LAYER_COLOR, DEFAULT_LAYER_WIDTH,
    DEFAULT_LAYER_ZORDER,
};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Map radius in metres when the distance input is unusable.
pub const DEFAULT_DISTANCE_M: u32 = 10_000;

/// Road colour used when hierarchy colours are switched off.
pub const DEFAULT_ROAD_COLOR: &str = "#333333";

/// Road width used when hierarchy widths are switched off.
pub const DEFAULT_ROAD_WIDTH: f64 = 0.6;

pub const DEFAULT_BUILDING_COLOR: &str = "#999999";
pub const DEFAULT_RAILWAY_COLOR: &str = "#666666";
pub const DEFAULT_RAILWAY_WIDTH: f64 = 0.6;

/// Baseline vertical offsets of the poster text, as fractions of the height.
pub const DEFAULT_CITY_Y: f64 = 0.14;
pub const DEFAULT_LINE_Y: f64 = 0.125;
pub const DEFAULT_COUNTRY_Y: f64 = 0.10;
pub const DEFAULT_COORDS_Y: f64 = 0.07;
pub const DEFAULT_ATTRIBUTION_Y: f64 = 0.02;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Snapshot of the poster form.
///
/// `Default` is the state after "reset advanced settings". Deserializing
/// accepts partial documents; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFields {
    pub city: String,
    pub country: String,
    pub theme: Option<String>,
    pub distance: String,
    /// Precise coordinates from an address lookup, if any.
    pub coordinates: Option<Coordinates>,
    pub add_house_marker: bool,

    pub use_road_hierarchy_colors: bool,
    pub use_road_hierarchy_widths: bool,
    pub road_color: String,
    pub road_width: String,

    pub network_drive: bool,
    pub network_bike: bool,
    pub network_walk: bool,
    pub use_cache: bool,

    pub show_water: bool,
    pub show_parks: bool,
    pub show_buildings: bool,
    pub show_railways: bool,
    pub show_gradients: bool,
    pub building_color: String,
    pub railway_color: String,
    pub railway_width: String,

    pub custom_layer_enabled: bool,
    pub custom_layer_key: String,
    pub custom_layer_value: String,
    pub custom_layer_mode: String,
    pub custom_layer_color: String,
    pub custom_layer_width: String,
    pub custom_layer_zorder: String,
    pub preset_name: String,
    pub preset_description: String,

    pub text_city_y: String,
    pub text_line_y: String,
    pub text_country_y: String,
    pub text_coords_y: String,
    pub text_attribution_y: String,
}

impl Default for RawFields {
    fn default() -> Self {
        Self {
            city: String::new(),
            country: String::new(),
            theme: None,
            distance: DEFAULT_DISTANCE_M.to_string(),
            coordinates: None,
            add_house_marker: false,

            use_road_hierarchy_colors: true,
            use_road_hierarchy_widths: true,
            road_color: DEFAULT_ROAD_COLOR.to_string(),
            road_width: "0.6".to_string(),

            network_drive: true,
            network_bike: true,
            network_walk: true,
            use_cache: true,

            show_water: true,
            show_parks: true,
            show_buildings: false,
            show_railways: false,
            show_gradients: true,
            building_color: DEFAULT_BUILDING_COLOR.to_string(),
            railway_color: DEFAULT_RAILWAY_COLOR.to_string(),
            railway_width: "0.6".to_string(),

            custom_layer_enabled: false,
            custom_layer_key: String::new(),
            custom_layer_value: String::new(),
            custom_layer_mode: LayerMode::Line.as_str().to_string(),
            custom_layer_color: DEFAULT_LAYER_COLOR.to_string(),
            custom_layer_width: "0.5".to_string(),
            custom_layer_zorder: "2.5".to_string(),
            preset_name: String::new(),
            preset_description: String::new(),

            text_city_y: "0.14".to_string(),
            text_line_y: "0.125".to_string(),
            text_country_y: "0.10".to_string(),
            text_coords_y: "0.07".to_string(),
            text_attribution_y: "0.02".to_string(),
        }
    }
}

impl RawFields {
    /// Copy a preset into the custom-layer fields and switch the layer on.
    pub fn apply_preset(&mut self, preset: &LayerPreset) {
        let s = &preset.settings;
        self.custom_layer_enabled = true;
        self.custom_layer_key = s.tag_key.clone();
        self.custom_layer_value = s.tag_value.clone();
        self.custom_layer_mode = s.mode.as_str().to_string();
        self.custom_layer_color = s.color.clone();
        self.custom_layer_width = s.line_width.to_string();
        self.custom_layer_zorder = s.zorder.to_string();
        self.preset_name = preset.name.clone();
        self.preset_description = preset.description.clone().unwrap_or_default();
    }

    /// Reset everything but the core query (city, country, theme,
    /// distance, coordinates, house marker) to defaults.
    pub fn reset_advanced(&mut self) {
        *self = Self {
            city: std::mem::take(&mut self.city),
            country: std::mem::take(&mut self.country),
            theme: self.theme.take(),
            distance: std::mem::take(&mut self.distance),
            coordinates: self.coordinates.take(),
            add_house_marker: self.add_house_marker,
            ..Self::default()
        };
    }

    /// The custom-layer fields as preset settings (trimmed key and value,
    /// numbers coerced).
    pub fn custom_layer_settings(&self) -> LayerSettings {
        LayerSettings {
            tag_key: self.custom_layer_key.trim().to_string(),
            tag_value: self.custom_layer_value.trim().to_string(),
            mode: LayerMode::from_form(&self.custom_layer_mode),
            color: non_blank_or(&self.custom_layer_color, DEFAULT_LAYER_COLOR),
            line_width: coerce_float(&self.custom_layer_width, DEFAULT_LAYER_WIDTH),
            zorder: coerce_float(&self.custom_layer_zorder, DEFAULT_LAYER_ZORDER),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A routable transport network requested for the road layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    All,
    Drive,
    Bike,
    Walk,
}

/// A user-defined map feature overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomLayer {
    pub tag_key: String,
    pub tag_value: String,
    pub mode: LayerMode,
    pub color: String,
    pub line_width: f64,
    pub zorder: f64,
}

impl From<LayerSettings> for CustomLayer {
    fn from(s: LayerSettings) -> Self {
        Self {
            tag_key: s.tag_key,
            tag_value: s.tag_value,
            mode: s.mode,
            color: s.color,
            line_width: s.line_width,
            zorder: s.zorder,
        }
    }
}

/// Vertical offsets of the poster text blocks, as fractions of the height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypographyPositions {
    pub city_y: f64,
    pub line_y: f64,
    pub country_y: f64,
    pub coords_y: f64,
    pub attribution_y: f64,
}

impl Default for TypographyPositions {
    fn default() -> Self {
        Self {
            city_y: DEFAULT_CITY_Y,
            line_y: DEFAULT_LINE_Y,
            country_y: DEFAULT_COUNTRY_Y,
            coords_y: DEFAULT_COORDS_Y,
            attribution_y: DEFAULT_ATTRIBUTION_Y,
        }
    }
}

/// Rendering options sent alongside the core query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedOptions {
    pub use_road_hierarchy_colors: bool,
    pub use_road_hierarchy_widths: bool,
    pub road_color: String,
    pub road_width: f64,
    pub network_types: Vec<NetworkType>,
    pub use_cache: bool,
    pub show_water: bool,
    pub show_parks: bool,
    pub show_buildings: bool,
    pub show_railways: bool,
    pub show_gradients: bool,
    pub building_color: String,
    pub railway_color: String,
    pub railway_width: f64,
    pub custom_layers: Vec<CustomLayer>,
    pub typography_positions: TypographyPositions,
}

/// The payload of one generate request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub city: String,
    pub country: String,
    pub theme: String,
    /// Map radius in metres.
    pub distance: u32,
    pub coordinates: Option<Coordinates>,
    pub add_house_marker: bool,
    pub options: AdvancedOptions,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Reduce the transport toggles to the requested network types.
///
/// All three set collapses to `[All]`; otherwise the set flags in the
/// order drive, bike, walk. None set yields an empty list.
pub fn select_network_types(drive: bool, bike: bool, walk: bool) -> Vec<NetworkType> {
    if drive && bike && walk {
        return vec![NetworkType::All];
    }

    [
        (drive, NetworkType::Drive),
        (bike, NetworkType::Bike),
        (walk, NetworkType::Walk),
    ]
    .into_iter()
    .filter_map(|(on, ty)| on.then_some(ty))
    .collect()
}

/// Check what the form must have before anything is submitted.
pub fn validate_request(fields: &RawFields) -> Result<(), CoreError> {
    if fields.city.trim().is_empty() || fields.country.trim().is_empty() {
        return Err(CoreError::Validation(
            "Please enter both city and country".to_string(),
        ));
    }
    if fields.theme.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(CoreError::Validation("Please select a theme".to_string()));
    }
    Ok(())
}

/// Assemble the generate payload from a form snapshot and the preset the
/// picker currently resolves to.
///
/// The custom layer slot is filled only when the layer toggle is on and a
/// tag key is available. Hand-entered fields take precedence; the active
/// preset supplies the layer when the key field is blank.
pub fn build_config(fields: &RawFields, active: Option<&LayerPreset>) -> GenerationConfig {
    let mut custom_layers = Vec::with_capacity(1);
    if fields.custom_layer_enabled {
        let settings = if !fields.custom_layer_key.trim().is_empty() {
            Some(fields.custom_layer_settings())
        } else {
            active.map(|p| p.settings.clone())
        };
        if let Some(settings) = settings.filter(|s| !s.tag_key.trim().is_empty()) {
            custom_layers.push(CustomLayer::from(settings));
        }
    }

    let options = AdvancedOptions {
        use_road_hierarchy_colors: fields.use_road_hierarchy_colors,
        use_road_hierarchy_widths: fields.use_road_hierarchy_widths,
        road_color: non_blank_or(&fields.road_color, DEFAULT_ROAD_COLOR),
        road_width: coerce_float(&fields.road_width, DEFAULT_ROAD_WIDTH),
        network_types: select_network_types(
            fields.network_drive,
            fields.network_bike,
            fields.network_walk,
        ),
        use_cache: fields.use_cache,
        show_water: fields.show_water,
        show_parks: fields.show_parks,
        show_buildings: fields.show_buildings,
        show_railways: fields.show_railways,
        show_gradients: fields.show_gradients,
        building_color: non_blank_or(&fields.building_color, DEFAULT_BUILDING_COLOR),
        railway_color: non_blank_or(&fields.railway_color, DEFAULT_RAILWAY_COLOR),
        railway_width: coerce_float(&fields.railway_width, DEFAULT_RAILWAY_WIDTH),
        custom_layers,
        typography_positions: TypographyPositions {
            city_y: coerce_float(&fields.text_city_y, DEFAULT_CITY_Y),
            line_y: coerce_float(&fields.text_line_y, DEFAULT_LINE_Y),
            country_y: coerce_float(&fields.text_country_y, DEFAULT_COUNTRY_Y),
            coords_y: coerce_float(&fields.text_coords_y, DEFAULT_COORDS_Y),
            attribution_y: coerce_float(&fields.text_attribution_y, DEFAULT_ATTRIBUTION_Y),
        },
    };

    GenerationConfig {
        city: fields.city.trim().to_string(),
        country: fields.country.trim().to_string(),
        theme: fields.theme.clone().unwrap_or_default(),
        distance: parse_distance(&fields.distance),
        coordinates: fields.coordinates,
        add_house_marker: fields.add_house_marker,
        options,
    }
}

/// Integer metres; negative or unusable input takes the default.
fn parse_distance(input: &str) -> u32 {
    parse_float(input)
        .filter(|d| *d >= 0.0 && *d <= f64::from(u32::MAX))
        .map(|d| d.trunc() as u32)
        .unwrap_or(DEFAULT_DISTANCE_M)
}

fn non_blank_or(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
