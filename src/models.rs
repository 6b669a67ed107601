use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Restaurant,
    Hotel,
    Museum,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Restaurant => "Restaurant",
            Category::Hotel => "Hotel",
            Category::Museum => "Museum",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub country: &'static str,
    pub category: Category,
}

impl LocationRecord {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Current values of the search box and the two dropdowns. An empty string
/// means the dimension is not filtered.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FilterState {
    pub search_text: String,
    pub country: String,
    pub category: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    #[default]
    Idle,
    Bouncing,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub fill_color: String,
}

impl Default for MarkerIcon {
    fn default() -> Self {
        Self { fill_color: "blue".to_string() }
    }
}

// --- HTTP payloads ---

#[derive(Serialize, Debug, Clone)]
pub struct FilterOptions {
    pub countries: Vec<&'static str>,
    pub categories: Vec<&'static str>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MarkerSummary {
    pub id: usize,
    pub name: &'static str,
    pub country: &'static str,
    pub category: Category,
    pub position: LatLng,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LookupPlacement {
    pub query: String,
    pub formatted_address: String,
    pub position: LatLng,
}

#[derive(Serialize, Debug, Clone)]
pub struct FilterResponse {
    pub state: FilterState,
    pub matches: Vec<MarkerSummary>,
    pub view: MapView,
    pub lookup: Option<LookupPlacement>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PlaceSelection {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct OsPreference {
    pub dark: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ThemeResponse {
    pub theme: &'static str,
    pub dark: bool,
}
