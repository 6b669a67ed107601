use crate::models::{LatLng, MapView, Viewport};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub thread_count: Option<usize>,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: f64,
    pub viewport: Viewport,
    /// Upper bound applied after fitting bounds.
    pub zoom_ceiling: f64,
    pub bounce_ms: u64,
    pub lookup_zoom: f64,
    pub recolor_matches: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(51.1657, 10.4515),
            zoom: 5.0,
            viewport: Viewport { width_px: 1024, height_px: 768 },
            zoom_ceiling: 14.0,
            bounce_ms: 1400,
            lookup_zoom: 14.0,
            recolor_matches: true,
        }
    }
}

impl MapConfig {
    pub fn initial_view(&self) -> MapView {
        MapView { center: self.center, zoom: self.zoom }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeocoderProvider {
    Google,
    #[default]
    Nominatim,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GeocoderConfig {
    pub provider: GeocoderProvider,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::default(),
            base_url: None,
            api_key: None,
            user_agent: format!("poimap/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 5,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemePolicy {
    /// OS preference changes are applied even over a stored choice.
    #[default]
    FollowOs,
    /// A stored choice pins the theme; OS changes only apply without one.
    PersistedOverrideWins,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ThemeConfig {
    pub policy: ThemePolicy,
    pub os_prefers_dark: bool,
    pub database: PathBuf,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            policy: ThemePolicy::default(),
            os_prefers_dark: false,
            database: PathBuf::from("data/preferences.db"),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("data/templates")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let path = if std::path::Path::new("poimap.toml").exists() {
            "poimap.toml"
        } else if std::path::Path::new("poimap.example.toml").exists() {
            "poimap.example.toml"
        } else {
            return Err(anyhow::anyhow!("Configuration file not found. Please create poimap.toml or provide poimap.example.toml."));
        };

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.map.zoom_ceiling <= 0.0 {
            return Err(anyhow::anyhow!("map.zoom_ceiling must be positive"));
        }
        if config.thread_count == Some(0) {
            return Err(anyhow::anyhow!("thread_count must be at least 1"));
        }
        Ok(config)
    }
}
