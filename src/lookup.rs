use crate::config::{GeocoderConfig, GeocoderProvider};
use crate::map_widget::{MapWidget, MarkerId, MarkerSpec};
use crate::models::{LatLng, MarkerIcon};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Found { position: LatLng, formatted_address: String },
    NotFound,
    Error(String),
}

impl LookupResult {
    /// Status string reported to the user for anything but a hit.
    pub fn status(&self) -> &str {
        match self {
            LookupResult::Found { .. } => "OK",
            LookupResult::NotFound => "ZERO_RESULTS",
            LookupResult::Error(reason) => reason.as_str(),
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> LookupResult;
}

// --- Google Geocoding API ---

#[derive(Deserialize, Debug)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GoogleResult {
    formatted_address: String,
    geometry: GoogleGeometry,
}

#[derive(Deserialize, Debug)]
struct GoogleGeometry {
    location: LatLng,
}

pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(client: Client, base_url: Option<String>, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| GOOGLE_GEOCODE_URL.to_string()),
            api_key,
        }
    }

    fn interpret(body: GoogleResponse) -> LookupResult {
        match body.status.as_str() {
            "OK" => match body.results.into_iter().next() {
                Some(hit) => LookupResult::Found {
                    position: hit.geometry.location,
                    formatted_address: hit.formatted_address,
                },
                None => LookupResult::NotFound,
            },
            "ZERO_RESULTS" => LookupResult::NotFound,
            status => {
                if let Some(message) = &body.error_message {
                    warn!("geocoder returned {}: {}", status, message);
                }
                LookupResult::Error(status.to_string())
            }
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, query: &str) -> LookupResult {
        let url = match Url::parse_with_params(&self.base_url, &[("address", query), ("key", self.api_key.as_str())]) {
            Ok(url) => url,
            Err(e) => return LookupResult::Error(format!("INVALID_REQUEST ({})", e)),
        };
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => return LookupResult::Error(format!("NETWORK_ERROR ({})", e)),
        };
        match resp.json::<GoogleResponse>().await {
            Ok(body) => Self::interpret(body),
            Err(e) => LookupResult::Error(format!("INVALID_RESPONSE ({})", e)),
        }
    }
}

// --- OpenStreetMap Nominatim ---

#[derive(Deserialize, Debug)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| NOMINATIM_URL.to_string()),
        }
    }

    fn interpret(results: Vec<NominatimResult>) -> LookupResult {
        let Some(top) = results.into_iter().next() else {
            return LookupResult::NotFound;
        };
        match (top.lat.parse::<f64>(), top.lon.parse::<f64>()) {
            (Ok(lat), Ok(lng)) => LookupResult::Found {
                position: LatLng::new(lat, lng),
                formatted_address: top.display_name,
            },
            _ => LookupResult::Error("INVALID_RESPONSE (bad coordinates)".to_string()),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> LookupResult {
        let endpoint = format!("{}/search", self.base_url.trim_end_matches('/'));
        let url = match Url::parse_with_params(&endpoint, &[("q", query), ("format", "json"), ("limit", "1")]) {
            Ok(url) => url,
            Err(e) => return LookupResult::Error(format!("INVALID_REQUEST ({})", e)),
        };
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => return LookupResult::Error(format!("NETWORK_ERROR ({})", e)),
        };
        let status = resp.status();
        if !status.is_success() {
            return LookupResult::Error(format!("HTTP_{}", status.as_u16()));
        }
        match resp.json::<Vec<NominatimResult>>().await {
            Ok(results) => Self::interpret(results),
            Err(e) => LookupResult::Error(format!("INVALID_RESPONSE ({})", e)),
        }
    }
}

pub fn build_geocoder(config: &GeocoderConfig, client: Client) -> anyhow::Result<Arc<dyn Geocoder>> {
    Ok(match config.provider {
        GeocoderProvider::Google => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("geocoder.api_key is required for the google provider"))?;
            Arc::new(GoogleGeocoder::new(client, config.base_url.clone(), api_key))
        }
        GeocoderProvider::Nominatim => Arc::new(NominatimGeocoder::new(client, config.base_url.clone())),
    })
}

/// Sends unmatched search text to the geocoder. One request per call, no
/// retry and no cancellation; when two race, whichever result is applied last
/// wins.
#[derive(Clone)]
pub struct ExternalLookup {
    geocoder: Arc<dyn Geocoder>,
}

impl ExternalLookup {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub async fn resolve(&self, text: &str) -> LookupResult {
        debug!("geocoding {:?}", text);
        let result = self.geocoder.geocode(text).await;
        match &result {
            LookupResult::Found { position, .. } => info!("geocoded {:?} to {},{}", text, position.lat, position.lng),
            other => info!("geocoding {:?} failed: {}", text, other.status()),
        }
        result
    }
}

/// The one marker not backed by the catalog. Created on first placement,
/// moved on every later one.
#[derive(Debug, Default)]
pub struct AdHocMarker {
    id: Option<MarkerId>,
}

impl AdHocMarker {
    pub fn place(&mut self, map: &mut dyn MapWidget, position: LatLng, title: &str) -> MarkerId {
        match self.id {
            Some(id) => {
                map.move_marker(id, position);
                map.set_marker_title(id, title);
                id
            }
            None => {
                let id = map.add_marker(MarkerSpec {
                    position,
                    title: title.to_string(),
                    icon: MarkerIcon::default(),
                });
                self.id = Some(id);
                id
            }
        }
    }

    pub fn id(&self) -> Option<MarkerId> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_widget::HeadlessMap;
    use crate::models::{MapView, Viewport};

    #[test]
    fn test_google_ok_takes_first_result() {
        let body: GoogleResponse = serde_json::from_str(
            r#"{"status":"OK","results":[
                {"formatted_address":"Tokyo, Japan","geometry":{"location":{"lat":35.6762,"lng":139.6503}}},
                {"formatted_address":"Tokyo, Other","geometry":{"location":{"lat":1.0,"lng":2.0}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            GoogleGeocoder::interpret(body),
            LookupResult::Found {
                position: LatLng::new(35.6762, 139.6503),
                formatted_address: "Tokyo, Japan".to_string(),
            }
        );
    }

    #[test]
    fn test_google_statuses() {
        let zero: GoogleResponse = serde_json::from_str(r#"{"status":"ZERO_RESULTS","results":[]}"#).unwrap();
        assert_eq!(GoogleGeocoder::interpret(zero), LookupResult::NotFound);

        let denied: GoogleResponse =
            serde_json::from_str(r#"{"status":"REQUEST_DENIED","error_message":"bad key"}"#).unwrap();
        let result = GoogleGeocoder::interpret(denied);
        assert_eq!(result, LookupResult::Error("REQUEST_DENIED".to_string()));
        assert_eq!(result.status(), "REQUEST_DENIED");
    }

    #[test]
    fn test_nominatim_parses_string_coordinates() {
        let results: Vec<NominatimResult> =
            serde_json::from_str(r#"[{"lat":"35.6828","lon":"139.7595","display_name":"Tokyo, Japan"}]"#).unwrap();
        assert_eq!(
            NominatimGeocoder::interpret(results),
            LookupResult::Found {
                position: LatLng::new(35.6828, 139.7595),
                formatted_address: "Tokyo, Japan".to_string(),
            }
        );
        assert_eq!(NominatimGeocoder::interpret(Vec::new()), LookupResult::NotFound);
    }

    #[test]
    fn test_google_provider_requires_key() {
        let config = GeocoderConfig {
            provider: GeocoderProvider::Google,
            ..GeocoderConfig::default()
        };
        assert!(build_geocoder(&config, Client::new()).is_err());
    }

    #[test]
    fn test_ad_hoc_marker_is_reused() {
        let mut map = HeadlessMap::new(
            MapView { center: LatLng::new(0.0, 0.0), zoom: 2.0 },
            Viewport { width_px: 640, height_px: 480 },
        );
        let mut marker = AdHocMarker::default();
        let first = marker.place(&mut map, LatLng::new(35.0, 139.0), "Tokyo");
        let second = marker.place(&mut map, LatLng::new(48.8, 2.3), "Paris");

        assert_eq!(first, second);
        assert_eq!(map.marker_count(), 1);
        let moved = &map.marker(first).unwrap().spec;
        assert_eq!(moved.position, LatLng::new(48.8, 2.3));
        assert_eq!(moved.title, "Paris");
    }
}
