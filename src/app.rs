use crate::catalog::LocationCatalog;
use crate::config::MapConfig;
use crate::error::AppError;
use crate::events::{Emitter, MapEvent};
use crate::filter::{filter, text_matches};
use crate::lookup::{AdHocMarker, ExternalLookup, LookupResult};
use crate::map_widget::{HeadlessMap, MapSnapshot, MapWidget, MarkerId};
use crate::models::{
    FilterOptions, FilterResponse, FilterState, LatLng, LocationRecord, LookupPlacement, MapView, MarkerIcon,
    MarkerSummary,
};
use crate::popup::DetailPopup;
use crate::registry::MarkerRegistry;
use crate::template_engine::TemplateEngine;
use crate::utils::random_color;
use crate::view::ViewController;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tracing::debug;

pub type SharedContext = Arc<Mutex<AppContext>>;

pub fn lock(context: &Mutex<AppContext>) -> MutexGuard<'_, AppContext> {
    context.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Result of one synchronous filter pass.
#[derive(Debug, Clone)]
pub struct FilterPass {
    pub state: FilterState,
    pub matches: Vec<MarkerSummary>,
    pub view: MapView,
    /// Set when the search text matched nothing and should be geocoded.
    pub lookup_query: Option<String>,
}

/// Owns all map-side state. Event listeners run under the context lock and
/// must not lock it again.
pub struct AppContext {
    catalog: LocationCatalog,
    map: HeadlessMap,
    registry: MarkerRegistry,
    filters: FilterState,
    view: ViewController,
    popup: DetailPopup,
    ad_hoc: AdHocMarker,
    lookup_zoom: f64,
    recolor_matches: bool,
    events: Emitter<MapEvent>,
    handle: Weak<Mutex<AppContext>>,
}

impl AppContext {
    pub fn shared(config: &MapConfig, templates: Arc<TemplateEngine>) -> SharedContext {
        Arc::new_cyclic(|handle| {
            let catalog = LocationCatalog::default();
            let mut map = HeadlessMap::new(config.initial_view(), config.viewport);
            let registry = MarkerRegistry::populate(&catalog, &mut map);
            debug!("registered {} markers", registry.handles().len());
            Mutex::new(Self {
                catalog,
                map,
                registry,
                filters: FilterState::default(),
                view: ViewController::new(config.zoom_ceiling, Duration::from_millis(config.bounce_ms)),
                popup: DetailPopup::new(templates),
                ad_hoc: AdHocMarker::default(),
                lookup_zoom: config.lookup_zoom,
                recolor_matches: config.recolor_matches,
                events: Emitter::new(),
                handle: handle.clone(),
            })
        })
    }

    pub fn events(&self) -> &Emitter<MapEvent> {
        &self.events
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn locations(&self) -> &'static [LocationRecord] {
        self.catalog.records()
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            countries: self.catalog.countries(),
            categories: self.catalog.categories(),
        }
    }

    pub fn map_view(&self) -> MapView {
        self.map.view()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.map.snapshot()
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn ad_hoc_marker(&self) -> Option<MarkerId> {
        self.ad_hoc.id()
    }

    pub fn apply_filter(&mut self, state: FilterState) -> FilterPass {
        self.filters = state.clone();
        let matched: Vec<MarkerId> = filter(self.registry.handles(), &self.filters).iter().map(|h| h.id).collect();
        debug!("filter {:?} matched {} markers", self.filters, matched.len());

        if self.recolor_matches && !matched.is_empty() {
            let icon = MarkerIcon { fill_color: random_color(&mut rand::thread_rng()) };
            for id in &matched {
                self.registry.set_icon(&mut self.map, *id, icon.clone());
            }
        }
        self.fit_and_animate(&matched);

        let text = &self.filters.search_text;
        let lookup_query = (!text.is_empty() && text_matches(self.registry.handles(), text).is_empty()).then(|| text.clone());

        FilterPass {
            state,
            matches: self.summaries(&matched),
            view: self.map.view(),
            lookup_query,
        }
    }

    /// Clears every filter field and brings the whole catalog back into view.
    pub fn reset(&mut self) -> FilterPass {
        self.filters = FilterState::default();
        let all = self.registry.ids();
        self.fit_and_animate(&all);
        FilterPass {
            state: FilterState::default(),
            matches: self.summaries(&all),
            view: self.map.view(),
            lookup_query: None,
        }
    }

    pub fn apply_lookup(&mut self, query: &str, result: LookupResult) -> Result<LookupPlacement, AppError> {
        let (position, formatted_address) = match result {
            LookupResult::Found { position, formatted_address } => (position, formatted_address),
            other => return Err(AppError::Geocode { status: other.status().to_string() }),
        };

        self.set_view(self.lookup_view(position));
        let id = self.ad_hoc.place(&mut self.map, position, query);
        self.events.emit(&MapEvent::AdHocMarkerPlaced { id, position });
        self.popup.show_address(&mut self.map, position, query, &formatted_address)?;
        self.events.emit(&MapEvent::PopupOpened { anchor: position });

        Ok(LookupPlacement {
            query: query.to_string(),
            formatted_address,
            position,
        })
    }

    /// Autocomplete selection: recenter on the chosen place.
    pub fn select_place(&mut self, position: LatLng) -> MapView {
        let view = self.lookup_view(position);
        self.set_view(view);
        view
    }

    pub fn lookup_view(&self, position: LatLng) -> MapView {
        MapView { center: position, zoom: self.lookup_zoom }
    }

    pub fn click_marker(&mut self, id: MarkerId) -> Result<String, AppError> {
        let handle = self.registry.get(id).ok_or(AppError::UnknownMarker(id))?;
        let content = self.popup.show(&mut self.map, handle)?;
        self.events.emit(&MapEvent::PopupOpened { anchor: handle.position });
        Ok(content)
    }

    /// Called by the animation timer.
    pub fn finish_animation(&mut self, generation: u64) {
        if let Some(stopped) = self.view.finish(&mut self.map, &mut self.registry, generation) {
            self.events.emit(&MapEvent::AnimationStopped { markers: stopped, generation });
        }
    }

    fn fit_and_animate(&mut self, ids: &[MarkerId]) {
        if let Some(view) = self.view.fit(&mut self.map, &self.registry, ids) {
            self.events.emit(&MapEvent::ViewChanged(view));
        }

        let previous = self.view.timer().generation();
        let handle = self.handle.clone();
        let (generation, stopped) = self.view.animate(&mut self.map, &mut self.registry, ids, move |generation| {
            if let Some(context) = handle.upgrade() {
                lock(&context).finish_animation(generation);
            }
        });
        if !stopped.is_empty() {
            self.events.emit(&MapEvent::AnimationStopped { markers: stopped, generation: previous });
        }
        if !ids.is_empty() {
            self.events.emit(&MapEvent::AnimationStarted { markers: ids.to_vec(), generation });
        }
    }

    fn set_view(&mut self, view: MapView) {
        self.map.set_view(view);
        self.events.emit(&MapEvent::ViewChanged(view));
    }

    fn summaries(&self, ids: &[MarkerId]) -> Vec<MarkerSummary> {
        ids.iter().filter_map(|id| self.registry.get(*id)).map(|h| h.summary()).collect()
    }
}

/// One filter input event: synchronous pass, then the geocoder fallback when
/// the search text matched nothing.
pub async fn run_filter(
    context: &SharedContext,
    lookup: &ExternalLookup,
    state: FilterState,
) -> Result<FilterResponse, AppError> {
    let pass = lock(context).apply_filter(state);
    let mut view = pass.view;

    // Another pass may run while the geocoder is awaited; the response
    // describes this pass only.
    let placement = match &pass.lookup_query {
        Some(query) => {
            let result = lookup.resolve(query).await;
            let mut guard = lock(context);
            let placement = guard.apply_lookup(query, result)?;
            view = guard.lookup_view(placement.position);
            Some(placement)
        }
        None => None,
    };

    Ok(FilterResponse {
        state: pass.state,
        matches: pass.matches,
        view,
        lookup: placement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{fit_bounds, LatLngBounds};
    use crate::lookup::Geocoder;
    use crate::models::Animation;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct FakeGeocoder {
        result: LookupResult,
        queries: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn new(result: LookupResult) -> Arc<Self> {
            Arc::new(Self { result, queries: Mutex::new(Vec::new()) })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, query: &str) -> LookupResult {
            self.queries.lock().unwrap().push(query.to_string());
            self.result.clone()
        }
    }

    /// Holds every geocode call until `release` is notified.
    struct GatedGeocoder {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Geocoder for GatedGeocoder {
        async fn geocode(&self, _query: &str) -> LookupResult {
            self.entered.notify_one();
            self.release.notified().await;
            tokyo()
        }
    }

    fn tokyo() -> LookupResult {
        LookupResult::Found {
            position: LatLng::new(35.6762, 139.6503),
            formatted_address: "Tokyo, Japan".to_string(),
        }
    }

    fn context() -> SharedContext {
        let config = MapConfig {
            recolor_matches: false,
            ..MapConfig::default()
        };
        AppContext::shared(&config, Arc::new(TemplateEngine::builtin().unwrap()))
    }

    fn state(search_text: &str, country: &str, category: &str) -> FilterState {
        FilterState {
            search_text: search_text.to_string(),
            country: country.to_string(),
            category: category.to_string(),
        }
    }

    fn record_events(context: &SharedContext) -> (Arc<Mutex<Vec<MapEvent>>>, crate::events::Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = lock(context).events().subscribe(move |event: &MapEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        (seen, subscription)
    }

    #[tokio::test]
    async fn test_belgian_restaurants() {
        let context = context();
        let geocoder = FakeGeocoder::new(tokyo());
        let lookup = ExternalLookup::new(geocoder.clone());

        let response = run_filter(&context, &lookup, state("", "Belgium", "Restaurant")).await.unwrap();
        let names: Vec<_> = response.matches.iter().map(|m| m.name).collect();

        assert_eq!(names, vec!["Takumi Ramen Kitchen", "El Pulgarcito"]);
        assert!(response.lookup.is_none());
        assert!(geocoder.queries().is_empty());
        assert!(response.view.zoom <= 14.0);
    }

    #[tokio::test]
    async fn test_unmatched_text_is_geocoded_once_as_typed() {
        let context = context();
        let geocoder = FakeGeocoder::new(tokyo());
        let lookup = ExternalLookup::new(geocoder.clone());
        let before = lock(&context).map_view();

        let response = run_filter(&context, &lookup, state("Tokyo", "", "")).await.unwrap();

        assert_eq!(geocoder.queries(), vec!["Tokyo".to_string()]);
        assert!(response.matches.is_empty());
        let placement = response.lookup.unwrap();
        assert_eq!(placement.position, LatLng::new(35.6762, 139.6503));
        assert_eq!(response.view, MapView { center: placement.position, zoom: 14.0 });
        assert_ne!(response.view, before);

        let guard = lock(&context);
        let popup = guard.snapshot().popup.unwrap();
        assert!(popup.content.contains("Tokyo"));
        assert!(popup.content.contains("Tokyo, Japan"));
        assert!(guard.ad_hoc_marker().is_some());
    }

    #[tokio::test]
    async fn test_repeat_lookups_reuse_ad_hoc_marker() {
        let context = context();
        let lookup = ExternalLookup::new(FakeGeocoder::new(tokyo()));

        run_filter(&context, &lookup, state("Tokyo", "", "")).await.unwrap();
        let first = lock(&context).ad_hoc_marker();
        run_filter(&context, &lookup, state("Shibuya", "", "")).await.unwrap();

        let guard = lock(&context);
        assert_eq!(guard.ad_hoc_marker(), first);
        let snapshot = guard.snapshot();
        assert_eq!(snapshot.markers.len(), guard.registry().handles().len() + 1);
        assert_eq!(snapshot.markers[first.unwrap()].spec.title, "Shibuya");
    }

    #[tokio::test]
    async fn test_response_describes_its_own_pass() {
        let context = context();
        let gated = Arc::new(GatedGeocoder { entered: Notify::new(), release: Notify::new() });
        let slow = ExternalLookup::new(gated.clone());
        let fast = ExternalLookup::new(FakeGeocoder::new(tokyo()));

        let tokyo_request = run_filter(&context, &slow, state("Tokyo", "", ""));
        let belgium_request = async {
            gated.entered.notified().await;
            let response = run_filter(&context, &fast, state("", "Belgium", "")).await.unwrap();
            gated.release.notify_one();
            response
        };
        let (tokyo_response, belgium_response) = tokio::join!(tokyo_request, belgium_request);
        let tokyo_response = tokyo_response.unwrap();

        assert_eq!(tokyo_response.state, state("Tokyo", "", ""));
        assert!(tokyo_response.matches.is_empty());
        assert_eq!(tokyo_response.view, MapView { center: LatLng::new(35.6762, 139.6503), zoom: 14.0 });

        assert_eq!(belgium_response.state, state("", "Belgium", ""));
        assert_eq!(belgium_response.matches.len(), 4);
        assert!(belgium_response.lookup.is_none());
        assert_ne!(belgium_response.view, tokyo_response.view);
    }

    #[tokio::test]
    async fn test_dropdowns_do_not_trigger_lookup() {
        let context = context();
        let geocoder = FakeGeocoder::new(tokyo());
        let lookup = ExternalLookup::new(geocoder.clone());
        let before = lock(&context).map_view();

        let response = run_filter(&context, &lookup, state("pizza", "Spain", "")).await.unwrap();

        assert!(response.matches.is_empty());
        assert!(response.lookup.is_none());
        assert!(geocoder.queries().is_empty());
        assert_eq!(response.view, before);
    }

    #[tokio::test]
    async fn test_unmatched_text_is_geocoded_despite_dropdowns() {
        let context = context();
        let geocoder = FakeGeocoder::new(tokyo());
        let lookup = ExternalLookup::new(geocoder.clone());

        let response = run_filter(&context, &lookup, state("Tokyo", "Belgium", "Restaurant")).await.unwrap();

        assert_eq!(geocoder.queries(), vec!["Tokyo".to_string()]);
        assert!(response.matches.is_empty());
        assert_eq!(response.state, state("Tokyo", "Belgium", "Restaurant"));
        assert!(response.lookup.is_some());
    }

    #[tokio::test]
    async fn test_failed_lookup_reports_status() {
        let context = context();
        let lookup = ExternalLookup::new(FakeGeocoder::new(LookupResult::NotFound));

        let err = run_filter(&context, &lookup, state("Atlantis", "", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "Geocode was not successful for the following reason: ZERO_RESULTS");
        assert!(lock(&context).ad_hoc_marker().is_none());

        let lookup = ExternalLookup::new(FakeGeocoder::new(LookupResult::Error("OVER_QUERY_LIMIT".to_string())));
        let err = run_filter(&context, &lookup, state("Atlantis", "", "")).await.unwrap_err();
        assert!(matches!(err, AppError::Geocode { status } if status == "OVER_QUERY_LIMIT"));
    }

    #[tokio::test]
    async fn test_reset_restores_full_view() {
        let context = context();
        let lookup = ExternalLookup::new(FakeGeocoder::new(tokyo()));
        run_filter(&context, &lookup, state("hotel", "Germany", "Hotel")).await.unwrap();

        let mut guard = lock(&context);
        let pass = guard.reset();

        assert_eq!(guard.filters(), &FilterState::default());
        assert_eq!(pass.matches.len(), guard.registry().handles().len());
        let all = LatLngBounds::from_points(guard.registry().handles().iter().map(|h| h.position));
        let expected = fit_bounds(&all, guard.snapshot().viewport, 14.0).unwrap();
        assert_eq!(pass.view, expected);
        assert_eq!(guard.registry().bouncing().len(), guard.registry().handles().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounce_stops_after_delay() {
        let context = context();
        let (events, _subscription) = record_events(&context);

        let pass = lock(&context).apply_filter(state("", "Austria", ""));
        assert_eq!(lock(&context).registry().bouncing().len(), pass.matches.len());

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let guard = lock(&context);
        assert!(guard.registry().bouncing().is_empty());
        assert!(guard.snapshot().markers.iter().all(|m| m.animation == Animation::Idle));
        let stops = events.lock().unwrap().iter().filter(|e| matches!(e, MapEvent::AnimationStopped { .. })).count();
        assert_eq!(stops, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_passes_keep_one_timer() {
        let context = context();
        let (events, _subscription) = record_events(&context);

        lock(&context).apply_filter(state("", "Austria", ""));
        tokio::time::sleep(Duration::from_millis(700)).await;
        let second = lock(&context).apply_filter(state("", "Italy", ""));
        let italy: Vec<MarkerId> = second.matches.iter().map(|m| m.id).collect();

        // The first pass's timer would have fired at 1400 ms.
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(lock(&context).registry().bouncing(), italy);

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(lock(&context).registry().bouncing().is_empty());

        let stops: Vec<u64> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                MapEvent::AnimationStopped { generation, .. } => Some(*generation),
                _ => None,
            })
            .collect();
        assert_eq!(stops, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_click_marker_opens_popup() {
        let context = context();
        let mut guard = lock(&context);
        let html = guard.click_marker(2).unwrap();
        assert!(html.contains("Hotel Berlin Gendarmenmarkt"));
        assert!(matches!(guard.click_marker(999), Err(AppError::UnknownMarker(999))));
    }

    #[tokio::test]
    async fn test_recolor_tints_matches_only() {
        let config = MapConfig::default();
        let context = AppContext::shared(&config, Arc::new(TemplateEngine::builtin().unwrap()));
        let pass = lock(&context).apply_filter(state("", "France", ""));

        let guard = lock(&context);
        let snapshot = guard.snapshot();
        let tint = &snapshot.markers[pass.matches[0].id].spec.icon.fill_color;
        assert!(tint.starts_with('#'));
        for marker in &snapshot.markers {
            let matched = pass.matches.iter().any(|m| m.id == marker.id);
            assert_eq!(&marker.spec.icon.fill_color == tint, matched);
        }
    }
}
