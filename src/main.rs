use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
    middleware::{self, Next},
    http::Request,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, debug};
use tracing_subscriber::EnvFilter;

use poimap::app::{lock, run_filter, AppContext, SharedContext};
use poimap::config::Config;
use poimap::error::AppError;
use poimap::events::MapEvent;
use poimap::lookup::{build_geocoder, ExternalLookup};
use poimap::models::{self, FilterState, OsPreference, PlaceSelection};
use poimap::preferences::SqlitePreferenceStore;
use poimap::template_engine::TemplateEngine;
use poimap::theme::ThemeController;
use poimap::utils::build_http_client;

struct AppState {
    context: SharedContext,
    lookup: ExternalLookup,
    theme: Mutex<ThemeController>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;
    let thread_count = config.thread_count.unwrap_or_else(num_cpus::get);

    info!("starting server with {} threads", thread_count);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(thread_count)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn log_request_response(
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().to_string();
    info!("incoming request: {} {}", method, path);
    let response = next.run(req).await;
    info!("request result: {} for {} {}", response.status(), method, path);
    response
}

async fn async_main(config: Config) -> anyhow::Result<()> {
    let templates = Arc::new(TemplateEngine::new(config.template_dir.clone())?);
    let http_client = build_http_client(&config.geocoder.user_agent, config.geocoder.timeout_secs)?;
    let geocoder = build_geocoder(&config.geocoder, http_client)?;

    let context = AppContext::shared(&config.map, templates);
    let _event_log = lock(&context).events().subscribe(log_map_event);

    let store = Arc::new(SqlitePreferenceStore::open(&config.theme.database).await?);
    let theme = ThemeController::init(store, config.theme.policy, config.theme.os_prefers_dark).await?;

    let state = Arc::new(AppState {
        context,
        lookup: ExternalLookup::new(geocoder),
        theme: Mutex::new(theme),
    });

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("listening on {}", config.listen_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/locations", get(get_locations))
        .route("/api/filters/options", get(get_filter_options))
        .route("/api/filter", post(post_filter))
        .route("/api/reset", post(post_reset))
        .route("/api/markers/{id}/click", post(post_marker_click))
        .route("/api/place", post(post_place))
        .route("/api/map", get(get_map))
        .route("/api/theme", get(get_theme))
        .route("/api/theme/toggle", post(post_theme_toggle))
        .route("/api/theme/os-preference", post(post_os_preference))
        .layer(middleware::from_fn(log_request_response))
        .with_state(state)
}

fn log_map_event(event: &MapEvent) {
    match event {
        MapEvent::ViewChanged(view) => debug!("view -> {},{} z{}", view.center.lat, view.center.lng, view.zoom),
        MapEvent::AnimationStarted { markers, generation } => debug!("bounce #{} on {} markers", generation, markers.len()),
        MapEvent::AnimationStopped { markers, generation } => debug!("bounce #{} stopped on {} markers", generation, markers.len()),
        MapEvent::PopupOpened { anchor } => debug!("popup at {},{}", anchor.lat, anchor.lng),
        MapEvent::AdHocMarkerPlaced { id, position } => debug!("ad-hoc marker {} at {},{}", id, position.lat, position.lng),
    }
}

// --- Handlers ---

async fn get_locations(State(state): State<Arc<AppState>>) -> Response {
    Json(lock(&state.context).locations()).into_response()
}

async fn get_filter_options(State(state): State<Arc<AppState>>) -> Response {
    Json(lock(&state.context).filter_options()).into_response()
}

async fn post_filter(State(state): State<Arc<AppState>>, Json(params): Json<FilterState>) -> Result<Response, AppError> {
    let response = run_filter(&state.context, &state.lookup, params).await?;
    Ok(Json(response).into_response())
}

async fn post_reset(State(state): State<Arc<AppState>>) -> Response {
    let pass = lock(&state.context).reset();
    Json(models::FilterResponse {
        state: pass.state,
        matches: pass.matches,
        view: pass.view,
        lookup: None,
    })
    .into_response()
}

async fn post_marker_click(State(state): State<Arc<AppState>>, Path(id): Path<usize>) -> Result<Response, AppError> {
    let content = lock(&state.context).click_marker(id)?;
    Ok(([("content-type", "text/html; charset=utf-8")], content).into_response())
}

async fn post_place(State(state): State<Arc<AppState>>, Json(place): Json<PlaceSelection>) -> Response {
    let view = lock(&state.context).select_place(models::LatLng::new(place.lat, place.lng));
    Json(view).into_response()
}

async fn get_map(State(state): State<Arc<AppState>>) -> Response {
    Json(lock(&state.context).snapshot()).into_response()
}

async fn get_theme(State(state): State<Arc<AppState>>) -> Response {
    Json(state.theme.lock().await.response()).into_response()
}

async fn post_theme_toggle(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let mut theme = state.theme.lock().await;
    theme.toggle().await?;
    Ok(Json(theme.response()).into_response())
}

async fn post_os_preference(State(state): State<Arc<AppState>>, Json(pref): Json<OsPreference>) -> Response {
    let mut theme = state.theme.lock().await;
    theme.on_os_preference_change(pref.dark);
    Json(theme.response()).into_response()
}
