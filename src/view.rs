use crate::geo::{fit_bounds, LatLngBounds};
use crate::map_widget::{MapWidget, MarkerId};
use crate::models::{Animation, MapView};
use crate::registry::MarkerRegistry;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owner of the one pending "stop bouncing" timer.
///
/// Arming aborts whatever timer is pending, so overlapping filter passes
/// never stack timers. Each arm bumps the generation; a callback carrying an
/// older generation is ignored by [`AnimationTimer::disarm`].
#[derive(Debug, Default)]
pub struct AnimationTimer {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl AnimationTimer {
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(generation);
        }));
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Consumes the pending timer if `generation` is still current.
    pub fn disarm(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for AnimationTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug)]
pub struct ViewController {
    zoom_ceiling: f64,
    bounce: Duration,
    timer: AnimationTimer,
}

impl ViewController {
    pub fn new(zoom_ceiling: f64, bounce: Duration) -> Self {
        Self {
            zoom_ceiling,
            bounce,
            timer: AnimationTimer::default(),
        }
    }

    pub fn timer(&self) -> &AnimationTimer {
        &self.timer
    }

    /// Fits the view around `ids`, clamped to the zoom ceiling. Leaves the
    /// view alone when `ids` is empty.
    pub fn fit(&self, map: &mut dyn MapWidget, registry: &MarkerRegistry, ids: &[MarkerId]) -> Option<MapView> {
        let bounds = LatLngBounds::from_points(ids.iter().filter_map(|id| registry.get(*id)).map(|h| h.position));
        let view = fit_bounds(&bounds, map.viewport(), self.zoom_ceiling)?;
        map.set_view(view);
        debug!("fitted {} markers at zoom {}", ids.len(), view.zoom);
        Some(view)
    }

    /// Starts bouncing `ids` and arms the single stop timer. Markers left
    /// bouncing by a previous pass are stopped first and returned.
    pub fn animate<F>(
        &mut self,
        map: &mut dyn MapWidget,
        registry: &mut MarkerRegistry,
        ids: &[MarkerId],
        on_elapsed: F,
    ) -> (u64, Vec<MarkerId>)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let stopped = Self::stop_all(map, registry);
        for id in ids {
            registry.set_animation(map, *id, Animation::Bouncing);
        }
        let generation = self.timer.arm(self.bounce, on_elapsed);
        (generation, stopped)
    }

    /// Timer callback: idles every bouncing marker if `generation` is current.
    pub fn finish(&mut self, map: &mut dyn MapWidget, registry: &mut MarkerRegistry, generation: u64) -> Option<Vec<MarkerId>> {
        if !self.timer.disarm(generation) {
            debug!("ignoring stale animation timer {}", generation);
            return None;
        }
        Some(Self::stop_all(map, registry))
    }

    fn stop_all(map: &mut dyn MapWidget, registry: &mut MarkerRegistry) -> Vec<MarkerId> {
        let bouncing = registry.bouncing();
        for id in &bouncing {
            registry.set_animation(map, *id, Animation::Idle);
        }
        bouncing
    }
}
