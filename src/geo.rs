use crate::models::{LatLng, MapView, Viewport};
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;
pub const MAX_ZOOM: f64 = 21.0;
const MAX_LATITUDE: f64 = 85.05112878;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLngBounds {
    extent: Option<(LatLng, LatLng)>,
}

impl LatLngBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points<I: IntoIterator<Item = LatLng>>(points: I) -> Self {
        let mut bounds = Self::new();
        for point in points {
            bounds.extend(point);
        }
        bounds
    }

    pub fn extend(&mut self, point: LatLng) {
        self.extent = Some(match self.extent {
            None => (point, point),
            Some((sw, ne)) => (
                LatLng::new(sw.lat.min(point.lat), sw.lng.min(point.lng)),
                LatLng::new(ne.lat.max(point.lat), ne.lng.max(point.lng)),
            ),
        });
    }

    pub fn contains(&self, point: LatLng) -> bool {
        match self.extent {
            None => false,
            Some((sw, ne)) => {
                point.lat >= sw.lat && point.lat <= ne.lat && point.lng >= sw.lng && point.lng <= ne.lng
            }
        }
    }
}

/// Projects onto the unit square, x growing east and y growing south.
pub fn project(point: LatLng) -> (f64, f64) {
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (point.lng + 180.0) / 360.0;
    let y = 0.5 - ((1.0 + lat.sin()) / (1.0 - lat.sin())).ln() / (4.0 * PI);
    (x, y)
}

pub fn unproject(x: f64, y: f64) -> LatLng {
    let lng = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Largest integral zoom at which `bounds` fits into `viewport`, capped at
/// `zoom_ceiling`. Returns `None` for empty bounds so callers leave the view
/// untouched.
pub fn fit_bounds(bounds: &LatLngBounds, viewport: Viewport, zoom_ceiling: f64) -> Option<MapView> {
    let (sw, ne) = bounds.extent?;
    let (x0, y0) = project(LatLng::new(ne.lat, sw.lng));
    let (x1, y1) = project(LatLng::new(sw.lat, ne.lng));

    let zoom_for = |span: f64, pixels: u32| {
        if span <= 0.0 {
            MAX_ZOOM
        } else {
            (f64::from(pixels) / (TILE_SIZE * span)).log2()
        }
    };
    let zoom = zoom_for(x1 - x0, viewport.width_px)
        .min(zoom_for(y1 - y0, viewport.height_px))
        .floor()
        .clamp(0.0, MAX_ZOOM)
        .min(zoom_ceiling);

    Some(MapView {
        center: unproject((x0 + x1) / 2.0, (y0 + y1) / 2.0),
        zoom,
    })
}
