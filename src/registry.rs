use crate::catalog::LocationCatalog;
use crate::map_widget::{MapWidget, MarkerId, MarkerSpec};
use crate::models::{Animation, LatLng, LocationRecord, MarkerIcon, MarkerSummary};

/// Live marker for one catalog entry.
#[derive(Debug, Clone)]
pub struct MarkerHandle {
    pub id: MarkerId,
    /// Index of the source record in the catalog.
    pub record: usize,
    pub position: LatLng,
    pub title: String,
    pub animation: Animation,
    pub icon: MarkerIcon,
    location: &'static LocationRecord,
}

impl MarkerHandle {
    pub fn location(&self) -> &'static LocationRecord {
        self.location
    }

    pub fn summary(&self) -> MarkerSummary {
        MarkerSummary {
            id: self.id,
            name: self.location.name,
            country: self.location.country,
            category: self.location.category,
            position: self.position,
        }
    }
}

/// One handle per catalog entry, created once in catalog order. Handles are
/// never removed; only their icon and animation change.
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    handles: Vec<MarkerHandle>,
}

impl MarkerRegistry {
    pub fn populate(catalog: &LocationCatalog, map: &mut dyn MapWidget) -> Self {
        let handles = catalog
            .records()
            .iter()
            .enumerate()
            .map(|(record, location)| {
                let spec = MarkerSpec {
                    position: location.position(),
                    title: location.name.to_string(),
                    icon: MarkerIcon::default(),
                };
                let id = map.add_marker(spec.clone());
                MarkerHandle {
                    id,
                    record,
                    position: spec.position,
                    title: spec.title,
                    animation: Animation::Idle,
                    icon: spec.icon,
                    location,
                }
            })
            .collect();
        Self { handles }
    }

    pub fn handles(&self) -> &[MarkerHandle] {
        &self.handles
    }

    pub fn get(&self, id: MarkerId) -> Option<&MarkerHandle> {
        self.handles.iter().find(|h| h.id == id)
    }

    pub fn ids(&self) -> Vec<MarkerId> {
        self.handles.iter().map(|h| h.id).collect()
    }

    pub fn bouncing(&self) -> Vec<MarkerId> {
        self.handles
            .iter()
            .filter(|h| h.animation == Animation::Bouncing)
            .map(|h| h.id)
            .collect()
    }

    pub fn set_animation(&mut self, map: &mut dyn MapWidget, id: MarkerId, animation: Animation) {
        if let Some(handle) = self.handles.iter_mut().find(|h| h.id == id) {
            handle.animation = animation;
            map.set_marker_animation(id, animation);
        }
    }

    pub fn set_icon(&mut self, map: &mut dyn MapWidget, id: MarkerId, icon: MarkerIcon) {
        if let Some(handle) = self.handles.iter_mut().find(|h| h.id == id) {
            handle.icon = icon.clone();
            map.set_marker_icon(id, icon);
        }
    }
}
