use crate::models::{Animation, LatLng, MapView, MarkerIcon, Viewport};
use serde::Serialize;

pub type MarkerId = usize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub title: String,
    pub icon: MarkerIcon,
}

pub trait MapWidget: Send {
    fn view(&self) -> MapView;
    fn set_view(&mut self, view: MapView);
    fn viewport(&self) -> Viewport;

    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId;
    fn move_marker(&mut self, id: MarkerId, position: LatLng);
    fn set_marker_title(&mut self, id: MarkerId, title: &str);
    fn set_marker_icon(&mut self, id: MarkerId, icon: MarkerIcon);
    fn set_marker_animation(&mut self, id: MarkerId, animation: Animation);

    /// Opens the popup anchored at `anchor`, replacing any popup already open.
    fn open_popup(&mut self, anchor: LatLng, content: String);
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderedMarker {
    pub id: MarkerId,
    #[serde(flatten)]
    pub spec: MarkerSpec,
    pub animation: Animation,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderedPopup {
    pub anchor: LatLng,
    pub content: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct MapSnapshot {
    pub view: MapView,
    pub viewport: Viewport,
    pub markers: Vec<RenderedMarker>,
    pub popup: Option<RenderedPopup>,
}

#[derive(Debug, Clone)]
pub struct HeadlessMap {
    view: MapView,
    viewport: Viewport,
    markers: Vec<RenderedMarker>,
    popup: Option<RenderedPopup>,
}

impl HeadlessMap {
    pub fn new(view: MapView, viewport: Viewport) -> Self {
        Self {
            view,
            viewport,
            markers: Vec::new(),
            popup: None,
        }
    }

    pub fn marker(&self, id: MarkerId) -> Option<&RenderedMarker> {
        self.markers.get(id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn popup(&self) -> Option<&RenderedPopup> {
        self.popup.as_ref()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            view: self.view,
            viewport: self.viewport,
            markers: self.markers.clone(),
            popup: self.popup.clone(),
        }
    }
}

impl MapWidget for HeadlessMap {
    fn view(&self) -> MapView {
        self.view
    }

    fn set_view(&mut self, view: MapView) {
        self.view = view;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId {
        let id = self.markers.len();
        self.markers.push(RenderedMarker {
            id,
            spec,
            animation: Animation::Idle,
        });
        id
    }

    fn move_marker(&mut self, id: MarkerId, position: LatLng) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.spec.position = position;
        }
    }

    fn set_marker_title(&mut self, id: MarkerId, title: &str) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.spec.title = title.to_string();
        }
    }

    fn set_marker_icon(&mut self, id: MarkerId, icon: MarkerIcon) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.spec.icon = icon;
        }
    }

    fn set_marker_animation(&mut self, id: MarkerId, animation: Animation) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.animation = animation;
        }
    }

    fn open_popup(&mut self, anchor: LatLng, content: String) {
        self.popup = Some(RenderedPopup { anchor, content });
    }
}
