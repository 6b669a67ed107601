use crate::error::AppError;
use crate::map_widget::MapWidget;
use crate::models::LatLng;
use crate::registry::MarkerHandle;
use crate::template_engine::{TemplateEngine, LOOKUP_POPUP, MARKER_POPUP};
use std::sync::Arc;

/// The single popup shared by every marker. Opening it again moves it.
#[derive(Debug, Clone)]
pub struct DetailPopup {
    templates: Arc<TemplateEngine>,
}

impl DetailPopup {
    pub fn new(templates: Arc<TemplateEngine>) -> Self {
        Self { templates }
    }

    pub fn show(&self, map: &mut dyn MapWidget, handle: &MarkerHandle) -> Result<String, AppError> {
        let location = handle.location();
        let mut context = tera::Context::new();
        context.insert("name", location.name);
        context.insert("category", location.category.as_str());
        context.insert("country", location.country);
        self.open(map, handle.position, MARKER_POPUP, &context)
    }

    pub fn show_address(
        &self,
        map: &mut dyn MapWidget,
        anchor: LatLng,
        query: &str,
        formatted_address: &str,
    ) -> Result<String, AppError> {
        let mut context = tera::Context::new();
        context.insert("query", query);
        context.insert("formatted_address", formatted_address);
        self.open(map, anchor, LOOKUP_POPUP, &context)
    }

    fn open(
        &self,
        map: &mut dyn MapWidget,
        anchor: LatLng,
        template: &str,
        context: &tera::Context,
    ) -> Result<String, AppError> {
        let content = self.templates.render(template, context).map_err(AppError::Template)?;
        map.open_popup(anchor, content.clone());
        Ok(content)
    }
}
