use crate::models::FilterState;
use crate::registry::MarkerHandle;

/// Keeps the handles matching every non-empty field of `state`, in catalog
/// order. Always evaluated against the full registry.
pub fn filter<'a>(handles: &'a [MarkerHandle], state: &FilterState) -> Vec<&'a MarkerHandle> {
    let needle = state.search_text.to_lowercase();
    handles
        .iter()
        .filter(|h| state.search_text.is_empty() || matches_text(h, &needle))
        .filter(|h| state.country.is_empty() || h.location().country == state.country)
        .filter(|h| state.category.is_empty() || h.location().category.as_str() == state.category)
        .collect()
}

/// The text predicate alone. An empty result for non-empty text is what
/// sends the query to the geocoder.
pub fn text_matches<'a>(handles: &'a [MarkerHandle], text: &str) -> Vec<&'a MarkerHandle> {
    let needle = text.to_lowercase();
    handles.iter().filter(|h| matches_text(h, &needle)).collect()
}

fn matches_text(handle: &MarkerHandle, needle: &str) -> bool {
    let location = handle.location();
    location.name.to_lowercase().contains(needle)
        || location.country.to_lowercase().contains(needle)
        || location.category.as_str().to_lowercase().contains(needle)
}
