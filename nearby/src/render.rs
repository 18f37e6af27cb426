use std::fmt::Write;

use places_api::SearchRequest;

use crate::state::SearchState;

/// Text rendering of a state snapshot: a header naming the search, the
/// `GPS` / `SEARCHING` badges, the error line if any, then the raw places as JSON.
pub fn render(state: &SearchState, request: &SearchRequest) -> String {
    let mut out = String::new();

    let mut header = format!("{} within {}km", request.search_terms, request.radius);
    let badges: Vec<&str> = [
        state.location_timestamp.map(|_| "GPS"),
        state.searching.then_some("SEARCHING"),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !badges.is_empty() {
        header.push_str("  [");
        header.push_str(&badges.join("] ["));
        header.push(']');
    }
    let _ = writeln!(out, "{}", header.trim_start());

    if let Some(error) = &state.error {
        let _ = writeln!(out, "error: {error}");
    }

    let places = serde_json::to_string_pretty(&state.places).unwrap_or_else(|_| "[]".to_string());
    let _ = writeln!(out, "{places}");
    out
}
