use serde::{Deserialize, Serialize};

/// Birth data and "now" data for one conversation. Owned by a single
/// orchestration call; never shared across calls.
///
/// Datetimes are ISO-8601 strings and coordinates are `"lat,lng"` strings,
/// passed through verbatim to the chart provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationContext {
    pub birth_datetime: String,
    pub birth_coordinates: String,
    pub transit_datetime: String,
    pub current_coordinates: String,
}

impl ConversationContext {
    /// Build a context, defaulting `current_coordinates` to the birth
    /// coordinates when the caller did not supply them. The defaulting
    /// happens exactly once, here; after construction the field is never
    /// empty.
    pub fn new(
        birth_datetime: impl Into<String>,
        birth_coordinates: impl Into<String>,
        transit_datetime: impl Into<String>,
        current_coordinates: Option<String>,
    ) -> Self {
        let birth_coordinates = birth_coordinates.into();
        let current_coordinates =
            current_coordinates.unwrap_or_else(|| birth_coordinates.clone());
        Self {
            birth_datetime: birth_datetime.into(),
            birth_coordinates,
            transit_datetime: transit_datetime.into(),
            current_coordinates,
        }
    }
}
