//! Spotify track lookup.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{clients::spotify::TrackMetadata, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    /// Track link, `spotify:track:` URI, or bare id
    pub url: String,
}

/// Resolve track metadata for campaign forms.
///
/// `GET /api/v1/spotify/track?url=https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT`
///
/// # Response (200)
///
/// ```json
/// {
///   "id": "4cOdK2wGLETKBW3PvgPWqT",
///   "name": "Never Gonna Give You Up",
///   "artists": ["Rick Astley"],
///   "album": "Whenever You Need Somebody",
///   "image_url": "https://i.scdn.co/image/...",
///   "preview_url": null,
///   "duration_ms": 213573,
///   "external_url": "https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT"
/// }
/// ```
pub async fn get_track(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackMetadata>, AppError> {
    let track = state.spotify()?.lookup(&query.url).await?;
    Ok(Json(track))
}
