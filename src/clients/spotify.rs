//! Spotify Web API client for track metadata.
//!
//! API: <https://developer.spotify.com/documentation/web-api/reference/get-track>

use serde::{Deserialize, Serialize};
use url::Url;

use super::{ClientError, REQUEST_TIMEOUT, TokenCache, error_for_status, fetch_client_credentials};

/// Spotify ids are 22 base62 characters.
const TRACK_ID_LEN: usize = 22;

/// Track details surfaced to campaign pages.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackMetadata {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub image_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration_ms: u64,
    pub external_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<NamedObject>,
    album: AlbumObject,
    preview_url: Option<String>,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct NamedObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    name: String,
    #[serde(default)]
    images: Vec<ImageObject>,
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl From<TrackResponse> for TrackMetadata {
    fn from(track: TrackResponse) -> Self {
        Self {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album: track.album.name,
            // Spotify lists images widest first
            image_url: track.album.images.into_iter().next().map(|i| i.url),
            preview_url: track.preview_url,
            duration_ms: track.duration_ms,
            external_url: track.external_urls.spotify,
        }
    }
}

/// Spotify client using the client-credentials flow.
pub struct SpotifyClient {
    http: reqwest::Client,
    api_base: String,
    accounts_base: String,
    client_id: String,
    client_secret: String,
    token: TokenCache,
}

impl SpotifyClient {
    pub fn new(
        api_base: impl Into<String>,
        accounts_base: impl Into<String>,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            accounts_base: accounts_base.into().trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            token: TokenCache::default(),
        }
    }

    async fn access_token(&self) -> Result<String, ClientError> {
        let token_url = format!("{}/api/token", self.accounts_base);
        self.token
            .get_or_fetch(|| {
                fetch_client_credentials(&self.http, &token_url, &self.client_id, &self.client_secret)
            })
            .await
    }

    /// Fetch metadata for a track id (see [`parse_track_id`]).
    pub async fn get_track(&self, track_id: &str) -> Result<TrackMetadata, ClientError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(format!("{}/v1/tracks/{}", self.api_base, track_id))
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound("Track"));
        }

        let track: TrackResponse = error_for_status(response).await?.json().await?;
        tracing::debug!(track_id = %track.id, "Spotify track resolved");

        Ok(track.into())
    }

    /// Parse a link or URI and fetch its metadata.
    pub async fn lookup(&self, link: &str) -> Result<TrackMetadata, ClientError> {
        let track_id = parse_track_id(link)?;
        self.get_track(&track_id).await
    }
}

/// Extract a track id from the forms users paste.
///
/// Accepted:
/// - `https://open.spotify.com/track/<id>` (query string and `intl-xx/` allowed)
/// - `spotify:track:<id>`
/// - a bare 22-character id
pub fn parse_track_id(input: &str) -> Result<String, ClientError> {
    let input = input.trim();
    let invalid = || ClientError::InvalidInput("Not a Spotify track link".to_string());

    let candidate = if let Some(rest) = input.strip_prefix("spotify:track:") {
        rest.to_string()
    } else if input.contains("://") {
        let url = Url::parse(input).map_err(|_| invalid())?;
        if url.host_str() != Some("open.spotify.com") {
            return Err(invalid());
        }

        let mut segments = url
            .path_segments()
            .ok_or_else(invalid)?
            .filter(|s| !s.is_empty() && !s.starts_with("intl-"));

        match (segments.next(), segments.next()) {
            (Some("track"), Some(id)) => id.to_string(),
            _ => return Err(invalid()),
        }
    } else {
        input.to_string()
    };

    if candidate.len() == TRACK_ID_LEN && candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(candidate)
    } else {
        Err(invalid())
    }
}
