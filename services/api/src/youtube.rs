//! YouTube Data API client
//!
//! Upstream JSON is parsed into typed structs at this edge; a response that
//! does not match them fails the import instead of storing partial records.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{error, info};

use crate::models::playlist::{Thumbnail, VideoEntry};

/// YouTube Data API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Items requested per `playlistItems` page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// No further page is requested once this many entries are collected
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_max_entries() -> usize {
    150
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("playlist not found upstream")]
    NotFound,

    #[error("YouTube API unreachable: {0}")]
    Unreachable(String),

    #[error("YouTube API returned {0}")]
    Status(StatusCode),

    #[error("unexpected YouTube API response: {0}")]
    Malformed(String),
}

/// Title and cover image of a playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistMetadata {
    pub title: String,
    pub image_url: String,
}

/// One page of playlist entries
#[derive(Debug, Clone, Default)]
pub struct VideoPage {
    pub entries: Vec<VideoEntry>,
    pub next_page_token: Option<String>,
}

/// Video catalog adapter contract
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Metadata of a playlist, `None` when the id matches nothing
    async fn playlist_metadata(
        &self,
        playlist_id: &str,
    ) -> Result<Option<PlaylistMetadata>, CatalogError>;

    /// One page of a playlist's videos, starting at `page_token`
    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<VideoPage, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<PlaylistResource>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResource {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<ThumbnailResource>,
    medium: Option<ThumbnailResource>,
    high: Option<ThumbnailResource>,
    standard: Option<ThumbnailResource>,
    maxres: Option<ThumbnailResource>,
}

#[derive(Debug, Clone, Deserialize)]
struct ThumbnailResource {
    url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl Thumbnails {
    /// Largest available rendition
    fn cover(&self) -> Option<&ThumbnailResource> {
        self.maxres
            .as_ref()
            .or(self.standard.as_ref())
            .or(self.high.as_ref())
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
    }

    /// Smallest available rendition
    fn preview(&self) -> Option<&ThumbnailResource> {
        self.default
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.high.as_ref())
            .or(self.standard.as_ref())
            .or(self.maxres.as_ref())
    }
}

impl From<&ThumbnailResource> for Thumbnail {
    fn from(resource: &ThumbnailResource) -> Self {
        Thumbnail {
            url: resource.url.clone(),
            width: resource.width,
            height: resource.height,
        }
    }
}

fn metadata_from_response(response: PlaylistListResponse) -> Option<PlaylistMetadata> {
    let playlist = response.items.into_iter().next()?;
    let image_url = playlist
        .snippet
        .thumbnails
        .cover()
        .map(|thumbnail| thumbnail.url.clone())
        .unwrap_or_default();

    Some(PlaylistMetadata {
        title: playlist.snippet.title,
        image_url,
    })
}

fn page_from_response(response: PlaylistItemListResponse) -> VideoPage {
    let entries = response
        .items
        .into_iter()
        .map(|item| {
            let thumbnail = item.snippet.thumbnails.preview().map(Thumbnail::from);
            VideoEntry::new(item.snippet.title, item.snippet.resource_id.video_id, thumbnail)
        })
        .collect();

    VideoPage {
        entries,
        next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
    }
}

/// HTTP client for the YouTube Data API v3
#[derive(Clone)]
pub struct YoutubeClient {
    http_client: Client,
    config: YoutubeConfig,
}

impl YoutubeClient {
    pub fn new(config: YoutubeConfig) -> Self {
        Self {
            http_client: Client::new(),
            config,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("YouTube API request to {} failed: {}", resource, e);
                CatalogError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("YouTube API error ({}) on {}: {}", status, resource, body);
            return Err(CatalogError::Status(status));
        }

        response.json::<T>().await.map_err(|e| {
            error!("Unexpected YouTube API payload from {}: {}", resource, e);
            CatalogError::Malformed(e.to_string())
        })
    }
}

#[async_trait]
impl VideoCatalog for YoutubeClient {
    async fn playlist_metadata(
        &self,
        playlist_id: &str,
    ) -> Result<Option<PlaylistMetadata>, CatalogError> {
        info!("Fetching metadata of playlist {}", playlist_id);

        let response: PlaylistListResponse = self
            .get(
                "playlists",
                &[("part", "snippet,contentDetails"), ("id", playlist_id)],
            )
            .await?;

        Ok(metadata_from_response(response))
    }

    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<VideoPage, CatalogError> {
        let page_size = self.config.page_size.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("maxResults", page_size.as_str()),
            ("playlistId", playlist_id),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: PlaylistItemListResponse = self.get("playlistItems", &query).await?;
        Ok(page_from_response(response))
    }
}
