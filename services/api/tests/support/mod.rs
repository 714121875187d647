#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::Result;
use api::{
    AppConfig, AppState, Backends,
    config::ServerConfig,
    models::{
        notes::Note,
        playlist::{NewPlaylist, Playlist, VideoEntry},
    },
    rate_limiter::RateLimitConfig,
    repositories::{CreatePlaylistError, NoteStore, PlaylistStore},
    youtube::{CatalogError, PlaylistMetadata, VideoCatalog, VideoPage, YoutubeConfig},
};
use async_trait::async_trait;
use auth::{
    AuthError, AuthFlow, AuthResult, CreateUserError, IdentityProvider, JwtConfig, NewUser,
    OAuthConfig, OAuthIdentity, User, UserStore,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use bytes::Bytes;
use chrono::Utc;
use common::DatabaseConfig;
use media::{ImageStore, StorageConfig};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const PUBLIC_BASE: &str = "http://localhost:9000/storage/v1/object/public/editor-images";
pub const GOOD_CODE: &str = "good-code";

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    pub fn remove(&self, email: &str) {
        self.users.lock().unwrap().retain(|user| user.email != email);
    }
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn create(&self, new_user: &NewUser) -> Result<User, CreateUserError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|user| user.email == new_user.email) {
            return Err(CreateUserError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            account_type: new_user.account_type,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.id == id).cloned())
    }
}

/// Accepts only `GOOD_CODE`, vouching for `oauth@example.com`
pub struct StubIdentityProvider;

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn authorization_url(&self, flow: AuthFlow) -> AuthResult<String> {
        Ok(format!(
            "https://accounts.example.com/auth?redirect_uri=http://localhost:5173/{}-callback",
            flow
        ))
    }

    async fn exchange_code(&self, code: &str, _flow: AuthFlow) -> AuthResult<OAuthIdentity> {
        if code != GOOD_CODE {
            return Err(AuthError::MissingIdToken);
        }
        Ok(OAuthIdentity {
            name: "OAuth User".to_string(),
            email: "oauth@example.com".to_string(),
            picture: Some("https://example.com/me.png".to_string()),
        })
    }
}

#[derive(Default)]
pub struct InMemoryPlaylists {
    playlists: Mutex<Vec<Playlist>>,
}

impl InMemoryPlaylists {
    pub fn all(&self) -> Vec<Playlist> {
        self.playlists.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaylistStore for InMemoryPlaylists {
    async fn exists(&self, user_id: Uuid, external_id: &str) -> Result<bool> {
        let playlists = self.playlists.lock().unwrap();
        Ok(playlists
            .iter()
            .any(|p| p.user_id == user_id && p.external_id == external_id))
    }

    async fn create(&self, new_playlist: NewPlaylist) -> Result<Playlist, CreatePlaylistError> {
        let mut playlists = self.playlists.lock().unwrap();
        if playlists
            .iter()
            .any(|p| p.user_id == new_playlist.user_id && p.external_id == new_playlist.external_id)
        {
            return Err(CreatePlaylistError::AlreadyExists);
        }
        let playlist = Playlist {
            id: Uuid::new_v4(),
            user_id: new_playlist.user_id,
            external_id: new_playlist.external_id,
            title: new_playlist.title,
            image_url: new_playlist.image_url,
            completed_count: Playlist::count_completed(&new_playlist.content),
            content: new_playlist.content,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Playlist>> {
        let playlists = self.playlists.lock().unwrap();
        Ok(playlists
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Playlist>> {
        let playlists = self.playlists.lock().unwrap();
        Ok(playlists
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut playlists = self.playlists.lock().unwrap();
        let before = playlists.len();
        playlists.retain(|p| !(p.id == id && p.user_id == user_id));
        Ok(playlists.len() < before)
    }

    async fn update_completion(&self, playlist: &Playlist) -> Result<()> {
        let mut playlists = self.playlists.lock().unwrap();
        if let Some(stored) = playlists
            .iter_mut()
            .find(|p| p.id == playlist.id && p.user_id == playlist.user_id)
        {
            stored.content = playlist.content.clone();
            stored.completed_count = playlist.completed_count;
            stored.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNotes {
    notes: Mutex<Vec<Note>>,
}

impl InMemoryNotes {
    pub fn all(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteStore for InMemoryNotes {
    async fn find(&self, user_id: Uuid, video_id: &str) -> Result<Option<Note>> {
        let notes = self.notes.lock().unwrap();
        Ok(notes
            .iter()
            .find(|n| n.user_id == user_id && n.video_id == video_id)
            .cloned())
    }

    async fn create(
        &self,
        user_id: Uuid,
        video_id: &str,
        playlist_id: Uuid,
        content: &Value,
    ) -> Result<Note> {
        let note = Note {
            id: Uuid::new_v4(),
            user_id,
            video_id: video_id.to_string(),
            playlist_id,
            content: content.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.notes.lock().unwrap().push(note.clone());
        Ok(note)
    }

    async fn update_content(&self, id: Uuid, content: &Value) -> Result<Note> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| anyhow::anyhow!("note {} not found", id))?;
        note.content = content.clone();
        note.updated_at = Utc::now();
        Ok(note.clone())
    }
}

/// A playlist of `total` videos served `page_size` at a time
pub struct FakeCatalog {
    pub total: usize,
    pub page_size: usize,
    pub metadata: Option<PlaylistMetadata>,
    pub fail_pages: bool,
    pages_served: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            total,
            page_size,
            metadata: Some(PlaylistMetadata {
                title: "Rust Course".to_string(),
                image_url: "https://i.ytimg.com/vi/x/maxresdefault.jpg".to_string(),
            }),
            fail_pages: false,
            pages_served: AtomicUsize::new(0),
        }
    }

    pub fn without_metadata(mut self) -> Self {
        self.metadata = None;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_pages = true;
        self
    }

    pub fn pages_served(&self) -> usize {
        self.pages_served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoCatalog for FakeCatalog {
    async fn playlist_metadata(
        &self,
        _playlist_id: &str,
    ) -> Result<Option<PlaylistMetadata>, CatalogError> {
        Ok(self.metadata.clone())
    }

    async fn playlist_page(
        &self,
        _playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<VideoPage, CatalogError> {
        if self.fail_pages {
            return Err(CatalogError::Status(StatusCode::FORBIDDEN));
        }
        self.pages_served.fetch_add(1, Ordering::SeqCst);

        let start: usize = page_token
            .map(|token| token.parse().expect("numeric page token"))
            .unwrap_or(0);
        let end = (start + self.page_size).min(self.total);
        let entries = (start..end)
            .map(|i| VideoEntry::new(format!("Video {i}"), format!("vid{i}"), None))
            .collect();

        Ok(VideoPage {
            entries,
            next_page_token: (end < self.total).then(|| end.to_string()),
        })
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    objects: Mutex<Vec<(String, String)>>,
}

impl MemoryImageStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, key: &str, _body: Bytes, content_type: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().retain(|(k, _)| k != key);
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 7200,
        },
        oauth: OAuthConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            auth_url: "https://accounts.example.com/auth".to_string(),
            token_url: "https://accounts.example.com/token".to_string(),
            redirect_url_login: "http://localhost:5173/login-callback".to_string(),
            redirect_url_signup: "http://localhost:5173/signup-callback".to_string(),
        },
        youtube: YoutubeConfig {
            api_key: "yt-key".to_string(),
            base_url: "http://youtube.invalid".to_string(),
            page_size: 50,
            max_entries: 150,
        },
        storage: StorageConfig {
            bucket: "editor-images".to_string(),
            public_base_url: PUBLIC_BASE.to_string(),
            region: None,
            endpoint: None,
        },
        rate_limit: RateLimitConfig::default(),
    }
}

/// A router over in-memory backends, with handles on every store
pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUsers>,
    pub playlists: Arc<InMemoryPlaylists>,
    pub notes: Arc<InMemoryNotes>,
    pub images: Arc<MemoryImageStore>,
    pub config: AppConfig,
}

/// Response of a test request
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), FakeCatalog::new(12, 5))
    }

    pub fn with_catalog(catalog: FakeCatalog) -> Self {
        Self::with(test_config(), catalog)
    }

    pub fn with(config: AppConfig, catalog: FakeCatalog) -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let playlists = Arc::new(InMemoryPlaylists::default());
        let notes = Arc::new(InMemoryNotes::default());
        let images = Arc::new(MemoryImageStore::default());

        let state = AppState::new(
            config.clone(),
            Backends {
                db_pool: None,
                users: users.clone(),
                identity_provider: Arc::new(StubIdentityProvider),
                playlists: playlists.clone(),
                notes: notes.clone(),
                catalog: Arc::new(catalog),
                image_store: images.clone(),
            },
        )
        .expect("state");

        Self {
            router: api::create_router(state),
            users,
            playlists,
            notes,
            images,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request("GET", path, token, Body::empty(), None))
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request("DELETE", path, token, Body::empty(), None))
            .await
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(
            "POST",
            path,
            token,
            Body::from(body.to_string()),
            Some("application/json"),
        ))
        .await
    }

    /// Sign up a password account and return its bearer token
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> String {
        let response = self
            .post_json(
                "/auth/signup",
                None,
                serde_json::json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "signup failed: {}", response.body);
        response.body["accessToken"]
            .as_str()
            .expect("accessToken")
            .to_string()
    }

    /// Import the fake catalog's playlist and return its document id
    pub async fn import(&self, token: &str, external_id: &str) -> String {
        let response = self
            .get(&format!("/playList/addPlaylist/{external_id}"), Some(token))
            .await;
        assert_eq!(response.status, StatusCode::OK, "import failed: {}", response.body);

        let listed = self.get("/playList/getPlaylists", Some(token)).await;
        listed.body["playLists"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["playListId"] == external_id)
            .expect("imported playlist")["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub fn request(
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}
