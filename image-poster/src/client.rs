#![doc = "X API client: the network side of the core `Publisher` trait, used by the CLI to upload images and create posts."]
//
//! # Publisher integration (CLI <-> Core)
//!
//! This module wires the [`Publisher`] trait from
//! [`image_poster_core::contract`] to the real X endpoints using `reqwest`.
//!
//! - Construct [`XClient`] with [`Credentials`] and [`Endpoints`]; nothing is
//!   read from the environment here.
//! - Every request is signed with an OAuth 1.0a header (see [`crate::oauth`]).
//! - A non-success status fails the call; the response body is logged and
//!   carried in the error. There are no retries.

use async_trait::async_trait;
use image_poster_core::contract::{
    CreatedPost, MediaUpload, NewPost, PublishError, Publisher, UploadedMedia,
};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};

use crate::oauth::{authorization_header, Credentials};

pub const DEFAULT_MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
pub const DEFAULT_CREATE_POST_URL: &str = "https://api.twitter.com/2/tweets";

/// Remote endpoints. Defaults point at the public X API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_media_upload")]
    pub media_upload: String,
    #[serde(default = "default_create_post")]
    pub create_post: String,
}

fn default_media_upload() -> String {
    DEFAULT_MEDIA_UPLOAD_URL.to_string()
}

fn default_create_post() -> String {
    DEFAULT_CREATE_POST_URL.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            media_upload: default_media_upload(),
            create_post: default_create_post(),
        }
    }
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Serialize)]
struct PostMedia<'a> {
    media_ids: &'a [String],
}

#[derive(Serialize)]
struct PostRequest<'a> {
    text: &'a str,
    media: PostMedia<'a>,
}

#[derive(Deserialize)]
struct PostResponse {
    data: Option<PostData>,
}

#[derive(Deserialize)]
struct PostData {
    id: Option<String>,
}

pub struct XClient {
    http: Client,
    credentials: Credentials,
    media_upload_url: Url,
    create_post_url: Url,
}

impl XClient {
    pub fn new(
        credentials: Credentials,
        endpoints: &Endpoints,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let http = Client::builder()
            .user_agent(concat!("image-poster/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(http, credentials, endpoints)
    }

    /// Same as [`XClient::new`] but with a caller-built `reqwest::Client`.
    pub fn with_http_client(
        http: Client,
        credentials: Credentials,
        endpoints: &Endpoints,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let media_upload_url = Url::parse(&endpoints.media_upload).map_err(|e| {
            tracing::error!(error = %e, url = %endpoints.media_upload, "Invalid media upload URL");
            format!("invalid media upload URL {}: {e}", endpoints.media_upload)
        })?;
        let create_post_url = Url::parse(&endpoints.create_post).map_err(|e| {
            tracing::error!(error = %e, url = %endpoints.create_post, "Invalid create post URL");
            format!("invalid create post URL {}: {e}", endpoints.create_post)
        })?;
        tracing::info!(
            consumer_key_set = !credentials.consumer_key.is_empty(),
            access_token_set = !credentials.access_token.is_empty(),
            media_upload = %media_upload_url,
            create_post = %create_post_url,
            "Initialized XClient"
        );
        Ok(Self {
            http,
            credentials,
            media_upload_url,
            create_post_url,
        })
    }

    fn sign(&self, url: &Url) -> Result<String, PublishError> {
        authorization_header(&self.credentials, "POST", url)
            .map_err(|e| format!("failed to sign request for {url}: {e}").into())
    }
}

/// MIME type for the image extensions the scanner accepts.
pub fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Turns a non-success response into an error carrying status and body.
async fn ensure_success(response: Response, action: &str) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(%status, body = %body, action, "X API returned an error status");
    Err(format!("{action} failed with status {status}: {body}").into())
}

#[async_trait]
impl Publisher for XClient {
    async fn upload_media(&self, media: MediaUpload) -> Result<UploadedMedia, PublishError> {
        tracing::info!(
            file_name = %media.file_name,
            size = media.bytes.len(),
            "Uploading media"
        );
        let mime = mime_for(&media.file_name);
        let part = Part::bytes(media.bytes)
            .file_name(media.file_name.clone())
            .mime_str(mime)?;
        let form = Form::new().part("media", part);

        let response = self
            .http
            .post(self.media_upload_url.clone())
            .header(AUTHORIZATION, self.sign(&self.media_upload_url)?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, file_name = %media.file_name, "Media upload request failed");
                e
            })?;
        let response = ensure_success(response, "media upload").await?;
        let body: MediaUploadResponse = response.json().await?;

        tracing::info!(
            file_name = %media.file_name,
            media_id = %body.media_id_string,
            "Successfully uploaded media"
        );
        Ok(UploadedMedia {
            media_id: body.media_id_string,
        })
    }

    async fn create_post(&self, post: NewPost) -> Result<CreatedPost, PublishError> {
        tracing::info!(media_ids = ?post.media_ids, text_len = post.text.len(), "Creating post");
        let payload = PostRequest {
            text: &post.text,
            media: PostMedia {
                media_ids: &post.media_ids,
            },
        };

        let response = self
            .http
            .post(self.create_post_url.clone())
            .header(AUTHORIZATION, self.sign(&self.create_post_url)?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Create post request failed");
                e
            })?;
        let response = ensure_success(response, "create post").await?;

        // The id is only used for reporting; an unexpected body is not an error.
        let post_id = match response.json::<PostResponse>().await {
            Ok(body) => body.data.and_then(|d| d.id),
            Err(e) => {
                tracing::warn!(error = %e, "Post created but response body was not understood");
                None
            }
        };
        tracing::info!(post_id = ?post_id, "Successfully created post");
        Ok(CreatedPost { post_id })
    }
}
