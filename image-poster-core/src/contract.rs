//! # contract: the seam between the pipeline and the remote API
//!
//! This module defines the [`Publisher`] trait and the plain data types that
//! cross it. The pipeline in [`crate::run`] only talks to the network through
//! this trait, so the same orchestration drives the real HTTP client and the
//! `mockall` mocks used in tests.
//!
//! ## Contract
//! - `upload_media` is called once per selected image, in selection order.
//! - `create_post` is called once, only after every upload succeeded.
//! - Implementors perform no retries; the first error ends the run.
//! - Errors are boxed trait objects so transport details stay out of core.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Boxed error returned across the publisher seam.
pub type PublishError = Box<dyn std::error::Error + Send + Sync>;

/// Raw bytes of one image, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// File name sent along with the bytes (e.g. `cat.png`).
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Media reference handed back by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub media_id: String,
}

/// A post to create. Text may be empty when media is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub text: String,
    pub media_ids: Vec<String>,
}

/// The created post. Some endpoints do not echo an id back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    pub post_id: Option<String>,
}

/// Trait for uploading media and publishing a post that references it.
///
/// Implemented by the HTTP client in the CLI crate and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload one image and return its media reference.
    async fn upload_media(&self, media: MediaUpload) -> Result<UploadedMedia, PublishError>;

    /// Publish a post with the given media references attached.
    async fn create_post(&self, post: NewPost) -> Result<CreatedPost, PublishError>;
}
