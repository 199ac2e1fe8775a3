//! High-level pipeline: orchestrates load → scan → select → publish → record.
//!
//! One call to [`post_batch`] performs a complete bot run:
//!   - loads the posted set from the layout's record file
//!   - scans the image pool for unposted images and draws a batch of four
//!   - uploads each image through a [`Publisher`] and creates one post
//!     referencing all media
//!   - records the batch in the posted set, moves the files into the posted
//!     archive and saves the record
//!
//! # Failure model
//! Every step is fail-fast and nothing is retried. The archive directory is
//! created before anything is uploaded; the record file and the image files
//! are only touched after the post was created, so a failed scan, selection,
//! upload or post leaves them exactly as they were. Remote side
//! effects that already happened (uploaded media, a created post) are not
//! undone; the media ids are logged and carried in [`RunError::Post`] so they
//! can be reconciled by hand.
//!
//! The steps are also exposed separately ([`plan_batch`], [`publish_batch`],
//! [`record_batch`]) so the CLI can offer a dry run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Layout;
use crate::contract::{MediaUpload, NewPost, PublishError, Publisher};
use crate::scan::{list_unposted, Candidate, ScanError};
use crate::select::{select_batch, SelectError};
use crate::state::{PostedSet, StateError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error("failed to read image {}: {source}", .path.display())]
    ReadMedia {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("media upload failed for {id}: {source}")]
    Upload {
        id: String,
        #[source]
        source: PublishError,
    },

    #[error("creating the post failed after uploading media {media_ids:?}: {source}")]
    Post {
        media_ids: Vec<String>,
        #[source]
        source: PublishError,
    },

    #[error("failed to create archive directory {}: {source}", .path.display())]
    ArchiveDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

/// The images chosen for this run together with the record they were checked against.
#[derive(Debug, Clone)]
pub struct Batch {
    pub posted: PostedSet,
    pub candidates: Vec<Candidate>,
}

/// What the remote side handed back for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub media_ids: Vec<String>,
    pub post_id: Option<String>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReport {
    pub post_id: Option<String>,
    pub media_ids: Vec<String>,
    /// Identifiers added to the posted set, in batch order.
    pub recorded: Vec<String>,
}

/// Loads the record, scans the pool and draws a batch. Touches nothing.
pub fn plan_batch<R>(layout: &Layout, rng: &mut R) -> Result<Batch, RunError>
where
    R: Rng + ?Sized,
{
    let posted = PostedSet::load(&layout.state_path());
    let unposted = list_unposted(layout, &posted)?;
    let candidates = select_batch(&unposted, rng)?;
    Ok(Batch { posted, candidates })
}

/// Uploads every image in order, then creates one post with all media ids.
pub async fn publish_batch<P>(candidates: &[Candidate], publisher: &P) -> Result<Published, RunError>
where
    P: Publisher + ?Sized,
{
    let mut media_ids = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let bytes = tokio::fs::read(&candidate.path)
            .await
            .map_err(|source| RunError::ReadMedia {
                path: candidate.path.clone(),
                source,
            })?;
        let file_name = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| candidate.id.clone());
        info!(id = %candidate.id, size = bytes.len(), "[POST][UPLOAD] Uploading image");

        match publisher.upload_media(MediaUpload { file_name, bytes }).await {
            Ok(uploaded) => {
                info!(id = %candidate.id, media_id = %uploaded.media_id, "[POST][UPLOAD] upload_media succeeded");
                media_ids.push(uploaded.media_id);
            }
            Err(e) => {
                error!(id = %candidate.id, error = %e, uploaded_before = ?media_ids, "[POST][ERROR][UPLOAD] upload_media failed");
                return Err(RunError::Upload {
                    id: candidate.id.clone(),
                    source: e,
                });
            }
        }
    }

    let post = NewPost {
        text: String::new(),
        media_ids: media_ids.clone(),
    };
    match publisher.create_post(post).await {
        Ok(created) => {
            info!(post_id = ?created.post_id, media_ids = ?media_ids, "[POST] create_post succeeded");
            Ok(Published {
                media_ids,
                post_id: created.post_id,
            })
        }
        Err(e) => {
            // Uploaded media stays on the remote side; leave enough to reconcile.
            error!(error = %e, media_ids = ?media_ids, "[POST][ERROR] create_post failed, local state left untouched");
            Err(RunError::Post {
                media_ids,
                source: e,
            })
        }
    }
}

/// Adds the batch to `posted`, moves the files into the archive and saves the record.
///
/// If the archive cannot be created or a move fails, the record is still
/// saved (with every batch id in it) before the error is returned: the post
/// is already public and its images must never be drawn again.
pub fn record_batch(
    layout: &Layout,
    posted: &mut PostedSet,
    candidates: &[Candidate],
) -> Result<Vec<String>, RunError> {
    for candidate in candidates {
        posted.insert(candidate.id.clone());
    }

    let archive = layout.posted_path();
    if let Err(e) = prepare_archive(layout) {
        save_after_failure(layout, posted);
        return Err(e);
    }

    let mut recorded = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let target = match candidate.path.file_name() {
            Some(name) => archive.join(name),
            None => archive.join(&candidate.id),
        };
        if let Err(source) = move_file(&candidate.path, &target) {
            error!(from = %candidate.path.display(), to = %target.display(), error = %source, "[POST][ERROR] Failed to archive posted image");
            save_after_failure(layout, posted);
            return Err(RunError::Move {
                from: candidate.path.clone(),
                to: target,
                source,
            });
        }
        debug!(id = %candidate.id, to = %target.display(), "Archived posted image");
        recorded.push(candidate.id.clone());
    }

    posted.save(&layout.state_path())?;
    Ok(recorded)
}

/// Runs the whole pipeline once.
pub async fn post_batch<P, R>(layout: &Layout, publisher: &P, rng: &mut R) -> Result<PostReport, RunError>
where
    P: Publisher + ?Sized,
    R: Rng + ?Sized,
{
    info!("[POST] Starting run");
    let Batch {
        mut posted,
        candidates,
    } = plan_batch(layout, rng)?;

    // Nothing goes out if the posted images would have nowhere to go.
    prepare_archive(layout)?;

    let published = publish_batch(&candidates, publisher).await?;
    let recorded = record_batch(layout, &mut posted, &candidates)?;

    info!(recorded = recorded.len(), total_posted = posted.len(), "[POST] Run complete");
    Ok(PostReport {
        post_id: published.post_id,
        media_ids: published.media_ids,
        recorded,
    })
}

/// Creates the archive directory if it is missing.
pub fn prepare_archive(layout: &Layout) -> Result<(), RunError> {
    let archive = layout.posted_path();
    fs::create_dir_all(&archive).map_err(|source| {
        error!(path = %archive.display(), error = %source, "[POST][ERROR] Failed to create archive directory");
        RunError::ArchiveDir {
            path: archive.clone(),
            source,
        }
    })
}

fn save_after_failure(layout: &Layout, posted: &PostedSet) {
    if let Err(e) = posted.save(&layout.state_path()) {
        warn!(error = %e, "[POST] Could not save posted set after failed archive step");
    }
}

#[cfg(unix)]
const CROSS_DEVICE: i32 = 18; // EXDEV
#[cfg(windows)]
const CROSS_DEVICE: i32 = 17; // ERROR_NOT_SAME_DEVICE

fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(CROSS_DEVICE)
}

/// `rename`, falling back to copy and delete only when source and target
/// are on different filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(error = %e, from = %from.display(), "rename crosses devices, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}
