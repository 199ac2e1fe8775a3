//! Lists the images in the source pool that have not been posted yet.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Layout;
use crate::state::PostedSet;

/// Extensions accepted as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source directory {} does not exist", .0.display())]
    MissingSourceDir(PathBuf),

    #[error("failed to list {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An unposted image in the source pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Path relative to the layout root, as stored in the posted set.
    pub id: String,
}

/// Counts reported by the `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inventory {
    pub posted: usize,
    pub unposted: usize,
}

pub fn is_image(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Direct image files of the source directory whose identifier is not in
/// `posted`. Subdirectories are not descended into. Order is unspecified.
pub fn list_unposted(layout: &Layout, posted: &PostedSet) -> Result<Vec<Candidate>, ScanError> {
    let images = layout.images_path();
    if !images.exists() {
        return Err(ScanError::MissingSourceDir(images));
    }

    let read_err = |source| ScanError::ReadDir {
        path: images.clone(),
        source,
    };
    let mut candidates = Vec::new();
    let mut skipped_posted = 0usize;
    for entry in fs::read_dir(&images).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() || !is_image(&path) {
            continue;
        }
        let id = layout.relative_id(&path);
        if posted.contains(&id) {
            skipped_posted += 1;
            continue;
        }
        debug!(id = %id, "Found unposted image");
        candidates.push(Candidate { path, id });
    }

    info!(
        source = %images.display(),
        unposted = candidates.len(),
        skipped_posted,
        "Scanned source directory"
    );
    Ok(candidates)
}

/// Loads the posted set and scans the pool, returning both counts.
pub fn inventory(layout: &Layout) -> Result<Inventory, ScanError> {
    let posted = PostedSet::load(&layout.state_path());
    let unposted = list_unposted(layout, &posted)?.len();
    Ok(Inventory {
        posted: posted.len(),
        unposted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn image_extensions_match_case_insensitively() {
        assert!(is_image(Path::new("a.png")));
        assert!(is_image(Path::new("a.JPG")));
        assert!(is_image(Path::new("a.JpEg")));
        assert!(is_image(Path::new("a.webp")));
        assert!(!is_image(Path::new("a.gif")));
        assert!(!is_image(Path::new("a.png.txt")));
        assert!(!is_image(Path::new("png")));
    }
}
