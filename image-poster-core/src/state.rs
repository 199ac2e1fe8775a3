//! Persistent record of which images were already posted.
//!
//! The record is a JSON array of relative paths, sorted and pretty-printed
//! with two-space indentation. Non-ASCII file names are written literally.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to serialise posted set: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("failed to write posted set to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Set of image identifiers that have been published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedSet {
    ids: BTreeSet<String>,
}

impl PostedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the record at `path`.
    ///
    /// A missing, unreadable or malformed record deliberately yields an empty
    /// set: a broken record must not stop the bot from posting.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(state = %path.display(), "No posted-set record yet, starting empty");
            return Self::new();
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = ?e, state = %path.display(), "Posted-set record unreadable, treating as empty");
                return Self::new();
            }
        };
        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(ids) => {
                let set = Self {
                    ids: ids.into_iter().collect(),
                };
                debug!(count = set.len(), state = %path.display(), "Loaded posted-set record");
                set
            }
            Err(e) => {
                warn!(error = %e, state = %path.display(), "Posted-set record is not a JSON string array, treating as empty");
                Self::new()
            }
        }
    }

    /// Writes the record to `path`, replacing any previous one.
    ///
    /// The JSON goes to a temporary file next to `path` first and is then
    /// renamed into place.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let ordered: Vec<&String> = self.ids.iter().collect();
        let json = serde_json::to_string_pretty(&ordered)?;

        let write_err = |source| StateError::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        info!(count = self.len(), state = %path.display(), "Saved posted-set record");
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Adds `id`, returning `false` if it was already recorded.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PostedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_record_loads_empty() {
        let dir = tempdir().unwrap();
        let set = PostedSet::load(&dir.path().join("posted.json"));
        assert!(set.is_empty());
    }

    #[test]
    fn corrupt_record_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("posted.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(PostedSet::load(&path).is_empty());

        fs::write(&path, r#"{"images/a.png": true}"#).unwrap();
        assert!(PostedSet::load(&path).is_empty(), "object is not a string array");

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(PostedSet::load(&path).is_empty(), "numbers are not identifiers");
    }

    #[test]
    fn save_then_load_returns_same_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("posted.json");
        let set: PostedSet = ["images/b.jpg", "images/a.png", "images/猫.webp"]
            .into_iter()
            .collect();

        set.save(&path).unwrap();

        assert_eq!(PostedSet::load(&path), set);
    }

    #[test]
    fn saved_record_is_sorted_pretty_and_keeps_non_ascii() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("posted.json");
        let set: PostedSet = ["images/z.png", "images/猫.png", "images/a.png"]
            .into_iter()
            .collect();

        set.save(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "[\n  \"images/a.png\",\n  \"images/z.png\",\n  \"images/猫.png\"\n]"
        );
    }

    #[test]
    fn save_overwrites_previous_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("posted.json");
        let mut set: PostedSet = ["images/a.png"].into_iter().collect();
        set.save(&path).unwrap();

        assert!(set.insert("images/b.png"));
        assert!(!set.insert("images/a.png"));
        set.save(&path).unwrap();

        let loaded = PostedSet::load(&path);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.iter().collect::<Vec<_>>(), vec!["images/a.png", "images/b.png"]);
    }

    #[test]
    fn empty_set_saves_as_empty_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("posted.json");
        PostedSet::new().save(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
