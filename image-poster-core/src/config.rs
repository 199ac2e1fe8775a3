use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Where the image pool, the posted archive and the posted-set record live.
///
/// The three locations are relative to `root` unless given as absolute paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub root: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    #[serde(default = "default_posted_dir")]
    pub posted_dir: PathBuf,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_posted_dir() -> PathBuf {
    PathBuf::from("posted")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("posted.json")
}

impl Layout {
    /// Standard layout (`images/`, `posted/`, `posted.json`) under `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images_dir: default_images_dir(),
            posted_dir: default_posted_dir(),
            state_file: default_state_file(),
        }
    }

    pub fn images_path(&self) -> PathBuf {
        self.root.join(&self.images_dir)
    }

    pub fn posted_path(&self) -> PathBuf {
        self.root.join(&self.posted_dir)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(&self.state_file)
    }

    /// Identifier of `path` as recorded in the posted set: the path relative
    /// to the root, `/`-separated. Paths outside the root keep their full form.
    pub fn relative_id(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| match c {
                Component::RootDir => Cow::Borrowed(""),
                other => other.as_os_str().to_string_lossy(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn trace_loaded(&self) {
        info!(
            root = %self.root.display(),
            images = %self.images_path().display(),
            posted = %self.posted_path().display(),
            state = %self.state_path().display(),
            "Loaded Layout"
        );
        debug!(?self, "Layout loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_id_is_slash_separated_under_root() {
        let layout = Layout::at("/srv/bot");
        let id = layout.relative_id(&layout.images_path().join("cat.png"));
        assert_eq!(id, "images/cat.png");
    }

    #[test]
    fn relative_id_keeps_paths_outside_root() {
        let layout = Layout::at("/srv/bot");
        let id = layout.relative_id(Path::new("/elsewhere/dog.jpg"));
        assert_eq!(id, "/elsewhere/dog.jpg");
    }

    #[test]
    fn partial_layout_uses_defaults() {
        let layout: Layout = serde_json::from_str(r#"{"root": "/data"}"#).unwrap();
        assert_eq!(layout, Layout::at("/data"));
    }
}
