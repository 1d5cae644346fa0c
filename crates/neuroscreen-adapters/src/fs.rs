//! Filesystem adapters: the upload store and input discovery for batch runs.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use neuroscreen_core::domain::{UploadName, ACCEPTED_EXTENSIONS};
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory where uploads and their face crops are persisted.
///
/// Each upload is stored under a fresh `<uuid>.<ext>` key, so the caller's
/// filename never reaches the filesystem and identical names never collide.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    /// Opens the upload directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create upload directory: {}", root.display()))?;
        Ok(Self { root })
    }

    /// Upload directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under a new unique key and returns the stored path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn store(&self, name: &UploadName, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self
            .root
            .join(format!("{}.{}", Uuid::new_v4(), name.extension()));

        create_new_with(&path, |file| {
            file.write_all(bytes)?;
            file.sync_all()
        })?;

        debug!(upload = %name, stored = %path.display(), size = bytes.len(), "Stored upload");
        Ok(path)
    }
}

/// Creates `path`, which must not exist yet, and fills it. A file that could
/// not be filled is removed again.
fn create_new_with(
    path: &Path,
    fill: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let result = fill(&mut file);
    if result.is_err() {
        drop(file);
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove partial upload {}: {e}", path.display());
        }
    }
    result
}

/// Finds analyzable images among files and directories given on the command
/// line.
pub struct FsImageSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsImageSource {
    /// Creates a new filesystem image source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all supported image files, in argument order, with directory
    /// entries sorted by name.
    #[must_use]
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_image(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        debug!("Found {} image files", files.len());
        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let mut entries: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(e) => e.flatten().map(|entry| entry.path()).collect(),
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };
        entries.sort();

        for path in entries {
            if path.is_file() && is_supported_image(&path) && !is_face_crop(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

/// Checks if a path has an accepted image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| ACCEPTED_EXTENSIONS.contains(&e.as_str()))
}

/// Face crops written by earlier runs are skipped when scanning directories.
fn is_face_crop(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with("_face"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.png")));
        assert!(!is_supported_image(Path::new("test.gif")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn test_failed_fill_removes_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("partial.png");

        let result = create_new_with(&path, |file| {
            file.write_all(b"half an image")?;
            Err(std::io::Error::other("disk full"))
        });

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_existing_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("taken.png");
        fs::write(&path, b"keep").unwrap_or_else(|e| panic!("{e}"));

        let result = create_new_with(&path, |_| Ok(()));

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap_or_default(), b"keep");
    }

    #[test]
    fn test_is_face_crop() {
        assert!(is_face_crop(Path::new("/u/abc_face.jpg")));
        assert!(!is_face_crop(Path::new("/u/abc.jpg")));
    }
}
