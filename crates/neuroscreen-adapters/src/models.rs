//! Model file registry.
//!
//! NeuroScreen ships no weights: the two classifiers are trained separately
//! and exported to safetensors, and the face cascade is the stock OpenCV
//! frontal-face XML. This module knows where those files are expected and
//! checks they exist before the server starts.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use neuroscreen_core::ModelFiles;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
    /// What the file is.
    pub description: &'static str,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "autism",
        filename: "autism_model.safetensors",
        description: "VGG16 binary autism screening classifier",
    },
    ModelInfo {
        name: "emotion",
        filename: "emotion_model.safetensors",
        description: "7-class facial emotion CNN",
    },
    ModelInfo {
        name: "face_cascade",
        filename: "haarcascade_frontalface_default.xml",
        description: "OpenCV Haar cascade for frontal faces",
    },
];

/// Returns the default models directory path.
///
/// Uses `XDG_DATA_HOME/neuroscreen/models` or
/// `~/.local/share/neuroscreen/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("neuroscreen")
        .join("models")
}

/// Returns the default path of a known model inside `dir`.
#[must_use]
pub fn model_path(dir: &Path, name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| dir.join(m.filename))
}

/// Per-model path overrides from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOverrides {
    /// Autism weights.
    pub autism: Option<PathBuf>,
    /// Emotion weights.
    pub emotion: Option<PathBuf>,
    /// Face cascade.
    pub face_cascade: Option<PathBuf>,
}

/// Resolves every model file: explicit overrides win, otherwise the
/// registry filename inside `dir`.
#[must_use]
pub fn resolve(dir: &Path, overrides: &ModelOverrides) -> ModelFiles {
    let pick = |explicit: &Option<PathBuf>, filename: &str| {
        explicit.clone().unwrap_or_else(|| dir.join(filename))
    };
    ModelFiles {
        autism: pick(&overrides.autism, MODELS[0].filename),
        emotion: pick(&overrides.emotion, MODELS[1].filename),
        face_cascade: pick(&overrides.face_cascade, MODELS[2].filename),
    }
}

/// Fails with every missing file listed if any model file does not exist.
///
/// # Errors
///
/// Returns an error naming the missing paths.
pub fn verify(files: &ModelFiles) -> Result<()> {
    let missing: Vec<String> = [&files.autism, &files.emotion, &files.face_cascade]
        .into_iter()
        .filter(|p| !p.is_file())
        .map(|p| p.display().to_string())
        .collect();

    if !missing.is_empty() {
        bail!("Missing model files: {}", missing.join(", "));
    }
    debug!("All model files present");
    Ok(())
}

/// Installation status of one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    /// Registry name.
    pub name: &'static str,
    /// Resolved path.
    pub path: PathBuf,
    /// SHA-256 of the file, if it exists.
    pub sha256: Option<String>,
}

/// Lists every model with its resolved path and checksum.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read.
pub fn list_models(files: &ModelFiles) -> Result<Vec<ModelStatus>> {
    let paths = [&files.autism, &files.emotion, &files.face_cascade];
    MODELS
        .iter()
        .zip(paths)
        .map(|(info, path)| {
            let sha256 = if path.is_file() {
                Some(sha256_file(path)?)
            } else {
                None
            };
            Ok(ModelStatus {
                name: info.name,
                path: path.clone(),
                sha256,
            })
        })
        .collect()
}

/// Hex SHA-256 of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_dir() {
        let dir = models_dir();
        assert!(dir.ends_with("neuroscreen/models"));
    }

    #[test]
    fn test_model_path() {
        let path = model_path(Path::new("/m"), "emotion");
        assert_eq!(path, Some(PathBuf::from("/m/emotion_model.safetensors")));
    }

    #[test]
    fn test_model_path_unknown() {
        assert!(model_path(Path::new("/m"), "unknown").is_none());
    }

    #[test]
    fn test_resolve_prefers_overrides() {
        let overrides = ModelOverrides {
            face_cascade: Some(PathBuf::from("/opt/cascade.xml")),
            ..ModelOverrides::default()
        };
        let files = resolve(Path::new("/m"), &overrides);
        assert_eq!(files.autism, PathBuf::from("/m/autism_model.safetensors"));
        assert_eq!(files.face_cascade, PathBuf::from("/opt/cascade.xml"));
    }

    #[test]
    fn test_sha256_known_value() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("f");
        fs::write(&path, b"abc").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            sha256_file(&path).unwrap_or_default(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
