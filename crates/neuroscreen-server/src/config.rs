//! Configuration file support for neuroscreen.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/neuroscreen/config.toml` (lowest priority)
//! - Project-local: `.neuroscreen.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use neuroscreen_adapters::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use neuroscreen_adapters::ModelOverrides;
use neuroscreen_core::DetectorConfig;
use serde::Deserialize;
use tracing::{debug, info};

/// Built-in defaults for values not set anywhere.
pub mod defaults {
    /// Listen address.
    pub const BIND: &str = "127.0.0.1:5000";
    /// Upload directory, relative to the working directory.
    pub const UPLOADS_DIR: &str = "static/uploads";
    /// Upload body limit in MiB.
    pub const MAX_UPLOAD_MB: u64 = 16;
    /// Environment variable holding the chat API key.
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP service settings.
    pub server: ServerConfig,
    /// Model file locations.
    pub models: ModelsConfig,
    /// Face detector tuning.
    pub face: FaceConfig,
    /// Chat relay settings.
    pub chat: ChatConfig,
    /// Output formatting for `analyze`.
    pub output: OutputConfig,
}

/// HTTP service configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:5000`.
    pub bind: Option<String>,
    /// Where uploads and face crops are written.
    pub uploads_dir: Option<PathBuf>,
    /// Upload body limit in MiB.
    pub max_upload_mb: Option<u64>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Autism classifier weights.
    pub autism: Option<PathBuf>,
    /// Emotion classifier weights.
    pub emotion: Option<PathBuf>,
    /// Haar cascade XML.
    pub face_cascade: Option<PathBuf>,
}

/// Face detector configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Pyramid scale step, must be > 1.
    pub scale_factor: Option<f64>,
    /// Neighbours a detection needs to be kept.
    pub min_neighbors: Option<u32>,
    /// Smallest face side in pixels.
    pub min_size: Option<u32>,
}

/// Chat relay configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Model name.
    pub model: Option<String>,
    /// API base URL.
    pub api_base: Option<String>,
    /// API key. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable to read the API key from.
    pub api_key_env: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/neuroscreen/config.toml`
    /// 2. Project-local: `.neuroscreen.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and replaced by their defaults.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for warning in config.sanitize() {
            eprintln!("warning: {warning}");
        }

        config
    }

    /// Clears values outside their accepted range so the built-in default
    /// applies, returning one warning per cleared key.
    fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut reject = |message: String| warnings.push(format!("{message}; using the default"));

        if let Some(bind) = self.server.bind.take_if(|b| b.parse::<SocketAddr>().is_err()) {
            reject(format!("server.bind must be host:port, got '{bind}'"));
        }
        if self.server.max_upload_mb.take_if(|mb| *mb == 0).is_some() {
            reject("server.max_upload_mb must be at least 1".to_string());
        }
        if let Some(s) = self.face.scale_factor.take_if(|s| !(s.is_finite() && *s > 1.0)) {
            reject(format!("face.scale_factor must be greater than 1, got {s}"));
        }
        if self.chat.timeout_secs.take_if(|t| *t == 0).is_some() {
            reject("chat.timeout_secs must be at least 1".to_string());
        }
        if let Some(f) = self.output.format.take_if(|f| f.as_str() != "json" && f.as_str() != "jsonl") {
            reject(format!("output.format must be 'json' or 'jsonl', got '{f}'"));
        }

        warnings
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Server
        self.server.bind = other.server.bind.or_else(|| self.server.bind.take());
        self.server.uploads_dir = other
            .server
            .uploads_dir
            .or_else(|| self.server.uploads_dir.take());
        self.server.max_upload_mb = other.server.max_upload_mb.or(self.server.max_upload_mb);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.autism = other.models.autism.or_else(|| self.models.autism.take());
        self.models.emotion = other.models.emotion.or_else(|| self.models.emotion.take());
        self.models.face_cascade = other
            .models
            .face_cascade
            .or_else(|| self.models.face_cascade.take());

        // Face
        self.face.scale_factor = other.face.scale_factor.or(self.face.scale_factor);
        self.face.min_neighbors = other.face.min_neighbors.or(self.face.min_neighbors);
        self.face.min_size = other.face.min_size.or(self.face.min_size);

        // Chat
        self.chat.model = other.chat.model.or_else(|| self.chat.model.take());
        self.chat.api_base = other.chat.api_base.or_else(|| self.chat.api_base.take());
        self.chat.api_key = other.chat.api_key.or_else(|| self.chat.api_key.take());
        self.chat.api_key_env = other
            .chat
            .api_key_env
            .or_else(|| self.chat.api_key_env.take());
        self.chat.timeout_secs = other.chat.timeout_secs.or(self.chat.timeout_secs);

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }

    /// Detector settings with defaults for anything unset.
    #[must_use]
    pub fn detector(&self) -> DetectorConfig {
        let defaults = DetectorConfig::default();
        DetectorConfig {
            scale_factor: self.face.scale_factor.unwrap_or(defaults.scale_factor),
            min_neighbors: self.face.min_neighbors.unwrap_or(defaults.min_neighbors),
            min_size: self.face.min_size.unwrap_or(defaults.min_size),
        }
    }

    /// Per-model path overrides.
    #[must_use]
    pub fn model_overrides(&self) -> ModelOverrides {
        ModelOverrides {
            autism: self.models.autism.clone(),
            emotion: self.models.emotion.clone(),
            face_cascade: self.models.face_cascade.clone(),
        }
    }

    /// Upload body limit in bytes.
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        let mb = self
            .server
            .max_upload_mb
            .unwrap_or(defaults::MAX_UPLOAD_MB);
        usize::try_from(mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }

    /// Chat model name.
    #[must_use]
    pub fn chat_model(&self) -> &str {
        self.chat.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Chat API base URL.
    #[must_use]
    pub fn chat_api_base(&self) -> &str {
        self.chat.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Chat request timeout.
    #[must_use]
    pub fn chat_timeout(&self) -> Option<Duration> {
        self.chat.timeout_secs.map(Duration::from_secs)
    }

    /// Resolves the chat API key from the process environment.
    #[must_use]
    pub fn chat_api_key(&self) -> Option<String> {
        self.chat_api_key_from(|name| std::env::var(name).ok())
    }

    /// Resolves the chat API key: an explicit `chat.api_key` wins, then the
    /// variable named by `chat.api_key_env`. Blank values count as unset.
    #[must_use]
    pub fn chat_api_key_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        let env_name = self
            .chat
            .api_key_env
            .as_deref()
            .unwrap_or(defaults::API_KEY_ENV);
        self.chat
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(env_name).filter(|k| !k.trim().is_empty()))
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("neuroscreen").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.neuroscreen.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".neuroscreen.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.server.bind.is_none());
        assert!(config.face.scale_factor.is_none());
        assert!(config.chat.api_key.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.output.format.is_none());
        assert!(config.clone().sanitize().is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[server]
bind = '0.0.0.0:8080'
uploads_dir = '/srv/uploads'
max_upload_mb = 4

[models]
dir = '/opt/models'
face_cascade = '/opt/cascades/frontal.xml'

[face]
scale_factor = 1.1
min_neighbors = 3
min_size = 40

[chat]
model = 'gemini-pro'
api_key_env = 'MY_KEY'
timeout_secs = 20

[output]
format = 'json'
pretty = true
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.server.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.server.uploads_dir, Some(PathBuf::from("/srv/uploads")));
        assert_eq!(config.max_upload_bytes(), 4 * 1024 * 1024);
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/models")));
        assert!(config.models.autism.is_none());
        assert_eq!(config.face.min_neighbors, Some(3));
        assert_eq!(config.chat_model(), "gemini-pro");
        assert_eq!(config.chat_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert!(config.clone().sanitize().is_empty());
    }

    #[test]
    fn test_detector_defaults_fill_gaps() {
        let config: AppConfig = toml::from_str("[face]\nmin_size = 24\n").unwrap();
        let detector = config.detector();
        assert!((detector.scale_factor - 1.3).abs() < f64::EPSILON);
        assert_eq!(detector.min_neighbors, 5);
        assert_eq!(detector.min_size, 24);
    }

    #[test]
    fn test_chat_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.chat_model(), DEFAULT_MODEL);
        assert_eq!(config.chat_api_base(), DEFAULT_API_BASE);
        assert!(config.chat_timeout().is_none());
        assert_eq!(config.max_upload_bytes(), 16 * 1024 * 1024);
    }

    #[test]
    fn test_model_overrides() {
        let config: AppConfig =
            toml::from_str("[models]\nemotion = '/tmp/emotion.safetensors'\n").unwrap();
        let overrides = config.model_overrides();
        assert_eq!(
            overrides.emotion,
            Some(PathBuf::from("/tmp/emotion.safetensors"))
        );
        assert!(overrides.autism.is_none());
    }

    // === API key resolution ===

    #[test]
    fn test_api_key_from_default_env_var() {
        let config = AppConfig::default();
        let key = config.chat_api_key_from(|name| {
            (name == defaults::API_KEY_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_api_key_from_named_env_var() {
        let config: AppConfig = toml::from_str("[chat]\napi_key_env = 'OTHER'\n").unwrap();
        let key = config.chat_api_key_from(|name| (name == "OTHER").then(|| "k".to_string()));
        assert_eq!(key.as_deref(), Some("k"));
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config: AppConfig = toml::from_str("[chat]\napi_key = 'explicit'\n").unwrap();
        let key = config.chat_api_key_from(|_| Some("from-env".to_string()));
        assert_eq!(key.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config: AppConfig = toml::from_str("[chat]\napi_key = '  '\n").unwrap();
        assert!(config.chat_api_key_from(|_| Some(String::new())).is_none());
    }

    // === Config Merge Priority Tests ===

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[server]
bind = '127.0.0.1:7000'

[face]
min_neighbors = 4
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[server]
bind = '127.0.0.1:9000'

[chat]
model = 'other'
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.server.bind.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(base.face.min_neighbors, Some(4));
        assert_eq!(base.chat.model.as_deref(), Some("other"));
    }

    #[test]
    fn test_merge_preserves_base_when_override_is_none() {
        let mut base: AppConfig = toml::from_str(
            r"
[models]
dir = '/a'
autism = '/a/autism.safetensors'

[output]
pretty = true
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str("[models]\ndir = '/b'\n").unwrap();
        base.merge(override_config);

        assert_eq!(base.models.dir, Some(PathBuf::from("/b")));
        assert_eq!(
            base.models.autism,
            Some(PathBuf::from("/a/autism.safetensors"))
        );
        assert_eq!(base.output.pretty, Some(true));
    }

    #[test]
    fn test_merge_empty_base_accepts_override() {
        let mut base = AppConfig::default();
        let override_config: AppConfig = toml::from_str("[face]\nscale_factor = 1.2\n").unwrap();
        base.merge(override_config);
        assert_eq!(base.face.scale_factor, Some(1.2));
    }

    // === Validation ===

    #[test]
    fn test_invalid_scale_factor_falls_back_to_default() {
        let mut config: AppConfig = toml::from_str("[face]\nscale_factor = 1.0\n").unwrap();
        let warnings = config.sanitize();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("face.scale_factor"));
        assert!((config.detector().scale_factor - 1.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_format_is_cleared() {
        let mut config: AppConfig = toml::from_str("[output]\nformat = 'xml'\n").unwrap();
        assert!(config.sanitize()[0].contains("output.format"));
        assert_eq!(config.output.format, None);
    }

    #[test]
    fn test_invalid_bind_is_cleared() {
        let mut config: AppConfig = toml::from_str("[server]\nbind = 'localhost'\n").unwrap();
        assert!(config.sanitize()[0].contains("server.bind"));
        assert_eq!(config.server.bind, None);
    }

    #[test]
    fn test_zero_limits_fall_back_to_defaults() {
        let mut config: AppConfig =
            toml::from_str("[server]\nmax_upload_mb = 0\n[chat]\ntimeout_secs = 0\n").unwrap();
        let warnings = config.sanitize();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("server.max_upload_mb"));
        assert!(warnings[1].contains("chat.timeout_secs"));
        assert_eq!(config.max_upload_bytes(), 16 * 1024 * 1024);
        assert_eq!(config.chat_timeout(), None);
    }

    #[test]
    fn test_valid_values_survive_sanitize() {
        let mut config: AppConfig =
            toml::from_str("[server]\nmax_upload_mb = 2\n[face]\nscale_factor = 1.1\n").unwrap();
        assert!(config.sanitize().is_empty());
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
        assert!((config.detector().scale_factor - 1.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result: Result<AppConfig, _> = toml::from_str("[face\nscale_factor = ");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_type_is_error() {
        let result: Result<AppConfig, _> = toml::from_str("[face]\nmin_neighbors = 'many'\n");
        assert!(result.is_err());
    }

    // === Project config discovery ===

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let config_path = dir.path().join(".neuroscreen.toml");
        std::fs::write(&config_path, "").unwrap();

        assert_eq!(find_config_in_parents(&nested), Some(config_path));
    }

    #[test]
    fn test_load_file_invalid_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(load_file(&path).is_none());
    }
}
