use std::path::{Path, PathBuf};

/// Default location of the versioned SFace weights artifact.
pub const DEFAULT_WEIGHTS_URL: &str = "https://github.com/opencv/opencv_zoo/raw/main/models/face_recognition_sface/face_recognition_sface_2021dec.onnx";

/// File name the weights are cached under.
pub const WEIGHTS_FILE_NAME: &str = "face_recognition_sface_2021dec.onnx";

const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct SFaceConfig {
    /// Root under which `.deepface/weights/` lives.
    pub cache_root: PathBuf,
    /// Remote source of the weights file.
    pub weights_url: String,
    /// Timeout for the HTTP fetcher, in seconds.
    pub download_timeout_secs: u64,
}

impl SFaceConfig {
    /// Configuration rooted at an explicit cache root, with default URL and timeout.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            weights_url: DEFAULT_WEIGHTS_URL.to_string(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }

    /// Load configuration from `DEEPFACE_HOME` and `SFACE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let cache_root = std::env::var("DEEPFACE_HOME")
            .or_else(|_| std::env::var("HOME"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"));

        Self {
            cache_root,
            weights_url: std::env::var("SFACE_WEIGHTS_URL")
                .unwrap_or_else(|_| DEFAULT_WEIGHTS_URL.to_string()),
            download_timeout_secs: env_u64(
                "SFACE_DOWNLOAD_TIMEOUT_SECS",
                DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            ),
        }
    }

    /// Override the weights URL.
    pub fn with_weights_url(mut self, url: impl Into<String>) -> Self {
        self.weights_url = url.into();
        self
    }

    /// Canonical cache path: `<cache-root>/.deepface/weights/<file>`.
    pub fn weights_path(&self) -> PathBuf {
        weights_dir(&self.cache_root).join(WEIGHTS_FILE_NAME)
    }
}

fn weights_dir(cache_root: &Path) -> PathBuf {
    cache_root.join(".deepface").join("weights")
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
