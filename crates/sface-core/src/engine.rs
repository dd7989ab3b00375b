//! Native recognition engine: construction and single-image inference.

use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayD, ArrayView3, Axis};
use thiserror::Error;

use crate::types::{ImageView, SFACE_INPUT_SHAPE};
use crate::BoxError;

/// Remediation appended whenever the native runtime is missing.
pub const INSTALL_HINT: &str = "ONNX Runtime is an optional dependency; install it and rebuild with `--features onnx`";

#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("weights file not found: {0} — provision it before building the engine")]
    WeightsMissing(PathBuf),
    #[error("native recognition engine unavailable ({reason}). {hint}", hint = INSTALL_HINT)]
    NativeUnavailable {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("failed to construct recognition engine from {path}")]
    Construction {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("expected input of shape {expected:?}, got {actual:?} — only single-image batches are supported")]
    InvalidShape {
        expected: [usize; 4],
        actual: Vec<usize>,
    },
    #[error("expected raw output of shape {expected:?}, got {actual:?}")]
    UnexpectedOutput {
        expected: [usize; 2],
        actual: Vec<usize>,
    },
    #[cfg(feature = "onnx")]
    #[error(transparent)]
    Ort(#[from] ort::Error),
    #[error(transparent)]
    Native(BoxError),
}

/// Feature extraction on one aligned face.
///
/// `face` is `(112, 112, 3)` raw pixel bytes. The returned array is passed to
/// the caller untouched; SFace produces `(1, 128)`.
pub trait NativeRecognizer: Send {
    fn feature(&mut self, face: ArrayView3<u8>) -> Result<ArrayD<f32>, InferenceError>;
}

/// Builds a [`NativeRecognizer`] from a weights file using default settings.
pub trait NativeLoader {
    fn load(&self, weights_path: &Path) -> Result<Box<dyn NativeRecognizer>, InitializationError>;
}

/// Recognition engine bound to a single weights file.
pub struct EmbeddingEngine {
    native: Box<dyn NativeRecognizer>,
    weights_path: PathBuf,
}

impl EmbeddingEngine {
    /// Build the engine with the default native loader.
    pub fn create(weights_path: &Path) -> Result<Self, InitializationError> {
        Self::create_with(weights_path, &crate::onnx::OnnxLoader)
    }

    /// Build the engine with an explicit native loader.
    pub fn create_with(
        weights_path: &Path,
        loader: &dyn NativeLoader,
    ) -> Result<Self, InitializationError> {
        if !weights_path.is_file() {
            return Err(InitializationError::WeightsMissing(weights_path.to_path_buf()));
        }

        let native = loader.load(weights_path)?;
        tracing::info!(path = %weights_path.display(), "recognition engine constructed");

        Ok(Self {
            native,
            weights_path: weights_path.to_path_buf(),
        })
    }

    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    /// Run the native engine on a `(1, 112, 112, 3)` image in `[0, 1]`.
    ///
    /// The image is converted back to `u8` pixels first; the native output is
    /// returned as-is.
    pub fn infer(&mut self, image: ImageView<'_>) -> Result<ArrayD<f32>, InferenceError> {
        if image.shape() != &SFACE_INPUT_SHAPE[..] {
            return Err(InferenceError::InvalidShape {
                expected: SFACE_INPUT_SHAPE,
                actual: image.shape().to_vec(),
            });
        }

        let face = denormalize(image.index_axis(Axis(0), 0));
        self.native.feature(face.view())
    }
}

/// Map `[0, 1]` floats to `[0, 255]` bytes.
///
/// Values are rounded, not truncated, so `k / 255.0` maps back to `k`; a
/// plain `as u8` truncation would turn many of them into `k - 1`. Results can
/// therefore differ by one level from reference pipelines that truncate.
/// Values are clamped first, so upstream noise slightly outside the range
/// saturates instead of wrapping. NaN becomes 0.
pub fn denormalize(face: ArrayView3<f32>) -> Array3<u8> {
    face.mapv(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
}
