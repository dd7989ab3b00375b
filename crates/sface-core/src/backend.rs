//! Facial recognition backends and dispatch between them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::config::SFaceConfig;
use crate::engine::{InferenceError, InitializationError};
use crate::fetch::Fetcher;
use crate::sface::SFace;
use crate::types::{Embedding, ImageView, ShapeDescriptor};
use crate::weights::ProvisioningError;

/// Errors raised while building a backend. A failed backend is unusable and
/// must be built again from scratch.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    #[error(transparent)]
    Initialization(#[from] InitializationError),
}

/// A model that turns one aligned face into an embedding.
pub trait FacialRecognition {
    /// Human-readable model name.
    fn model_name(&self) -> &'static str;

    /// Input/output shapes accepted and produced by [`find_embeddings`](Self::find_embeddings).
    fn shape(&self) -> ShapeDescriptor;

    /// Embed a single `(1, H, W, C)` image with values in `[0, 1]`.
    fn find_embeddings(&mut self, image: ImageView<'_>) -> Result<Embedding, InferenceError>;
}

/// Known backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelName {
    SFace,
}

impl ModelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::SFace => SFace::MODEL_NAME,
        }
    }

    /// Cache the weights of this model without building it; returns their path.
    pub fn provision(
        &self,
        config: &SFaceConfig,
        fetcher: &dyn Fetcher,
    ) -> Result<PathBuf, ProvisioningError> {
        match self {
            ModelName::SFace => SFace::provision(config, fetcher),
        }
    }

    /// Shapes of this model, available without building it.
    pub fn shape(&self) -> ShapeDescriptor {
        match self {
            ModelName::SFace => ShapeDescriptor::SFACE,
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unknown recognition model: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelName {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(SFace::MODEL_NAME) {
            Ok(ModelName::SFace)
        } else {
            Err(UnknownModel(s.to_string()))
        }
    }
}

/// A constructed backend of any supported variant.
pub enum Backend {
    SFace(SFace),
}

impl Backend {
    /// Provision weights and build the backend named by `model`.
    pub fn build(
        model: ModelName,
        config: &SFaceConfig,
        fetcher: &dyn Fetcher,
    ) -> Result<Self, BackendError> {
        match model {
            ModelName::SFace => Ok(Backend::SFace(SFace::load(config, fetcher)?)),
        }
    }
}

impl FacialRecognition for Backend {
    fn model_name(&self) -> &'static str {
        match self {
            Backend::SFace(m) => m.model_name(),
        }
    }

    fn shape(&self) -> ShapeDescriptor {
        match self {
            Backend::SFace(m) => m.shape(),
        }
    }

    fn find_embeddings(&mut self, image: ImageView<'_>) -> Result<Embedding, InferenceError> {
        match self {
            Backend::SFace(m) => m.find_embeddings(image),
        }
    }
}
