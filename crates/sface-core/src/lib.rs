//! sface-core — SFace face embedding backend.
//!
//! Fetches and caches the SFace weights, builds an ONNX Runtime recognizer
//! from them and turns aligned face crops into 128-dimensional embeddings.

pub mod backend;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod onnx;
pub mod sface;
pub mod types;
pub mod weights;

/// Boxed error used where the concrete native or transport error type varies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub use backend::{Backend, BackendError, FacialRecognition, ModelName};
pub use config::SFaceConfig;
pub use engine::{EmbeddingEngine, InferenceError, InitializationError};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use sface::SFace;
pub use types::{Embedding, ImageTensor, ShapeDescriptor};
pub use weights::{ProvisioningError, WeightsCache};
