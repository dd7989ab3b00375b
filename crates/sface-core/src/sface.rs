//! SFace backend: provisions weights, builds the engine, adapts tensors.

use std::path::PathBuf;

use ndarray::Axis;
use tracing::Span;

use crate::backend::{BackendError, FacialRecognition};
use crate::config::SFaceConfig;
use crate::engine::{EmbeddingEngine, InferenceError, NativeLoader};
use crate::fetch::Fetcher;
use crate::onnx::OnnxLoader;
use crate::types::{Embedding, ImageView, ShapeDescriptor, SFACE_EMBEDDING_DIM};
use crate::weights::{ProvisioningError, WeightsCache};

/// SFace embedding backend.
///
/// Owns its engine exclusively. `find_embeddings` takes `&mut self`; share an
/// instance across threads only behind a lock.
pub struct SFace {
    engine: EmbeddingEngine,
    span: Span,
}

impl SFace {
    pub const MODEL_NAME: &'static str = "SFace";

    /// Make sure the SFace weights are cached and return their path.
    pub fn provision(
        config: &SFaceConfig,
        fetcher: &dyn Fetcher,
    ) -> Result<PathBuf, ProvisioningError> {
        let weights_path = config.weights_path();
        WeightsCache::new(fetcher).ensure(&weights_path, &config.weights_url)?;
        Ok(weights_path)
    }

    /// Provision weights with `fetcher` and build the ONNX engine.
    pub fn load(config: &SFaceConfig, fetcher: &dyn Fetcher) -> Result<Self, BackendError> {
        let span = tracing::info_span!("sface", weights = %config.weights_path().display());
        Self::load_with(config, fetcher, &OnnxLoader, span)
    }

    /// Like [`load`](Self::load) with an explicit native loader and log span.
    ///
    /// Every event from provisioning, construction and inference is recorded
    /// inside `span`.
    pub fn load_with(
        config: &SFaceConfig,
        fetcher: &dyn Fetcher,
        loader: &dyn NativeLoader,
        span: Span,
    ) -> Result<Self, BackendError> {
        let engine = span.in_scope(|| -> Result<_, BackendError> {
            let weights_path = Self::provision(config, fetcher)?;
            Ok(EmbeddingEngine::create_with(&weights_path, loader)?)
        })?;

        Ok(Self { engine, span })
    }
}

impl FacialRecognition for SFace {
    fn model_name(&self) -> &'static str {
        Self::MODEL_NAME
    }

    fn shape(&self) -> ShapeDescriptor {
        ShapeDescriptor::SFACE
    }

    fn find_embeddings(&mut self, image: ImageView<'_>) -> Result<Embedding, InferenceError> {
        let _entered = self.span.enter();

        let raw = self.engine.infer(image)?;
        if raw.shape() != &[1, SFACE_EMBEDDING_DIM][..] {
            return Err(InferenceError::UnexpectedOutput {
                expected: [1, SFACE_EMBEDDING_DIM],
                actual: raw.shape().to_vec(),
            });
        }

        let embedding: Embedding = raw.index_axis(Axis(0), 0).iter().copied().collect();
        tracing::trace!(dim = embedding.len(), "embedding extracted");
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::FixedLoader;
    use crate::engine::{InitializationError, NativeRecognizer, INSTALL_HINT};
    use crate::weights::tests::StubFetcher;
    use ndarray::{Array4, ArrayD, ArrayView3, IxDyn};
    use std::path::Path;

    fn zero_image() -> Array4<f32> {
        Array4::zeros((1, 112, 112, 3))
    }

    #[test]
    fn test_end_to_end_with_absent_weights() {
        let dir = tempfile::tempdir().unwrap();
        let config = SFaceConfig::new(dir.path()).with_weights_url("https://mirror.invalid/sface.onnx");
        let fetcher = StubFetcher::ok();
        let loader = FixedLoader::new(0.125);

        let mut model = SFace::load_with(&config, &fetcher, &loader, Span::none()).unwrap();

        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(
            fetcher.calls.borrow()[0],
            ("https://mirror.invalid/sface.onnx".to_string(), config.weights_path())
        );
        assert!(config.weights_path().is_file());

        let embedding = model.find_embeddings(zero_image().view()).unwrap();
        assert_eq!(embedding.len(), 128);
        assert_eq!(embedding, vec![0.125; 128]);
    }

    #[test]
    fn test_end_to_end_with_cached_weights() {
        let dir = tempfile::tempdir().unwrap();
        let config = SFaceConfig::new(dir.path());
        std::fs::create_dir_all(config.weights_path().parent().unwrap()).unwrap();
        std::fs::write(config.weights_path(), b"onnx").unwrap();
        let fetcher = StubFetcher::ok();

        SFace::load_with(&config, &fetcher, &FixedLoader::new(0.0), Span::none()).unwrap();

        assert_eq!(fetcher.call_count(), 0);
    }

    #[test]
    fn test_find_embeddings_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let config = SFaceConfig::new(dir.path());
        let fetcher = StubFetcher::ok();
        let mut model =
            SFace::load_with(&config, &fetcher, &FixedLoader::new(0.3), Span::none()).unwrap();

        let mut img = zero_image();
        img[[0, 10, 20, 1]] = 0.7;
        let a = model.find_embeddings(img.view()).unwrap();
        let b = model.find_embeddings(img.view()).unwrap();

        let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_output_length_for_valid_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = SFaceConfig::new(dir.path());
        let fetcher = StubFetcher::ok();
        let mut model =
            SFace::load_with(&config, &fetcher, &FixedLoader::new(1.0), Span::none()).unwrap();

        for fill in [0.0f32, 0.25, 0.5, 1.0] {
            let img = Array4::from_elem((1, 112, 112, 3), fill);
            assert_eq!(model.find_embeddings(img.view()).unwrap().len(), 128);
        }
    }

    #[test]
    fn test_batch_of_two_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = SFaceConfig::new(dir.path());
        let fetcher = StubFetcher::ok();
        let loader = FixedLoader::new(0.0);
        let mut model = SFace::load_with(&config, &fetcher, &loader, Span::none()).unwrap();

        let img = Array4::<f32>::zeros((2, 112, 112, 3));
        let err = model.find_embeddings(img.view()).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidShape { .. }), "got {err:?}");
        assert_eq!(loader.calls(), 0);
    }

    struct WideRecognizer;

    impl NativeRecognizer for WideRecognizer {
        fn feature(&mut self, _: ArrayView3<u8>) -> Result<ArrayD<f32>, InferenceError> {
            Ok(ArrayD::zeros(IxDyn(&[1, 512])))
        }
    }

    struct WideLoader;

    impl NativeLoader for WideLoader {
        fn load(&self, _: &Path) -> Result<Box<dyn NativeRecognizer>, InitializationError> {
            Ok(Box::new(WideRecognizer))
        }
    }

    #[test]
    fn test_unexpected_output_shape_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = SFaceConfig::new(dir.path());
        let mut model =
            SFace::load_with(&config, &StubFetcher::ok(), &WideLoader, Span::none()).unwrap();

        let err = model.find_embeddings(zero_image().view()).unwrap_err();
        match err {
            InferenceError::UnexpectedOutput { expected, actual } => {
                assert_eq!(expected, [1, 128]);
                assert_eq!(actual, vec![1, 512]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    struct NoRuntime;

    impl NativeLoader for NoRuntime {
        fn load(&self, _: &Path) -> Result<Box<dyn NativeRecognizer>, InitializationError> {
            Err(InitializationError::NativeUnavailable {
                reason: "shared library missing".to_string(),
                source: None,
            })
        }
    }

    #[test]
    fn test_missing_runtime_fails_construction_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let config = SFaceConfig::new(dir.path());

        let err = SFace::load_with(&config, &StubFetcher::ok(), &NoRuntime, Span::none())
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Initialization(_)));
        assert!(err.to_string().contains(INSTALL_HINT), "message: {err}");
    }
}
