//! SFace recognizer via ONNX Runtime.
//!
//! Reproduces the blob layout of the reference SFace recognizer: aligned
//! BGR bytes are swapped to RGB and fed as raw 0..255 values in NCHW order,
//! with no mean subtraction or scaling.

use std::path::Path;

use crate::engine::{InitializationError, NativeLoader, NativeRecognizer};

/// Default native loader: ONNX Runtime when the `onnx` feature is enabled.
pub struct OnnxLoader;

#[cfg(feature = "onnx")]
mod runtime {
    use super::*;
    use crate::engine::InferenceError;
    use ndarray::{Array4, ArrayD, ArrayView3, IxDyn};
    use ort::session::Session;
    use ort::value::TensorRef;

    /// SFace session on the default (CPU) execution provider.
    pub struct OnnxRecognizer {
        session: Session,
    }

    impl NativeLoader for OnnxLoader {
        fn load(
            &self,
            weights_path: &Path,
        ) -> Result<Box<dyn NativeRecognizer>, InitializationError> {
            let builder =
                Session::builder().map_err(|e| InitializationError::NativeUnavailable {
                    reason: "ONNX Runtime environment could not be created".to_string(),
                    source: Some(Box::new(e)),
                })?;

            let session = builder.commit_from_file(weights_path).map_err(|e| {
                InitializationError::Construction {
                    path: weights_path.to_path_buf(),
                    source: Box::new(e),
                }
            })?;

            tracing::info!(
                path = %weights_path.display(),
                inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
                outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
                "loaded SFace model"
            );

            Ok(Box::new(OnnxRecognizer { session }))
        }
    }

    impl NativeRecognizer for OnnxRecognizer {
        fn feature(&mut self, face: ArrayView3<u8>) -> Result<ArrayD<f32>, InferenceError> {
            let blob = to_blob(face);

            let outputs = self
                .session
                .run(ort::inputs![TensorRef::from_array_view(blob.view())?])?;

            let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();

            ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())
                .map_err(|e| InferenceError::Native(Box::new(e)))
        }
    }

    /// HWC BGR bytes → NCHW RGB floats, values left in 0..255.
    pub(super) fn to_blob(face: ArrayView3<u8>) -> Array4<f32> {
        let (height, width, _) = face.dim();
        Array4::from_shape_fn((1, 3, height, width), |(_, c, y, x)| {
            face[[y, x, 2 - c]] as f32
        })
    }
}

#[cfg(not(feature = "onnx"))]
impl NativeLoader for OnnxLoader {
    fn load(&self, _weights_path: &Path) -> Result<Box<dyn NativeRecognizer>, InitializationError> {
        Err(InitializationError::NativeUnavailable {
            reason: "sface-core was built without the `onnx` feature".to_string(),
            source: None,
        })
    }
}
