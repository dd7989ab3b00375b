use ndarray::{Array4, ArrayView4};
use serde::{Deserialize, Serialize};

/// Side length of the aligned face crop SFace consumes.
pub const SFACE_INPUT_SIZE: usize = 112;
/// Colour channels per pixel.
pub const SFACE_CHANNELS: usize = 3;
/// Length of every embedding SFace produces.
pub const SFACE_EMBEDDING_DIM: usize = 128;

/// Exact input shape accepted per call: one image, HWC.
pub const SFACE_INPUT_SHAPE: [usize; 4] = [1, SFACE_INPUT_SIZE, SFACE_INPUT_SIZE, SFACE_CHANNELS];

/// Face embedding: a flat vector compared downstream by distance metrics.
pub type Embedding = Vec<f32>;

/// Batched image tensor `(1, 112, 112, 3)` with values in `[0, 1]`.
pub type ImageTensor = Array4<f32>;

/// Borrowed form of [`ImageTensor`].
pub type ImageView<'a> = ArrayView4<'a, f32>;

/// Input/output shapes of a recognition backend.
///
/// `None` marks the unconstrained batch dimension. Purely descriptive: callers
/// use it to check compatibility without invoking the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub input_shape: [Option<usize>; 4],
    pub output_shape: [Option<usize>; 3],
}

impl ShapeDescriptor {
    /// Shapes of the SFace recognizer.
    pub const SFACE: ShapeDescriptor = ShapeDescriptor {
        input_shape: [
            None,
            Some(SFACE_INPUT_SIZE),
            Some(SFACE_INPUT_SIZE),
            Some(SFACE_CHANNELS),
        ],
        output_shape: [None, Some(1), Some(SFACE_EMBEDDING_DIM)],
    };

    /// Embedding length implied by the output shape.
    pub fn embedding_dim(&self) -> Option<usize> {
        self.output_shape[2]
    }
}
