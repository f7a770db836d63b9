pub mod config;
pub mod error;
pub mod ssd;

pub use config::DetectorConfig;
pub use error::{DetectError, Result};
pub use ssd::{
    BoundingBox, Canvas, ClassLabels, Color, DetectionResult, Detections, Frame, Interpreter,
    LabelFilter, ObjectDetector, OrtInterpreter, PixelRect, RaqoteCanvas,
};
pub use ssd::{aggregate_detections, generate_colors, non_max_suppression, preprocess_frame};
