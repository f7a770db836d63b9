//! SSD模块 - 基于单阶段检测模型的目标检测
//!
//! 该模块提供了一整套目标检测功能，包括：
//! - 模型加载
//! - 图像预处理
//! - 模型推理
//! - 结果过滤与标签汇总
//! - 可视化绘制
//!
//! # 工作流程
//!
//! 1. 使用`ObjectDetector::new`加载ONNX模型
//! 2. 将BGR帧包装为`Frame`
//! 3. 调用`detect_frame`得到 标签 => 置信度 映射
//! 4. 需要时传入`draw = true`，在原帧上绘制检测框
//!
//! # 示例
//!
//! ```no_run
//! use objdetect::{DetectorConfig, Frame, ObjectDetector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DetectorConfig::new("models/ssd_mobilenet.onnx").with_min_score(0.5);
//! let mut detector = ObjectDetector::from_config(&config)?;
//! let mut frame = Frame::from_rgb_image(&image::open("frame.jpg")?.to_rgb8());
//! let detections = detector.detect(&frame)?;
//! # let _ = detector.detect_frame(&mut frame, true)?;
//! # let _ = detections;
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod detect;
pub mod draw;
pub mod frame;
pub mod glyphs;
pub mod infer;
pub mod labels;
pub mod model;
pub mod palette;
pub mod posts;
pub mod prevs;

// 重新导出常用类型和函数
pub use bounds::{BoundingBox, Detections, PixelRect};
pub use detect::ObjectDetector;
pub use draw::{Canvas, RaqoteCanvas, annotate_frame, draw_boxes};
pub use frame::Frame;
pub use infer::{Interpreter, run_inference};
pub use labels::{ClassLabels, LabelFilter};
pub use model::{OrtInterpreter, load_model};
pub use palette::{Color, generate_colors};
pub use posts::{DetectionResult, aggregate_detections, non_max_suppression};
pub use prevs::{preprocess_frame, resize_image};
