use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::ssd::bounds::Detections;
use crate::ssd::draw::{Canvas, annotate_frame, draw_boxes};
use crate::ssd::frame::Frame;
use crate::ssd::infer::{Interpreter, run_inference};
use crate::ssd::labels::{ClassLabels, LabelFilter};
use crate::ssd::model::OrtInterpreter;
use crate::ssd::palette::{Color, generate_colors};
use crate::ssd::posts::{DetectionResult, aggregate_detections, non_max_suppression};
use crate::ssd::prevs::preprocess_frame;

/// SSD目标检测器
///
/// 封装了完整的检测流程，包括图像预处理、模型推理、结果过滤、标签汇总与可选的绘制。
/// 标签表与颜色表在构建时生成，之后只读。
///
/// # 示例
///
/// ```no_run
/// use objdetect::{Frame, ObjectDetector};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut detector = ObjectDetector::new("models/ssd_mobilenet.onnx", Some(vec!["car".into()]), None)?;
/// let image = image::open("street.jpg")?.to_rgb8();
/// let mut frame = Frame::from_rgb_image(&image);
/// let detections = detector.detect_frame(&mut frame, true)?;
/// println!("{detections:?}");
/// # Ok(())
/// # }
/// ```
pub struct ObjectDetector<I: Interpreter = OrtInterpreter> {
    interpreter: I,
    config: DetectorConfig,
    labels: ClassLabels,
    colors: Vec<Color>,
    filter: LabelFilter,
}

impl ObjectDetector<OrtInterpreter> {
    /// 按模型路径、可选白名单与可选最低分数创建检测器
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        valid_labels: Option<Vec<String>>,
        min_score: Option<f32>,
    ) -> Result<Self> {
        let mut config = DetectorConfig::new(model_path.as_ref());
        if let Some(labels) = valid_labels {
            config = config.with_valid_labels(labels);
        }
        if let Some(min_score) = min_score {
            config = config.with_min_score(min_score);
        }
        Self::from_config(&config)
    }

    /// 按配置加载模型并创建检测器
    ///
    /// 配置无效或模型无法加载时返回`Configuration`错误。
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        let interpreter = OrtInterpreter::load(&config.model_path)?;
        Self::with_interpreter(interpreter, config)
    }
}

impl<I: Interpreter> ObjectDetector<I> {
    /// 使用已加载的解释器创建检测器
    pub fn with_interpreter(interpreter: I, config: &DetectorConfig) -> Result<Self> {
        Self::with_labels(interpreter, config, ClassLabels::coco())
    }

    /// 使用自定义标签表创建检测器
    pub fn with_labels(interpreter: I, config: &DetectorConfig, labels: ClassLabels) -> Result<Self> {
        config.validate()?;
        let colors = generate_colors(labels.len(), config.color_seed);
        let filter = LabelFilter::new(config.valid_labels.iter().cloned());
        info!(
            "detector ready: {} classes, {} allowed labels, min score {}",
            labels.len(),
            if filter.is_empty() {
                "all".to_string()
            } else {
                filter.len().to_string()
            },
            config.min_score
        );
        Ok(Self {
            interpreter,
            config: config.clone(),
            labels,
            colors,
            filter,
        })
    }

    /// 检测单帧
    ///
    /// 返回 标签 => 置信度 映射。`draw`为真时在原帧上绘制检测框，
    /// 任一步骤失败都不会修改帧。
    pub fn detect_frame(&mut self, frame: &mut Frame, draw: bool) -> Result<DetectionResult> {
        let detections = self.run_detection(frame)?;
        let result = self.aggregate(&detections);
        if draw {
            annotate_frame(frame, &detections, &self.labels, &self.filter, &self.colors)?;
        }
        Ok(result)
    }

    /// 检测单帧但不绘制
    pub fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        let detections = self.run_detection(frame)?;
        Ok(self.aggregate(&detections))
    }

    /// 预处理、推理与过滤，返回汇总前的检测序列
    pub fn run_detection(&mut self, frame: &Frame) -> Result<Detections> {
        let input = preprocess_frame(frame, self.config.input_size)?;

        let start_time = Instant::now();
        let raw = run_inference(&mut self.interpreter, input)?;
        debug!("inference took {:?}", start_time.elapsed());

        let filtered =
            non_max_suppression(&raw, self.config.max_boxes, self.config.score_threshold);
        debug!("{} of {} raw detections kept", filtered.len(), raw.len());
        Ok(filtered)
    }

    /// 在任意画布上绘制检测结果
    pub fn draw_boxes(&self, canvas: &mut dyn Canvas, detections: &Detections) {
        draw_boxes(canvas, detections, &self.labels, &self.filter, &self.colors);
    }

    fn aggregate(&self, detections: &Detections) -> DetectionResult {
        aggregate_detections(detections, &self.labels, &self.filter, self.config.min_score)
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
