use crate::error::{DetectError, Result};

/// 边界框结构
///
/// 归一化坐标，取值范围[0, 1]，顺序与模型输出一致(ymin, xmin, ymax, xmax)。
#[derive(Debug, Clone, Default, Copy, PartialEq)]
pub struct BoundingBox {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
}

impl BoundingBox {
    pub fn new(ymin: f32, xmin: f32, ymax: f32, xmax: f32) -> Self {
        Self { ymin, xmin, ymax, xmax }
    }

    /// 换算到像素坐标
    ///
    /// 按帧宽高缩放后四舍五入，并限制在帧范围内。越界的框不会报错。
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        let (w, h) = (frame_width as f32, frame_height as f32);
        let round = |v: f32| (v + 0.5).floor();
        let clamp = |v: f32, limit: u32| {
            if v.is_nan() {
                0
            } else {
                v.clamp(0.0, limit as f32) as i32
            }
        };
        PixelRect {
            left: clamp(round(self.xmin * w), frame_width),
            top: clamp(round(self.ymin * h), frame_height),
            right: clamp(round(self.xmax * w), frame_width),
            bottom: clamp(round(self.ymax * h), frame_height),
        }
    }
}

/// 像素空间的矩形，两个角点可以落在画布外
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// 角点顺序无关的规范化矩形
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).abs()
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).abs()
    }
}

/// 并列的检测序列：边界框、类别索引与分数一一对应
///
/// 推理输出与过滤结果共用该结构。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
    boxes: Vec<BoundingBox>,
    classes: Vec<i64>,
    scores: Vec<f32>,
}

impl Detections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            boxes: Vec::with_capacity(capacity),
            classes: Vec::with_capacity(capacity),
            scores: Vec::with_capacity(capacity),
        }
    }

    /// 由三个并列序列构建，长度不一致时返回错误
    pub fn from_parts(boxes: Vec<BoundingBox>, classes: Vec<i64>, scores: Vec<f32>) -> Result<Self> {
        if boxes.len() != classes.len() || boxes.len() != scores.len() {
            return Err(DetectError::Inference(format!(
                "parallel outputs differ in length: {} boxes, {} classes, {} scores",
                boxes.len(),
                classes.len(),
                scores.len()
            )));
        }
        Ok(Self { boxes, classes, scores })
    }

    pub fn push(&mut self, bbox: BoundingBox, class: i64, score: f32) {
        self.boxes.push(bbox);
        self.classes.push(class);
        self.scores.push(score);
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn get(&self, index: usize) -> Option<(BoundingBox, i64, f32)> {
        if index < self.len() {
            Some((self.boxes[index], self.classes[index], self.scores[index]))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (BoundingBox, i64, f32)> + '_ {
        self.boxes
            .iter()
            .zip(&self.classes)
            .zip(&self.scores)
            .map(|((bbox, class), score)| (*bbox, *class, *score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_box_rounds_to_nearest() {
        let bbox = BoundingBox::new(0.1, 0.25, 0.5, 0.755);
        let rect = bbox.to_pixels(200, 100);
        assert_eq!(rect, PixelRect::new(50, 10, 151, 50));
    }

    #[test]
    fn pixel_box_is_clamped_to_frame() {
        let bbox = BoundingBox::new(-0.2, -1.0, 1.3, 2.0);
        let rect = bbox.to_pixels(640, 480);
        assert_eq!(rect, PixelRect::new(0, 0, 640, 480));
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        let err = Detections::from_parts(vec![BoundingBox::default()], vec![1, 2], vec![0.5]);
        assert!(matches!(err, Err(DetectError::Inference(_))));
    }

    #[test]
    fn iteration_keeps_parallel_order() {
        let mut dets = Detections::new();
        dets.push(BoundingBox::new(0.0, 0.0, 0.5, 0.5), 1, 0.9);
        dets.push(BoundingBox::new(0.5, 0.5, 1.0, 1.0), 3, 0.7);
        let classes: Vec<i64> = dets.iter().rev().map(|(_, c, _)| c).collect();
        assert_eq!(classes, vec![3, 1]);
        assert_eq!(dets.get(1).map(|(_, _, s)| s), Some(0.7));
        assert_eq!(dets.get(2), None);
    }

    #[test]
    fn rect_normalization_orders_corners() {
        let rect = PixelRect::new(10, 20, 4, 2).normalized();
        assert_eq!(rect, PixelRect::new(4, 2, 10, 20));
        assert_eq!((rect.width(), rect.height()), (6, 18));
    }
}
