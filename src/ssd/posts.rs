//! 检测结果后处理模块
//!
//! 负责截断、按分数过滤模型输出，并按标签白名单汇总为 标签 => 置信度 映射。

use std::collections::BTreeMap;

use log::warn;

use crate::ssd::bounds::Detections;
use crate::ssd::labels::{ClassLabels, LabelFilter};

/// 单帧检测结果：标签 => 置信度
pub type DetectionResult = BTreeMap<String, f32>;

/// 按数量与分数截断检测结果
///
/// 名称沿用常见叫法，但这里不做基于IoU的重叠抑制：
/// 依赖模型输出已按置信度降序排列，只取前`max_boxes`个中
/// 分数严格大于`min_score_thresh`的项，保持原有顺序。
///
/// # 参数
/// * `detections` - 模型原始输出
/// * `max_boxes` - 最多检查的项数，0表示不截断
/// * `min_score_thresh` - 分数阈值，NaN分数不会被保留
///
/// # 返回值
/// 返回过滤后的检测序列
///
/// # 示例
///
/// ```
/// use objdetect::{BoundingBox, Detections, non_max_suppression};
///
/// let mut raw = Detections::new();
/// raw.push(BoundingBox::new(0.1, 0.1, 0.5, 0.5), 1, 0.9);
/// raw.push(BoundingBox::new(0.2, 0.2, 0.6, 0.6), 3, 0.4);
/// let kept = non_max_suppression(&raw, 10, 0.5);
/// assert_eq!(kept.classes(), &[1]);
/// ```
pub fn non_max_suppression(
    detections: &Detections,
    max_boxes: usize,
    min_score_thresh: f32,
) -> Detections {
    let limit = if max_boxes == 0 {
        detections.len()
    } else {
        max_boxes.min(detections.len())
    };

    let mut kept = Detections::with_capacity(limit);
    for (bbox, class, score) in detections.iter().take(limit) {
        if score > min_score_thresh {
            kept.push(bbox, class, score);
        }
    }
    kept
}

/// 汇总为 标签 => 置信度 映射
///
/// 跳过白名单之外的标签与低于`min_score`的项。
/// 同一标签出现多次时保留原始顺序中最先出现的那一项。
pub fn aggregate_detections(
    detections: &Detections,
    labels: &ClassLabels,
    filter: &LabelFilter,
    min_score: f32,
) -> DetectionResult {
    let mut result = DetectionResult::new();
    for (_, class, score) in detections.iter() {
        let Some(label) = resolve_label(labels, class) else {
            continue;
        };
        if !filter.allows(label) || score < min_score {
            continue;
        }
        result.entry(label.to_string()).or_insert(score);
    }
    result
}

pub(crate) fn resolve_label(labels: &ClassLabels, class: i64) -> Option<&str> {
    let label = labels.get(class);
    if label.is_none() {
        warn!(
            "class index {} outside catalog of {} labels, skipped",
            class,
            labels.len()
        );
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssd::bounds::BoundingBox;

    fn detections(entries: &[(i64, f32)]) -> Detections {
        let mut dets = Detections::new();
        for &(class, score) in entries {
            dets.push(BoundingBox::new(0.1, 0.1, 0.9, 0.9), class, score);
        }
        dets
    }

    #[test]
    fn zero_max_boxes_means_no_cap() {
        let raw = detections(&[(1, 0.9); 25]);
        assert_eq!(non_max_suppression(&raw, 0, 0.5).len(), 25);
    }

    #[test]
    fn max_boxes_caps_before_threshold() {
        let raw = detections(&[(1, 0.9), (2, 0.2), (3, 0.8), (4, 0.95)]);
        let kept = non_max_suppression(&raw, 3, 0.5);
        assert_eq!(kept.classes(), &[1, 3]);

        let kept = non_max_suppression(&raw, 10, 0.5);
        assert_eq!(kept.classes(), &[1, 3, 4]);
    }

    #[test]
    fn threshold_is_strict() {
        let raw = detections(&[(1, 0.5), (2, 0.50001), (3, f32::NAN)]);
        let kept = non_max_suppression(&raw, 0, 0.5);
        assert_eq!(kept.classes(), &[2]);
        assert!(kept.scores().iter().all(|&s| s > 0.5));
    }

    #[test]
    fn allow_list_restricts_labels() {
        let labels = ClassLabels::coco();
        // car = 3, dog = 18
        let dets = detections(&[(3, 0.7), (18, 0.9)]);
        let result = aggregate_detections(&dets, &labels, &LabelFilter::new(["car"]), 0.6);
        assert_eq!(result, DetectionResult::from([("car".to_string(), 0.7)]));
    }

    #[test]
    fn earliest_duplicate_wins() {
        let labels = ClassLabels::coco();
        let dets = detections(&[(3, 0.5), (3, 0.8)]);
        let result = aggregate_detections(&dets, &labels, &LabelFilter::allow_all(), 0.4);
        assert_eq!(result.get("car"), Some(&0.5));
    }

    #[test]
    fn min_score_is_inclusive() {
        let labels = ClassLabels::coco();
        let dets = detections(&[(1, 0.6), (2, 0.59)]);
        let result = aggregate_detections(&dets, &labels, &LabelFilter::allow_all(), 0.6);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("person"), Some(&0.6));
    }

    #[test]
    fn unknown_class_index_is_skipped() {
        let labels = ClassLabels::coco();
        let dets = detections(&[(500, 0.9), (-1, 0.9), (1, 0.9)]);
        let result = aggregate_detections(&dets, &labels, &LabelFilter::allow_all(), 0.6);
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["person"]);
    }
}
