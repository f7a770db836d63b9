//! 类别标签目录
//!
//! SSD MobileNet (COCO) 的91类标签表。模型输出的类别索引在加一之后
//! 与本表对齐，索引0以及数据集中未使用的位置均为占位项。

use std::collections::HashSet;

pub const COCO_CLASS_NAMES: [&str; 91] = [
    "None0", "person", "bicycle", "car", "motorbike", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "None12", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe",
    "None26", "backpack", "umbrella", "None29", "None30", "handbag", "tie", "suitcase",
    "frisbee", "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "None45", "wine glass", "cup", "fork",
    "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange", "broccoli", "carrot",
    "hot dog", "pizza", "donut", "cake", "chair", "sofa", "pottedplant", "bed", "None66",
    "diningtable", "None68", "None69", "toilet", "None71", "tvmonitor", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "None83", "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

const PLACEHOLDER_PREFIX: &str = "None";

/// 不可变的有序类别目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// COCO标签表
    pub fn coco() -> Self {
        Self::new(COCO_CLASS_NAMES.iter().map(|name| name.to_string()).collect())
    }

    /// 按类别索引取标签，负数或越界时返回None
    pub fn get(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    pub fn is_placeholder(&self, index: i64) -> bool {
        self.get(index)
            .is_some_and(|name| name.starts_with(PLACEHOLDER_PREFIX))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self::coco()
    }
}

/// 标签白名单
///
/// 为空时放行所有标签。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    allowed: HashSet<String>,
}

impl LabelFilter {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn allows(&self, label: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(label)
    }

    /// 白名单为空时不限制任何标签
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }
}
