use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{DetectError, Result};

// 检测超参数默认值
pub const DEFAULT_INPUT_SIZE: u32 = 300;
pub const DEFAULT_MIN_SCORE: f32 = 0.6;
pub const DEFAULT_MAX_BOXES: usize = 10;
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// 类别颜色表的固定洗牌种子
pub const COLOR_SEED: u64 = 10101;

const ENV_MODEL_PATH: &str = "OBJDETECT_MODEL_PATH";
const ENV_MIN_SCORE: &str = "OBJDETECT_MIN_SCORE";
const ENV_VALID_LABELS: &str = "OBJDETECT_VALID_LABELS";

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    model_path: Option<PathBuf>,
    valid_labels: Option<Vec<String>>,
    min_score: Option<f32>,
    input_size: Option<u32>,
    max_boxes: Option<usize>,
    score_threshold: Option<f32>,
    color_seed: Option<u64>,
}

impl DetectorConfigFile {
    fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    // 环境变量覆盖文件中的同名项
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_MODEL_PATH) {
            debug!("model path overridden by {}", ENV_MODEL_PATH);
            self.model_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_MIN_SCORE) {
            let min_score = raw.trim().parse().map_err(|_| {
                DetectError::Configuration(format!("{ENV_MIN_SCORE} must be a number, got {raw:?}"))
            })?;
            self.min_score = Some(min_score);
        }
        if let Some(raw) = lookup(ENV_VALID_LABELS) {
            self.valid_labels = Some(parse_label_list(&raw));
        }
        Ok(())
    }
}

/// 检测器配置
///
/// 构建`ObjectDetector`之后不再修改。
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    /// 允许输出的标签列表，为空表示不限制
    pub valid_labels: Vec<String>,
    /// 生成标签映射时使用的最低置信度
    pub min_score: f32,
    /// 模型输入的正方形边长
    pub input_size: u32,
    /// 推理后最多保留的检测框数量，0表示不限制
    pub max_boxes: usize,
    /// 原始分数必须严格大于该阈值才会被保留
    pub score_threshold: f32,
    pub color_seed: u64,
}

impl DetectorConfig {
    /// 以默认超参数创建配置
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            valid_labels: Vec::new(),
            min_score: DEFAULT_MIN_SCORE,
            input_size: DEFAULT_INPUT_SIZE,
            max_boxes: DEFAULT_MAX_BOXES,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            color_seed: COLOR_SEED,
        }
    }

    /// 设置标签白名单，空列表表示不限制
    pub fn with_valid_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// 设置汇总时的最低置信度
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = input_size;
        self
    }

    /// 设置最多保留的检测框数量，0表示不限制
    pub fn with_max_boxes(mut self, max_boxes: usize) -> Self {
        self.max_boxes = max_boxes;
        self
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// 从TOML文件加载配置
    ///
    /// 读取文件后应用环境变量覆盖，最后校验取值范围。
    /// 文件中缺少`model_path`时可由`OBJDETECT_MODEL_PATH`提供。
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = read_config_file(path)?;
        file.apply_env()?;
        let cfg = Self::from_file(file)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 解析TOML字符串（不读取环境变量）
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: DetectorConfigFile = toml::from_str(raw)
            .map_err(|e| DetectError::Configuration(format!("invalid config: {e}")))?;
        let cfg = Self::from_file(file)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectorConfigFile) -> Result<Self> {
        let model_path = file
            .model_path
            .ok_or_else(|| DetectError::Configuration("model_path is required".to_string()))?;

        Ok(Self {
            model_path,
            valid_labels: file.valid_labels.unwrap_or_default(),
            min_score: file.min_score.unwrap_or(DEFAULT_MIN_SCORE),
            input_size: file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            max_boxes: file.max_boxes.unwrap_or(DEFAULT_MAX_BOXES),
            score_threshold: file.score_threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD),
            color_seed: file.color_seed.unwrap_or(COLOR_SEED),
        })
    }

    /// 校验分数位于[0, 1]且输入尺寸大于0
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("min_score", self.min_score)?;
        check_unit_interval("score_threshold", self.score_threshold)?;
        if self.input_size == 0 {
            return Err(DetectError::Configuration(
                "input_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// 解析逗号分隔的标签列表，忽略空项
pub fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

fn check_unit_interval(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(DetectError::Configuration(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<DetectorConfigFile> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        DetectError::Configuration(format!("failed to read config {}: {e}", path.display()))
    })?;
    toml::from_str(&raw).map_err(|e| {
        DetectError::Configuration(format!("invalid config {}: {e}", path.display()))
    })
}
