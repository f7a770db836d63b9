use thiserror::Error;

/// 检测流程中的错误类型
///
/// 流程内部不做任何重试，失败的帧不产生检测结果。
#[derive(Debug, Error)]
pub enum DetectError {
    /// 模型文件或配置不可用，仅在构建时出现
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 输入帧为空或格式错误
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 推理失败或输出形状不符合预期
    #[error("inference failed: {0}")]
    Inference(String),
}

pub type Result<T> = std::result::Result<T, DetectError>;
