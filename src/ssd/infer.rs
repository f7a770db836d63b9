use ndarray::{Array4, ArrayD, Axis, Ix1, Ix2};

use crate::error::{DetectError, Result};
use crate::ssd::bounds::{BoundingBox, Detections};

/// 输出张量位置：边界框、类别、分数
pub const BOXES_OUTPUT: usize = 0;
pub const CLASSES_OUTPUT: usize = 1;
pub const SCORES_OUTPUT: usize = 2;

/// 非有限类别输出对应的索引，不属于任何标签表
pub const UNKNOWN_CLASS: i64 = -1;

/// 模型加载器返回的解释器句柄
///
/// 句柄不支持并发调用，`set_input`与`invoke`需要`&mut self`，
/// 同一实例同时只能有一次推理。
pub trait Interpreter {
    /// 设置输入张量
    fn set_input(&mut self, input: Array4<f32>) -> Result<()>;

    /// 执行推理
    fn invoke(&mut self) -> Result<()>;

    /// 按位置取上一次推理的输出
    fn output(&self, index: usize) -> Result<ArrayD<f32>>;
}

/// 运行模型推理
///
/// 提交输入张量并取回三个输出，去掉batch维度后整理为并列序列。
/// 模型类别空间中0为背景，因此类别索引统一加一，以对齐标签表；
/// 非有限的类别值记为`UNKNOWN_CLASS`。
///
/// # 参数
/// * `interpreter` - 已加载模型的解释器
/// * `input` - 预处理后的NHWC输入张量
///
/// # 返回值
/// 返回按模型输出顺序排列的检测序列
///
/// # 错误处理
/// 推理失败、输出缺失、batch维度不为1、形状不符或三个输出长度不一致时返回`Inference`错误
///
/// # 示例
///
/// ```no_run
/// use std::path::Path;
/// use ndarray::Array4;
/// use objdetect::OrtInterpreter;
/// use objdetect::ssd::run_inference;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut interpreter = OrtInterpreter::load(Path::new("models/ssd_mobilenet.onnx"))?;
/// let detections = run_inference(&mut interpreter, Array4::zeros((1, 300, 300, 3)))?;
/// println!("{} raw detections", detections.len());
/// # Ok(())
/// # }
/// ```
pub fn run_inference<I: Interpreter + ?Sized>(
    interpreter: &mut I,
    input: Array4<f32>,
) -> Result<Detections> {
    interpreter.set_input(input)?;
    interpreter.invoke()?;

    let boxes = squeeze_batch(interpreter.output(BOXES_OUTPUT)?, "boxes")?;
    let classes = squeeze_batch(interpreter.output(CLASSES_OUTPUT)?, "classes")?;
    let scores = squeeze_batch(interpreter.output(SCORES_OUTPUT)?, "scores")?;

    let boxes = boxes
        .into_dimensionality::<Ix2>()
        .map_err(|e| DetectError::Inference(format!("boxes output must be Nx4: {e}")))?;
    if boxes.ncols() != 4 {
        return Err(DetectError::Inference(format!(
            "boxes output must be Nx4, got {:?}",
            boxes.shape()
        )));
    }
    let classes = classes
        .into_dimensionality::<Ix1>()
        .map_err(|e| DetectError::Inference(format!("classes output must be 1-D: {e}")))?;
    let scores = scores
        .into_dimensionality::<Ix1>()
        .map_err(|e| DetectError::Inference(format!("scores output must be 1-D: {e}")))?;

    let boxes = boxes
        .axis_iter(Axis(0))
        .map(|row| BoundingBox::new(row[0], row[1], row[2], row[3]))
        .collect();
    let classes = classes.iter().map(|&c| shift_class(c)).collect();
    let scores = scores.to_vec();

    Detections::from_parts(boxes, classes, scores)
}

fn shift_class(raw: f32) -> i64 {
    if raw.is_finite() {
        (raw + 1.0) as i64
    } else {
        UNKNOWN_CLASS
    }
}

// 只去掉最前面的batch维度，单个检测时仍保持 1x4 的形状
fn squeeze_batch(output: ArrayD<f32>, name: &str) -> Result<ArrayD<f32>> {
    match output.shape().first() {
        Some(1) => Ok(output.index_axis_move(Axis(0), 0)),
        _ => Err(DetectError::Inference(format!(
            "{name} output must have a batch dimension of 1, got {:?}",
            output.shape()
        ))),
    }
}
