use std::path::Path;

use log::info;
use ndarray::{Array4, ArrayD, IxDyn};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use crate::error::{DetectError, Result};
use crate::ssd::infer::Interpreter;

/// 加载检测模型
///
/// 加载ONNX格式的SSD模型，并应用优化配置。
///
/// # 参数
/// * `model_path` - 模型文件路径
///
/// # 返回值
/// 返回加载的Session对象
///
/// # 错误处理
/// 文件不存在或无法解析时返回`Configuration`错误
///
/// # 示例
///
/// ```no_run
/// use std::path::Path;
/// use objdetect::ssd::load_model;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = load_model(Path::new("models/ssd_mobilenet.onnx"))?;
/// println!("{} outputs", session.outputs.len());
/// # Ok(())
/// # }
/// ```
pub fn load_model(model_path: &Path) -> Result<Session> {
    if !model_path.exists() {
        return Err(DetectError::Configuration(format!(
            "model file does not exist: {}",
            model_path.display()
        )));
    }
    build_session(model_path).map_err(|e| {
        DetectError::Configuration(format!(
            "failed to load model {}: {e}",
            model_path.display()
        ))
    })
}

fn build_session(model_path: &Path) -> std::result::Result<Session, ort::Error> {
    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)?;
    Ok(model)
}

/// 基于ONNX Runtime的解释器
pub struct OrtInterpreter {
    session: Session,
    input_name: String,
    pending: Option<Array4<f32>>,
    outputs: Vec<ArrayD<f32>>,
}

impl OrtInterpreter {
    pub fn load(model_path: &Path) -> Result<Self> {
        let session = load_model(model_path)?;
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DetectError::Configuration("model declares no inputs".to_string()))?;
        info!(
            "loaded model {} (input '{}', {} outputs)",
            model_path.display(),
            input_name,
            session.outputs.len()
        );
        Ok(Self {
            session,
            input_name,
            pending: None,
            outputs: Vec::new(),
        })
    }
}

impl Interpreter for OrtInterpreter {
    fn set_input(&mut self, input: Array4<f32>) -> Result<()> {
        self.pending = Some(input);
        Ok(())
    }

    fn invoke(&mut self) -> Result<()> {
        let input = self
            .pending
            .take()
            .ok_or_else(|| DetectError::Inference("invoke called without an input".to_string()))?;
        let shape: Vec<usize> = input.shape().to_vec();
        let (data, _offset) = input.into_raw_vec_and_offset();
        let input_tensor = Tensor::from_array(([shape[0], shape[1], shape[2], shape[3]], data))
            .map_err(|e| DetectError::Inference(format!("failed to build input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let mut fetched = Vec::with_capacity(outputs.len());
        for index in 0..outputs.len() {
            let (dims, data) = outputs[index]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectError::Inference(format!("output {index} is not f32: {e}")))?;
            let dims: Vec<usize> = dims.iter().map(|&d| d.max(0) as usize).collect();
            let array = ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())
                .map_err(|e| DetectError::Inference(format!("output {index}: {e}")))?;
            fetched.push(array);
        }
        drop(outputs);

        self.outputs = fetched;
        Ok(())
    }

    fn output(&self, index: usize) -> Result<ArrayD<f32>> {
        self.outputs.get(index).cloned().ok_or_else(|| {
            DetectError::Inference(format!(
                "model produced {} outputs, index {index} requested",
                self.outputs.len()
            ))
        })
    }
}
