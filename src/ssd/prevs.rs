use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;

use crate::error::{DetectError, Result};
use crate::ssd::frame::Frame;

/// 调整图像大小以适应模型输入
///
/// 使用双线性插值将图像缩放为`size`×`size`。
pub fn resize_image(img: &RgbImage, size: u32) -> RgbImage {
    image::imageops::resize(img, size, size, FilterType::Triangle)
}

/// 将BGR帧转换为模型输入张量
///
/// 将帧转换为模型所需的四维张量格式，包括：
/// 1. BGR转RGB
/// 2. 缩放到`size`×`size`
/// 3. 增加batch维度，得到NHWC布局(1, size, size, 3)
/// 4. 像素值按 `2/255 * p - 1` 映射到[-1, 1]
///
/// # 参数
/// * `frame` - BGR帧
/// * `size` - 模型输入的正方形边长
///
/// # 返回值
/// 返回形状为(1, size, size, 3)的四维张量，通道顺序为RGB
///
/// # 错误处理
/// 空帧或`size`为0时返回`InvalidInput`
///
/// # 示例
///
/// ```
/// use ndarray::Array3;
/// use objdetect::{Frame, preprocess_frame};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let frame = Frame::from_array(Array3::<u8>::zeros((480, 640, 3)))?;
/// let input = preprocess_frame(&frame, 300)?;
/// assert_eq!(input.shape(), &[1, 300, 300, 3]);
/// assert_eq!(input[[0, 0, 0, 0]], -1.0);
/// # Ok(())
/// # }
/// ```
pub fn preprocess_frame(frame: &Frame, size: u32) -> Result<Array4<f32>> {
    if frame.is_empty() {
        return Err(DetectError::InvalidInput(format!(
            "cannot preprocess empty frame ({}x{})",
            frame.width(),
            frame.height()
        )));
    }
    if size == 0 {
        return Err(DetectError::InvalidInput("model input size is zero".to_string()));
    }

    let resized = resize_image(&frame.to_rgb_image(), size);
    let side = size as usize;
    let tensor = Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        let value = resized.get_pixel(x as u32, y as u32).0[c] as f32;
        (2.0 / 255.0) * value - 1.0
    });
    Ok(tensor)
}
