use image::RgbImage;
use ndarray::{Array3, ArrayView3, ArrayViewMut3};

use crate::error::{DetectError, Result};

/// 视频帧（BGR通道顺序，形状为 高×宽×3）
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
}

impl Frame {
    /// 从 高×宽×3 数组构建帧，通道数不为3时返回`InvalidInput`
    pub fn from_array(pixels: Array3<u8>) -> Result<Self> {
        let channels = pixels.dim().2;
        if channels != 3 {
            return Err(DetectError::InvalidInput(format!(
                "expected 3 channels, got {channels}"
            )));
        }
        Ok(Self { pixels })
    }

    /// 从按行排列的BGR字节构建帧
    pub fn from_bgr_bytes(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| DetectError::InvalidInput("frame dimensions overflow".to_string()))?;
        if bytes.len() != expected {
            return Err(DetectError::InvalidInput(format!(
                "expected {expected} BGR bytes for {width}x{height}, received {}",
                bytes.len()
            )));
        }
        let pixels = Array3::from_shape_vec((height as usize, width as usize, 3), bytes)
            .map_err(|e| DetectError::InvalidInput(e.to_string()))?;
        Ok(Self { pixels })
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let pixels = Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
            image.get_pixel(x as u32, y as u32).0[2 - c]
        });
        Self { pixels }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width(), self.height(), |x, y| {
            let (x, y) = (x as usize, y as usize);
            image::Rgb([
                self.pixels[[y, x, 2]],
                self.pixels[[y, x, 1]],
                self.pixels[[y, x, 0]],
            ])
        })
    }

    /// 帧宽度（像素）
    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    /// 帧高度（像素）
    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// 读取(x, y)处的BGR像素
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let (x, y) = (x as usize, y as usize);
        if y >= self.pixels.dim().0 || x >= self.pixels.dim().1 {
            return None;
        }
        Some([
            self.pixels[[y, x, 0]],
            self.pixels[[y, x, 1]],
            self.pixels[[y, x, 2]],
        ])
    }

    /// 以 高×宽×3 视图访问BGR像素
    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        self.pixels.view_mut()
    }
}
