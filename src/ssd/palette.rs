//! 类别颜色表
//!
//! 将色相环按类别数等分，转换为RGB后用固定种子洗牌，
//! 使相邻类别的颜色差异明显且每次运行结果一致。

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// RGB颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 以BGR顺序返回通道，供绘制到BGR帧时使用
    pub fn bgr(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

/// 为`count`个类别生成颜色表
///
/// 纯函数：只使用由`seed`构造的局部随机数生成器，不影响进程内其他随机数状态。
pub fn generate_colors(count: usize, seed: u64) -> Vec<Color> {
    let mut colors: Vec<Color> = (0..count)
        .map(|i| hsv_to_rgb(i as f32 / count as f32, 1.0, 1.0))
        .map(|(r, g, b)| Color::new(to_channel(r), to_channel(g), to_channel(b)))
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    colors.shuffle(&mut rng);
    colors
}

// 截断取整，与常见的 int(x * 255) 一致
fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}
