//! 检测结果可视化
//!
//! 过滤与汇总逻辑不依赖任何绘图后端，绘制通过`Canvas`抽象完成。
//! 坐标均为像素坐标，颜色按帧本身的BGR顺序给出。

use raqote::{
    AntialiasMode, DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source,
    StrokeStyle,
};

use crate::error::{DetectError, Result};
use crate::ssd::bounds::{Detections, PixelRect};
use crate::ssd::frame::Frame;
use crate::ssd::glyphs::{GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH, glyph, is_lit};
use crate::ssd::labels::{ClassLabels, LabelFilter};
use crate::ssd::palette::Color;
use crate::ssd::posts::resolve_label;

pub const BOX_THICKNESS: u32 = 6;
pub const FONT_SCALE: f32 = 1.0;
pub const TEXT_COLOR: Color = Color::BLACK;

/// 绘图能力接口
pub trait Canvas {
    /// 画布宽度（像素）
    fn width(&self) -> u32;

    /// 画布高度（像素）
    fn height(&self) -> u32;

    /// 空心矩形
    fn draw_rect(&mut self, rect: PixelRect, bgr: [u8; 3], thickness: u32);

    /// 实心矩形
    fn fill_rect(&mut self, rect: PixelRect, bgr: [u8; 3]);

    /// 文本尺寸(宽, 高)
    fn text_size(&self, text: &str, scale: f32) -> (u32, u32);

    /// 以`origin`为左下角绘制文本
    fn draw_text(&mut self, text: &str, origin: (i32, i32), scale: f32, bgr: [u8; 3]);
}

/// 在画布上绘制检测框与标签
///
/// 逆序绘制，原始顺序靠前的检测结果会覆盖在最上层。
/// 只应用标签白名单，不再按最低分数过滤。
pub fn draw_boxes(
    canvas: &mut dyn Canvas,
    detections: &Detections,
    labels: &ClassLabels,
    filter: &LabelFilter,
    colors: &[Color],
) {
    let (width, height) = (canvas.width(), canvas.height());

    for (bbox, class, score) in detections.iter().rev() {
        let Some(label) = resolve_label(labels, class) else {
            continue;
        };
        if !filter.allows(label) {
            continue;
        }
        let Some(color) = usize::try_from(class).ok().and_then(|i| colors.get(i)) else {
            continue;
        };
        let bgr = color.bgr();
        let rect = bbox.to_pixels(width, height);
        canvas.draw_rect(rect, bgr, BOX_THICKNESS);

        let text = format!("{label} {score:.2}");
        let (text_w, text_h) = canvas.text_size(&text, FONT_SCALE);
        let background = PixelRect::new(
            rect.left - 3,
            rect.top - 3,
            rect.left + 3 + text_w as i32,
            rect.top - 5 - text_h as i32,
        );
        canvas.fill_rect(background, bgr);
        canvas.draw_text(&text, (rect.left, rect.top - 4), FONT_SCALE, TEXT_COLOR.bgr());
    }
}

/// 基于raqote的软件画布
pub struct RaqoteCanvas {
    target: DrawTarget,
    width: u32,
    height: u32,
}

impl RaqoteCanvas {
    /// 以帧内容初始化画布
    pub fn from_frame(frame: &Frame) -> Self {
        let (width, height) = (frame.width(), frame.height());
        let mut target = DrawTarget::new(width as i32, height as i32);
        let view = frame.view();
        for (slot, px) in target
            .get_data_mut()
            .iter_mut()
            .zip(view.as_standard_layout().rows())
        {
            // raqote像素为小端 [b, g, r, a]
            *slot = u32::from_le_bytes([px[0], px[1], px[2], 0xFF]);
        }
        Self { target, width, height }
    }

    /// 将绘制结果写回帧
    pub fn write_to(&self, frame: &mut Frame) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(DetectError::InvalidInput(format!(
                "canvas is {}x{}, frame is {}x{}",
                self.width,
                self.height,
                frame.width(),
                frame.height()
            )));
        }
        let width = self.width as usize;
        let data = self.target.get_data();
        let mut view = frame.view_mut();
        for ((y, x, c), value) in view.indexed_iter_mut() {
            let bytes = data[y * width + x].to_le_bytes();
            *value = bytes[c];
        }
        Ok(())
    }

    fn options() -> DrawOptions {
        DrawOptions {
            antialias: AntialiasMode::None,
            ..DrawOptions::new()
        }
    }

    fn source(bgr: [u8; 3]) -> Source<'static> {
        Source::Solid(SolidSource {
            r: bgr[2],
            g: bgr[1],
            b: bgr[0],
            a: 0xFF,
        })
    }

    fn cell_size(scale: f32) -> u32 {
        ((3.0 * scale).round() as u32).max(1)
    }
}

impl Canvas for RaqoteCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn draw_rect(&mut self, rect: PixelRect, bgr: [u8; 3], thickness: u32) {
        let rect = rect.normalized();
        let mut pb = PathBuilder::new();
        pb.rect(
            rect.left as f32,
            rect.top as f32,
            rect.width() as f32,
            rect.height() as f32,
        );
        let path = pb.finish();
        self.target.stroke(
            &path,
            &Self::source(bgr),
            &StrokeStyle {
                join: LineJoin::Miter,
                width: thickness.max(1) as f32,
                ..StrokeStyle::default()
            },
            &Self::options(),
        );
    }

    fn fill_rect(&mut self, rect: PixelRect, bgr: [u8; 3]) {
        let rect = rect.normalized();
        self.target.fill_rect(
            rect.left as f32,
            rect.top as f32,
            rect.width() as f32,
            rect.height() as f32,
            &Self::source(bgr),
            &Self::options(),
        );
    }

    fn text_size(&self, text: &str, scale: f32) -> (u32, u32) {
        let cell = Self::cell_size(scale);
        let count = text.chars().count() as u32;
        let width = match count {
            0 => 0,
            n => (n * GLYPH_ADVANCE - 1) * cell,
        };
        (width, GLYPH_HEIGHT * cell)
    }

    fn draw_text(&mut self, text: &str, origin: (i32, i32), scale: f32, bgr: [u8; 3]) {
        let cell = Self::cell_size(scale);
        let top = origin.1 - (GLYPH_HEIGHT * cell) as i32;
        let source = Self::source(bgr);
        let options = Self::options();

        for (i, ch) in text.chars().enumerate() {
            let rows = glyph(ch);
            let left = origin.0 + (i as u32 * GLYPH_ADVANCE * cell) as i32;
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !is_lit(&rows, col, row) {
                        continue;
                    }
                    self.target.fill_rect(
                        (left + (col * cell) as i32) as f32,
                        (top + (row * cell) as i32) as f32,
                        cell as f32,
                        cell as f32,
                        &source,
                        &options,
                    );
                }
            }
        }
    }
}

/// 直接在帧上绘制检测结果
pub fn annotate_frame(
    frame: &mut Frame,
    detections: &Detections,
    labels: &ClassLabels,
    filter: &LabelFilter,
    colors: &[Color],
) -> Result<()> {
    let mut canvas = RaqoteCanvas::from_frame(frame);
    draw_boxes(&mut canvas, detections, labels, filter, colors);
    canvas.write_to(frame)
}
