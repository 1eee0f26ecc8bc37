// 该文件是 Xunmu （寻目） 项目的一部分。
// src/output/draw.rs - 检测结果绘制
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};

use crate::{
  frame::RasterImage,
  model::DetectionSet,
  output::overlay::{DrawPrimitive, OverlayBuilder},
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const STROKE_WIDTH: i32 = 2;
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]); // 白色文本

/// 把绘制图元画到 RGBA 图像上。
///
/// 没有配置字体时只画边框与标签背景。
pub struct Draw {
  overlay: OverlayBuilder,
  font: Option<FontArc>,
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  stroke_width: i32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      overlay: OverlayBuilder::default(),
      font: None,
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      stroke_width: STROKE_WIDTH,
    }
  }
}

impl Draw {
  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = Some(font);
    self
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  /// 在原图副本上绘制检测结果，原图不变。
  pub fn draw_detections(&self, image: &RasterImage, detections: &DetectionSet) -> RgbaImage {
    let mut canvas = image.to_rgba_image();
    let primitives = self.overlay.build(detections);
    self.draw_primitives(&mut canvas, &primitives);
    canvas
  }

  pub fn draw_primitives(&self, image: &mut RgbaImage, primitives: &[DrawPrimitive]) {
    for primitive in primitives {
      self.draw_primitive(image, primitive);
    }
  }

  fn draw_primitive(&self, image: &mut RgbaImage, primitive: &DrawPrimitive) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    let [x, y, bw, bh] = primitive.rect;
    let x_min = (x.floor() as i32).clamp(0, w - 1);
    let y_min = (y.floor() as i32).clamp(0, h - 1);
    let x_max = ((x + bw).ceil() as i32).clamp(0, w - 1);
    let y_max = ((y + bh).ceil() as i32).clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
      return;
    }

    let [r, g, b] = primitive.color;
    let color = Rgba([r, g, b, 255]);

    // 边框向内加粗
    for t in 0..self.stroke_width {
      let (left, top, right, bottom) = (x_min + t, y_min + t, x_max - t, y_max - t);
      if left >= right || top >= bottom {
        break;
      }
      let rect = Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    // 标签背景画在边框上方，超出图像时截断
    let text_width = (primitive.label.chars().count() as f32 * self.label_char_width).ceil() as i32;
    let label_x = x_min;
    let label_y = (y_min - self.label_text_height).max(0);
    let label_width = text_width.min(w - label_x);
    let label_height = self.label_text_height.min(h - label_y);

    if label_width > 0 && label_height > 0 {
      let rect = Rect::at(label_x, label_y).of_size(label_width as u32, label_height as u32);
      draw_filled_rect_mut(image, rect, color);

      if let Some(font) = &self.font {
        draw_text_mut(
          image,
          TEXT_COLOR,
          label_x,
          label_y + self.label_text_vertical_padding,
          PxScale::from(self.font_size),
          font,
          &primitive.label,
        );
      }
    }
  }
}
