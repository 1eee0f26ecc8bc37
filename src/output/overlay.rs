// 该文件是 Xunmu （寻目） 项目的一部分。
// src/output/overlay.rs - 叠加层绘制描述
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

use crate::model::DetectionSet;

/// 调色板大小（对应 COCO 数据集的 80 个类别）
pub const PALETTE_SIZE: usize = 80;

/// 与渲染目标无关的绘制图元。
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPrimitive {
  /// 原图像素坐标下的 `[x, y, width, height]`
  pub rect: [f32; 4],
  /// `"{类别} {置信度×100:.1}%"`
  pub label: String,
  /// 建议的描边/填充颜色
  pub color: [u8; 3],
}

/// 检测结果转换为绘制图元，纯函数，不做任何 I/O。
#[derive(Debug, Clone)]
pub struct OverlayBuilder {
  colors: Vec<[u8; 3]>,
}

impl Default for OverlayBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl OverlayBuilder {
  pub fn new() -> Self {
    // 色相均匀分布的 80 种颜色
    let colors = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();
    Self { colors }
  }

  pub fn color_of(&self, class_id: usize) -> [u8; 3] {
    self.colors[class_id % self.colors.len()]
  }

  pub fn build(&self, detections: &DetectionSet) -> Vec<DrawPrimitive> {
    detections
      .iter()
      .map(|detection| DrawPrimitive {
        rect: [
          detection.bbox[0],
          detection.bbox[1],
          detection.width(),
          detection.height(),
        ],
        label: format_label(&detection.label, detection.confidence),
        color: self.color_of(detection.class_id),
      })
      .collect()
  }
}

pub fn format_label(label: &str, confidence: f32) -> String {
  format!("{} {:.1}%", label, confidence * 100.0)
}

/// HSV 转 RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  [
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ]
}
