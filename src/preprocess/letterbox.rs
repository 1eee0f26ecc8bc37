// 该文件是 Xunmu （寻目） 项目的一部分。
// src/preprocess/letterbox.rs - 等比缩放并居中填充到正方形画布
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

use image::{
  ImageBuffer, Rgba, RgbaImage,
  imageops::{self, FilterType},
};
use tracing::debug;

use crate::{error::DetectError, frame::RasterImage};

/// 填充颜色（中灰）
pub const PAD_COLOR: [u8; 4] = [114, 114, 114, 255];

/// 缩放填充的几何参数，用于把检测框映射回原图坐标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxGeometry {
  /// 正方形画布边长 S
  pub input_size: u32,
  /// 统一缩放系数
  pub scale: f32,
  pub pad_x: u32,
  pub pad_y: u32,
  pub resized_width: u32,
  pub resized_height: u32,
  pub source_width: u32,
  pub source_height: u32,
}

impl LetterboxGeometry {
  pub fn compute(source_width: u32, source_height: u32, input_size: u32) -> Result<Self, DetectError> {
    if source_width == 0 || source_height == 0 {
      return Err(DetectError::invalid_image(
        "letterbox",
        source_width,
        source_height,
        "宽度和高度必须大于 0",
      ));
    }
    if input_size == 0 {
      return Err(DetectError::invalid_image(
        "letterbox",
        source_width,
        source_height,
        "目标边长必须大于 0",
      ));
    }

    let side = input_size as f32;
    let scale = (side / source_width as f32).min(side / source_height as f32);

    // 较长的一边恰好填满 S
    let resized_width = ((source_width as f32 * scale).round() as u32).clamp(1, input_size);
    let resized_height = ((source_height as f32 * scale).round() as u32).clamp(1, input_size);

    Ok(Self {
      input_size,
      scale,
      pad_x: (input_size - resized_width) / 2,
      pad_y: (input_size - resized_height) / 2,
      resized_width,
      resized_height,
      source_width,
      source_height,
    })
  }
}

/// 缩放填充结果：S×S 画布加上几何参数。
///
/// 每次检测请求各自持有一个实例，坐标还原必须使用产生该坐标空间的同一个实例。
#[derive(Debug, Clone)]
pub struct LetterboxResult {
  canvas: RgbaImage,
  geometry: LetterboxGeometry,
}

impl LetterboxResult {
  pub fn canvas(&self) -> &RgbaImage {
    &self.canvas
  }

  pub fn geometry(&self) -> &LetterboxGeometry {
    &self.geometry
  }

  pub fn input_size(&self) -> u32 {
    self.geometry.input_size
  }

  pub fn scale(&self) -> f32 {
    self.geometry.scale
  }

  pub fn pad_x(&self) -> u32 {
    self.geometry.pad_x
  }

  pub fn pad_y(&self) -> u32 {
    self.geometry.pad_y
  }

  /// 画布空间的角点框映射回原图像素坐标
  pub fn remap_box(&self, bbox: &[f32; 4]) -> [f32; 4] {
    crate::postprocess::remap_box(bbox, &self.geometry)
  }
}

/// 将图像等比缩放（双线性）后居中放入 `input_size`×`input_size` 的灰色画布。
pub fn letterbox(image: &RasterImage, input_size: u32) -> Result<LetterboxResult, DetectError> {
  let geometry = LetterboxGeometry::compute(image.width(), image.height(), input_size)?;

  let source = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(image.width(), image.height(), image.as_raw())
    .ok_or_else(|| {
      DetectError::invalid_image("letterbox", image.width(), image.height(), "像素缓冲区长度不足")
    })?;

  let mut canvas = RgbaImage::from_pixel(input_size, input_size, Rgba(PAD_COLOR));
  let (x, y) = (geometry.pad_x as i64, geometry.pad_y as i64);

  if (geometry.resized_width, geometry.resized_height) == (image.width(), image.height()) {
    imageops::replace(&mut canvas, &source, x, y);
  } else {
    let resized = imageops::resize(
      &source,
      geometry.resized_width,
      geometry.resized_height,
      FilterType::Triangle,
    );
    imageops::replace(&mut canvas, &resized, x, y);
  }

  debug!(
    "缩放填充: {}x{} -> {}x{} (scale={:.4}, pad=({}, {}), S={})",
    image.width(),
    image.height(),
    geometry.resized_width,
    geometry.resized_height,
    geometry.scale,
    geometry.pad_x,
    geometry.pad_y,
    input_size
  );

  Ok(LetterboxResult { canvas, geometry })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn landscape_hd_frame_geometry() {
    let g = LetterboxGeometry::compute(1280, 720, 640).unwrap();
    assert_eq!(g.scale, 0.5);
    assert_eq!((g.resized_width, g.resized_height), (640, 360));
    assert_eq!((g.pad_x, g.pad_y), (0, 140));
  }

  #[test]
  fn one_side_is_always_tight() {
    for &(w, h) in &[(1, 1), (3, 1000), (1000, 3), (641, 479), (333, 777), (640, 640), (17, 16)] {
      let g = LetterboxGeometry::compute(w, h, 640).unwrap();
      assert!(g.resized_width == 640 || g.resized_height == 640, "{}x{}", w, h);
      let slack_x = 640 - g.resized_width - 2 * g.pad_x;
      let slack_y = 640 - g.resized_height - 2 * g.pad_y;
      assert!(slack_x <= 1 && slack_y <= 1);
    }
  }

  #[test]
  fn zero_sized_source_is_rejected() {
    assert!(matches!(
      LetterboxGeometry::compute(0, 5, 640),
      Err(DetectError::InvalidImage { .. })
    ));
  }

  #[test]
  fn canvas_is_padded_with_gray() {
    let image = RasterImage::filled(40, 20, [255, 0, 0, 255]).unwrap();
    let result = letterbox(&image, 32).unwrap();
    let canvas = result.canvas();
    assert_eq!(canvas.dimensions(), (32, 32));
    assert_eq!((result.pad_x(), result.pad_y()), (0, 8));
    // 填充区
    assert_eq!(canvas.get_pixel(16, 0).0, PAD_COLOR);
    assert_eq!(canvas.get_pixel(16, 31).0, PAD_COLOR);
    // 内容区
    assert_eq!(canvas.get_pixel(16, 16).0, [255, 0, 0, 255]);
  }

  #[test]
  fn same_size_input_is_copied() {
    let image = RasterImage::filled(8, 8, [1, 2, 3, 255]).unwrap();
    let result = letterbox(&image, 8).unwrap();
    assert_eq!(result.scale(), 1.0);
    assert!(result.canvas().pixels().all(|p| p.0 == [1, 2, 3, 255]));
  }

  #[test]
  fn padded_square_remaps_to_source_bounds() {
    let image = RasterImage::filled(40, 20, [0, 0, 0, 255]).unwrap();
    let result = letterbox(&image, 32).unwrap();
    assert_eq!(result.remap_box(&[0.0, 0.0, 32.0, 32.0]), [0.0, 0.0, 40.0, 20.0]);
  }
}
