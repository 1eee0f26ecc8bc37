// 该文件是 Xunmu （寻目） 项目的一部分。
// src/frame.rs - 原始图像与 NCHW 输入张量定义
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

use image::RgbaImage;

use crate::error::DetectError;

pub const RGBA_CHANNELS: usize = 4;
pub const RGB_CHANNELS: usize = 3;

/// 解码后的原始图像，按行存储，每像素 4 个 8 位通道（RGBA）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl RasterImage {
  pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DetectError> {
    if width == 0 || height == 0 {
      return Err(DetectError::invalid_image(
        "image",
        width,
        height,
        "宽度和高度必须大于 0",
      ));
    }

    let expected = RGBA_CHANNELS * width as usize * height as usize;
    if data.len() != expected {
      return Err(DetectError::invalid_image(
        "image",
        width,
        height,
        format!("像素数据长度不匹配: 期望长度 {}, 实际长度 {}", expected, data.len()),
      ));
    }

    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  /// 用单一颜色填充的图像
  pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, DetectError> {
    let pixels = width as usize * height as usize;
    Self::new(width, height, rgba.repeat(pixels))
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn channels(&self) -> usize {
    RGBA_CHANNELS
  }

  pub fn as_raw(&self) -> &[u8] {
    &self.data
  }

  pub fn to_rgba_image(&self) -> RgbaImage {
    // new() 已保证长度为 width * height * 4，from_raw 不会返回 None
    RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
      .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
  }
}

impl TryFrom<RgbaImage> for RasterImage {
  type Error = DetectError;

  fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
    let (width, height) = image.dimensions();
    RasterImage::new(width, height, image.into_raw())
  }
}

/// 推理引擎输入张量，逻辑形状 `[1, 3, S, S]`，通道优先（R、G、B 平面依次排列），取值 `[0, 1]`。
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
  size: u32,
  data: Box<[f32]>,
}

impl InputTensor {
  pub(crate) fn from_planar(size: u32, data: Vec<f32>) -> Self {
    debug_assert_eq!(data.len(), RGB_CHANNELS * size as usize * size as usize);
    Self {
      size,
      data: data.into_boxed_slice(),
    }
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn shape(&self) -> [usize; 4] {
    [1, RGB_CHANNELS, self.size as usize, self.size as usize]
  }

  /// 单个通道平面（0 = R, 1 = G, 2 = B）
  pub fn plane(&self, channel: usize) -> &[f32] {
    let plane = self.size as usize * self.size as usize;
    &self.data[channel * plane..(channel + 1) * plane]
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn into_raw(self) -> Box<[f32]> {
    self.data
  }
}
