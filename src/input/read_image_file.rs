// 该文件是 Xunmu （寻目） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, error::DetectError, frame::RasterImage};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配")]
  SchemaMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("{0}")]
  InvalidImage(#[from] DetectError),
}

/// 只产出一帧的图像输入。
pub struct ImageFileInput {
  image: Option<RasterImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url.path();
    let image = ImageReader::open(path)?
      .with_guessed_format()?
      .decode()?
      .to_rgba8();
    info!("读取图像 {}: {}x{}", path, image.width(), image.height());

    Ok(ImageFileInput {
      image: Some(RasterImage::try_from(image)?),
    })
  }
}

impl ImageFileInput {
  /// 解码内存中的已编码图像（PNG、JPEG 等）。
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageFileInputError> {
    let image = image::load_from_memory(bytes)
      .map_err(|e| {
        ImageFileInputError::InvalidImage(DetectError::invalid_image("decode", 0, 0, e.to_string()))
      })?
      .to_rgba8();
    Ok(ImageFileInput {
      image: Some(RasterImage::try_from(image)?),
    })
  }

  pub fn into_image(self) -> Option<RasterImage> {
    self.image
  }
}

impl Iterator for ImageFileInput {
  type Item = RasterImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use image::{ImageFormat, Rgba, RgbaImage};

  use super::*;

  fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
    let mut bytes = Vec::new();
    image
      .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
      .unwrap();
    bytes
  }

  #[test]
  fn decodes_png_bytes_once() {
    let mut input = ImageFileInput::from_bytes(&png_bytes(6, 4)).unwrap();
    let frame = input.next().unwrap();
    assert_eq!((frame.width(), frame.height()), (6, 4));
    assert_eq!(&frame.as_raw()[..4], &[10, 20, 30, 255]);
    assert!(input.next().is_none());
  }

  #[test]
  fn garbage_bytes_are_invalid_image() {
    let err = ImageFileInput::from_bytes(b"not an image").err().unwrap();
    assert!(matches!(
      err,
      ImageFileInputError::InvalidImage(DetectError::InvalidImage { stage: "decode", .. })
    ));
  }

  #[test]
  fn reads_file_from_url() {
    let path = std::env::temp_dir().join(format!("xunmu-input-{}.png", std::process::id()));
    std::fs::write(&path, png_bytes(3, 5)).unwrap();
    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&format!("image://{}", url.path())).unwrap();

    let image = ImageFileInput::from_url(&url).unwrap().into_image().unwrap();
    assert_eq!((image.width(), image.height()), (3, 5));
    std::fs::remove_file(&path).unwrap();
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("video:///tmp/a.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }
}
