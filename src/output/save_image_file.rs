// 该文件是 Xunmu （寻目） 项目的一部分。
// src/output/save_image_file.rs - 保存带标注的图像文件
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

use std::path::Path;

use ab_glyph::FontArc;
use image::DynamicImage;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RasterImage,
  model::DetectionSet,
  output::{Render, draw::Draw},
};

pub struct SaveImageFileOutput {
  path: String,
  draw: Draw,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("字体无效: {0}")]
  FontError(ab_glyph::InvalidFont),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  /// `image:///path/to/out.jpg[?font=/path/to/font.ttf]`
  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut draw = Draw::default();
    if let Some((_, font_path)) = uri.query_pairs().find(|(key, _)| key == "font") {
      let data = std::fs::read(&*font_path).map_err(SaveImageFileError::IoError)?;
      let font = FontArc::try_from_vec(data).map_err(SaveImageFileError::FontError)?;
      info!("加载标签字体: {}", font_path);
      draw = draw.with_font(font);
    } else {
      warn!("未指定字体, 标签只绘制背景");
    }

    Ok(SaveImageFileOutput {
      path: uri.path().to_string(),
      draw,
    })
  }
}

impl SaveImageFileOutput {
  pub fn path(&self) -> &str {
    &self.path
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    info!("保存图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<RasterImage, DetectionSet> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &RasterImage, result: &DetectionSet) -> Result<(), Self::Error> {
    let canvas = self.draw.draw_detections(frame, result);
    // JPEG 不支持 alpha 通道
    let image = DynamicImage::ImageRgba8(canvas).to_rgb8();
    self.save_image(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Detection;

  #[test]
  fn saves_annotated_png() {
    let dir = std::env::temp_dir().join(format!("xunmu-save-{}", std::process::id()));
    let path = dir.join("nested").join("out.png");
    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();

    let frame = RasterImage::filled(64, 48, [0, 0, 0, 255]).unwrap();
    let result = DetectionSet::from(vec![Detection {
      bbox: [4.0, 30.0, 40.0, 44.0],
      class_id: 2,
      label: "car".to_string(),
      confidence: 0.9,
    }]);
    output.render_result(&frame, &result).unwrap();

    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (64, 48));
    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn missing_font_file_is_io_error() {
    let url = Url::parse("image:///tmp/out.png?font=/nonexistent/font.ttf").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::IoError(_))
    ));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("json:///tmp/out.json").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));
  }
}
