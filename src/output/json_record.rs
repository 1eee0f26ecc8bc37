// 该文件是 Xunmu （寻目） 项目的一部分。
// src/output/json_record.rs - 检测结果 JSON 记录
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

use std::{
  fs::File,
  io::BufWriter,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RasterImage,
  model::{Detection, DetectionSet},
  output::Render,
};

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 单个检测框，整数像素角点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
  pub x1: i64,
  pub y1: i64,
  pub x2: i64,
  pub y2: i64,
  pub label: String,
  /// 保留 6 位小数
  pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
  pub boxes: Vec<BoxRecord>,
  pub width: u32,
  pub height: u32,
}

impl BoxRecord {
  fn from_detection(detection: &Detection, width: u32, height: u32) -> Self {
    // 四舍六入五成双
    let round = |v: f32| v.round_ties_even() as i64;
    let [x1, y1, x2, y2] = detection.bbox;
    Self {
      x1: round(x1).max(0),
      y1: round(y1).max(0),
      x2: round(x2).min(width as i64),
      y2: round(y2).min(height as i64),
      label: detection.label.clone(),
      score: (detection.confidence as f64 * 1e6).round_ties_even() / 1e6,
    }
  }
}

pub fn to_record(width: u32, height: u32, detections: &DetectionSet) -> DetectionRecord {
  DetectionRecord {
    boxes: detections
      .iter()
      .map(|d| BoxRecord::from_detection(d, width, height))
      .collect(),
    width,
    height,
  }
}

/// 把检测结果写为 JSON 文件：`json:///path/to/result.json`
pub struct JsonRecordOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonRecordOutputError::SchemeMismatch(format!(
        "期望记录方式 '{}', 实际记录方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(JsonRecordOutput {
      path: PathBuf::from(url.path()),
    })
  }
}

impl JsonRecordOutput {
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Render<RasterImage, DetectionSet> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn render_result(&self, frame: &RasterImage, result: &DetectionSet) -> Result<(), Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let record = to_record(frame.width(), frame.height(), result);
    let writer = BufWriter::new(File::create(&self.path)?);
    serde_json::to_writer_pretty(writer, &record)?;

    info!("写入 {} 个检测框到 {}", record.boxes.len(), self.path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn detection(bbox: [f32; 4], label: &str, confidence: f32) -> Detection {
    Detection {
      bbox,
      class_id: 0,
      label: label.to_string(),
      confidence,
    }
  }

  #[test]
  fn corners_are_rounded_and_clamped() {
    let set = DetectionSet::from(vec![detection([-0.4, 10.6, 99.7, 48.2], "car", 0.87654321)]);
    let record = to_record(100, 48, &set);
    assert_eq!((record.width, record.height), (100, 48));
    let b = &record.boxes[0];
    assert_eq!((b.x1, b.y1, b.x2, b.y2), (0, 11, 100, 48));
    assert_eq!(b.label, "car");
    assert!((b.score - 0.876543).abs() < 1e-9);
  }

  #[test]
  fn half_pixels_round_to_even() {
    let set = DetectionSet::from(vec![detection([2.5, 3.5, 10.5, 11.5], "dog", 0.5)]);
    let b = &to_record(640, 480, &set).boxes[0];
    assert_eq!((b.x1, b.y1, b.x2, b.y2), (2, 4, 10, 12));
  }

  #[test]
  fn writes_record_file() {
    let path = std::env::temp_dir().join(format!("xunmu-record-{}.json", std::process::id()));
    let url = Url::parse(&format!("json://{}", path.display())).unwrap();
    let output = JsonRecordOutput::from_url(&url).unwrap();

    let frame = RasterImage::filled(32, 16, [0, 0, 0, 255]).unwrap();
    output.render_result(&frame, &DetectionSet::default()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["width"], 32);
    assert_eq!(value["height"], 16);
    assert_eq!(value["boxes"].as_array().map(Vec::len), Some(0));
    std::fs::remove_file(&path).unwrap();
  }
}
