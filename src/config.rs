// 该文件是 Xunmu （寻目） 项目的一部分。
// src/config.rs - 检测参数配置
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

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{model::LabelTable, postprocess::NmsMode};

pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.35;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("输入尺寸必须大于 0")]
  InvalidInputSize,
  #[error("{name} 必须位于 [0, 1] 区间, 实际为 {value}")]
  ThresholdOutOfRange { name: &'static str, value: f32 },
  #[error("类别标签表为空")]
  EmptyLabels,
  #[error("无法读取标签文件 {path:?}: {source}")]
  LabelFile {
    path: PathBuf,
    source: std::io::Error,
  },
}

/// 检测参数
#[derive(Debug, Clone)]
pub struct DetectConfig {
  /// 模型输入边长 S
  pub input_size: u32,
  /// 置信度阈值，置信度等于阈值的候选框保留
  pub confidence_threshold: f32,
  /// NMS IoU 阈值
  pub iou_threshold: f32,
  pub class_labels: LabelTable,
  pub nms_mode: NmsMode,
}

impl Default for DetectConfig {
  fn default() -> Self {
    Self {
      input_size: DEFAULT_INPUT_SIZE,
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      class_labels: LabelTable::coco(),
      nms_mode: NmsMode::default(),
    }
  }
}

impl DetectConfig {
  pub fn with_input_size(mut self, input_size: u32) -> Self {
    self.input_size = input_size;
    self
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn with_class_labels(mut self, labels: LabelTable) -> Self {
    self.class_labels = labels;
    self
  }

  pub fn with_label_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let labels = LabelTable::from_file(path).map_err(|source| ConfigError::LabelFile {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(self.with_class_labels(labels))
  }

  pub fn with_nms_mode(mut self, mode: NmsMode) -> Self {
    self.nms_mode = mode;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.input_size == 0 {
      return Err(ConfigError::InvalidInputSize);
    }
    for (name, value) in [
      ("confidence_threshold", self.confidence_threshold),
      ("iou_threshold", self.iou_threshold),
    ] {
      if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { name, value });
      }
    }
    if self.class_labels.is_empty() {
      return Err(ConfigError::EmptyLabels);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    let config = DetectConfig::default();
    assert_eq!(config.input_size, 640);
    assert_eq!(config.confidence_threshold, 0.35);
    assert_eq!(config.iou_threshold, 0.45);
    assert_eq!(config.nms_mode, NmsMode::ClassAgnostic);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn rejects_out_of_range_threshold() {
    let config = DetectConfig::default().with_iou_threshold(1.5);
    assert!(matches!(
      config.validate(),
      Err(ConfigError::ThresholdOutOfRange { name: "iou_threshold", .. })
    ));
    let config = DetectConfig::default().with_confidence_threshold(f32::NAN);
    assert!(config.validate().is_err());
  }

  #[test]
  fn rejects_empty_labels_and_zero_size() {
    let config = DetectConfig::default().with_class_labels(LabelTable::new(Vec::<String>::new()));
    assert!(matches!(config.validate(), Err(ConfigError::EmptyLabels)));
    let config = DetectConfig::default().with_input_size(0);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidInputSize)));
  }

  #[test]
  fn missing_label_file_is_reported() {
    let err = DetectConfig::default()
      .with_label_file("/nonexistent/labels.txt")
      .unwrap_err();
    assert!(matches!(err, ConfigError::LabelFile { .. }));
  }
}
