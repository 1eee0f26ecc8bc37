// 该文件是 Xunmu （寻目） 项目的一部分。
// src/model.rs - 模型、推理引擎与检测结果
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

use crate::{error::DetectError, frame::InputTensor};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 推理引擎的输入输出契约。
///
/// 输入为 `[1, 3, S, S]` 的 f32 张量；输出为一个或多个张量，流水线只读取第一个，
/// 其逻辑形状应为 `[1, N, 5 + C]`。引擎内部如何执行与本库无关。
pub trait InferenceEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn run(&self, input: &InputTensor) -> Result<Vec<RawOutputTensor>, Self::Error>;
}

/// 推理引擎的原始输出，只读。
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutputTensor {
  shape: Vec<usize>,
  data: Box<[f32]>,
}

impl RawOutputTensor {
  pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, DetectError> {
    let expected: usize = shape.iter().product();
    if expected != data.len() {
      return Err(DetectError::engine(
        "output",
        format!("形状 {:?} 需要 {} 个元素, 实际 {} 个", shape, expected, data.len()),
      ));
    }
    Ok(Self {
      shape,
      data: data.into_boxed_slice(),
    })
  }

  pub fn shape(&self) -> &[usize] {
    &self.shape
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

/// 解码后的候选框，坐标仍位于缩放填充后的正方形空间。
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
  pub objectness: f32,
  pub class_id: usize,
  pub class_score: f32,
  /// objectness × class_score
  pub confidence: f32,
}

/// 原图像素坐标下的检测结果。
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
  pub class_id: usize,
  pub label: String,
  pub confidence: f32,
}

impl Detection {
  pub fn width(&self) -> f32 {
    self.bbox[2] - self.bbox[0]
  }

  pub fn height(&self) -> f32 {
    self.bbox[3] - self.bbox[1]
  }
}

/// NMS 之后保留的检测结果，按置信度降序排列。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSet {
  pub items: Box<[Detection]>,
}

impl DetectionSet {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }
}

impl From<Vec<Detection>> for DetectionSet {
  fn from(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

mod coco;
pub mod engine;
mod labels;
#[cfg(feature = "replay_engine")]
mod replay;

pub use self::coco::COCO_CLASSES;
pub use self::engine::{EngineHandle, EngineSlot};
pub use self::labels::LabelTable;
#[cfg(feature = "replay_engine")]
pub use self::replay::{ReplayEngine, ReplayEngineBuilder, ReplayEngineError};
