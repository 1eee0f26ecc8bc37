// 该文件是 Xunmu （寻目） 项目的一部分。
// src/detector.rs - 单图目标检测流水线
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

use std::time::Instant;

use tracing::{debug, info};

use crate::{
  config::{ConfigError, DetectConfig},
  error::DetectError,
  frame::{InputTensor, RasterImage},
  model::{DetectionSet, InferenceEngine, Model, RawOutputTensor},
  postprocess::{decode, non_max_suppression, remap_candidates},
  preprocess::{LetterboxResult, letterbox, pack_tensor},
};

/// 检测器：缩放填充 → 打包 → 推理 → 解码 → NMS → 坐标还原。
///
/// 除推理调用外各阶段都是纯函数，每次请求拥有自己的中间结果；需要自行调度阶段的调用方
/// 可以直接使用 `preprocess`、`invoke` 和 `postprocess`。
pub struct Detector<E> {
  engine: E,
  config: DetectConfig,
}

impl<E: InferenceEngine> Detector<E> {
  pub fn new(engine: E, config: DetectConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    info!(
      "检测器配置: S={}, 置信度阈值={}, IoU 阈值={}, 类别数={}, NMS={:?}",
      config.input_size,
      config.confidence_threshold,
      config.iou_threshold,
      config.class_labels.len(),
      config.nms_mode
    );
    Ok(Self { engine, config })
  }

  pub fn config(&self) -> &DetectConfig {
    &self.config
  }

  pub fn engine(&self) -> &E {
    &self.engine
  }

  pub fn preprocess(
    &self,
    image: &RasterImage,
  ) -> Result<(LetterboxResult, InputTensor), DetectError> {
    let letterboxed = letterbox(image, self.config.input_size)?;
    let tensor = pack_tensor(&letterboxed);
    Ok((letterboxed, tensor))
  }

  /// 调用推理引擎并取第一个输出
  pub fn invoke(&self, tensor: &InputTensor) -> Result<RawOutputTensor, DetectError> {
    let outputs = self
      .engine
      .run(tensor)
      .map_err(|e| DetectError::from_engine_error("inference", e))?;
    debug!("推理引擎返回 {} 个输出", outputs.len());
    outputs
      .into_iter()
      .next()
      .ok_or_else(|| DetectError::engine("inference", "推理引擎没有返回任何输出"))
  }

  pub fn postprocess(
    &self,
    output: &RawOutputTensor,
    letterboxed: &LetterboxResult,
  ) -> Result<DetectionSet, DetectError> {
    let labels = &self.config.class_labels;
    let candidates = decode(output, labels.len(), self.config.confidence_threshold)?;
    let kept = non_max_suppression(candidates, self.config.iou_threshold, self.config.nms_mode);
    Ok(remap_candidates(kept, letterboxed, labels))
  }

  pub fn detect(&self, image: &RasterImage) -> Result<DetectionSet, DetectError> {
    let now = Instant::now();
    let (letterboxed, tensor) = self.preprocess(image)?;
    let preprocess_elapsed = now.elapsed();

    let now = Instant::now();
    let output = self.invoke(&tensor)?;
    let inference_elapsed = now.elapsed();

    let now = Instant::now();
    let result = self.postprocess(&output, &letterboxed)?;
    let postprocess_elapsed = now.elapsed();

    info!(
      "检测完成: {} 个目标, 预处理 {:.2?}, 推理 {:.2?}, 后处理 {:.2?}",
      result.len(),
      preprocess_elapsed,
      inference_elapsed,
      postprocess_elapsed
    );
    Ok(result)
  }
}

impl<E: InferenceEngine> Model for Detector<E> {
  type Input = RasterImage;
  type Output = DetectionSet;
  type Error = DetectError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.detect(input)
  }
}
