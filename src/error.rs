// 该文件是 Xunmu （寻目） 项目的一部分。
// src/error.rs - 检测流水线错误定义
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

use std::{error::Error as StdError, fmt::Display};

use thiserror::Error;

/// 检测流水线的错误。
///
/// 每个变体都记录出错的阶段名称，任一阶段失败都会终止本次请求，不会返回部分结果。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
  #[error("[{stage}] 图像无效 ({width}x{height}): {reason}")]
  InvalidImage {
    stage: &'static str,
    width: u32,
    height: u32,
    reason: String,
  },
  #[error("[{stage}] 推理引擎调用失败: {reason}")]
  EngineInvocationFailure { stage: &'static str, reason: String },
  #[error("[{stage}] 张量形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
  ShapeMismatch {
    stage: &'static str,
    expected: Vec<usize>,
    got: Vec<usize>,
  },
}

impl DetectError {
  pub fn invalid_image(stage: &'static str, width: u32, height: u32, reason: impl Into<String>) -> Self {
    DetectError::InvalidImage {
      stage,
      width,
      height,
      reason: reason.into(),
    }
  }

  pub fn engine(stage: &'static str, reason: impl Display) -> Self {
    DetectError::EngineInvocationFailure {
      stage,
      reason: reason.to_string(),
    }
  }

  /// 包装推理引擎返回的错误；本身已是 `DetectError` 时原样返回
  pub fn from_engine_error<E>(stage: &'static str, err: E) -> Self
  where
    E: StdError + Send + Sync + 'static,
  {
    let err: Box<dyn StdError + Send + Sync> = Box::new(err);
    match err.downcast::<DetectError>() {
      Ok(detect) => *detect,
      Err(other) => DetectError::engine(stage, other),
    }
  }

  pub fn stage(&self) -> &'static str {
    match self {
      DetectError::InvalidImage { stage, .. }
      | DetectError::EngineInvocationFailure { stage, .. }
      | DetectError::ShapeMismatch { stage, .. } => stage,
    }
  }
}
