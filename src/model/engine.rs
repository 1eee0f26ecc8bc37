// 该文件是 Xunmu （寻目） 项目的一部分。
// src/model/engine.rs - 推理引擎句柄与一次性初始化
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

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, info};

use super::{InferenceEngine, RawOutputTensor};
use crate::{error::DetectError, frame::InputTensor};

/// 共享的推理引擎句柄。
///
/// 克隆句柄共享同一个引擎；调用 `run` 时持锁，多个请求的推理调用被串行化，
/// 而预处理和后处理不经过这把锁。
pub struct EngineHandle<E> {
  engine: Arc<Mutex<E>>,
}

impl<E> Clone for EngineHandle<E> {
  fn clone(&self) -> Self {
    Self {
      engine: Arc::clone(&self.engine),
    }
  }
}

impl<E> EngineHandle<E> {
  pub fn new(engine: E) -> Self {
    Self {
      engine: Arc::new(Mutex::new(engine)),
    }
  }
}

impl<E: InferenceEngine> InferenceEngine for EngineHandle<E> {
  type Error = DetectError;

  fn run(&self, input: &InputTensor) -> Result<Vec<RawOutputTensor>, Self::Error> {
    let engine = self
      .engine
      .lock()
      .map_err(|_| DetectError::engine("inference", "引擎锁已中毒"))?;
    engine.run(input).map_err(|e| DetectError::from_engine_error("inference", e))
  }
}

/// 引擎的“初始化一次、复用至销毁”状态，由调用方持有并显式传入流水线。
///
/// 并发调用 `get_or_try_init` 时只有一个初始化闭包会执行；初始化失败不会留下状态，
/// 下次调用会重试。
pub struct EngineSlot<E> {
  cell: OnceLock<EngineHandle<E>>,
  init: Mutex<()>,
}

impl<E> Default for EngineSlot<E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<E> EngineSlot<E> {
  pub const fn new() -> Self {
    Self {
      cell: OnceLock::new(),
      init: Mutex::new(()),
    }
  }

  pub fn get(&self) -> Option<EngineHandle<E>> {
    self.cell.get().cloned()
  }

  pub fn get_or_try_init<F, Err>(&self, init: F) -> Result<EngineHandle<E>, Err>
  where
    F: FnOnce() -> Result<E, Err>,
  {
    if let Some(handle) = self.cell.get() {
      return Ok(handle.clone());
    }

    let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = self.cell.get() {
      debug!("引擎已由其他调用方初始化");
      return Ok(handle.clone());
    }

    info!("初始化推理引擎");
    let handle = EngineHandle::new(init()?);
    Ok(self.cell.get_or_init(|| handle).clone())
  }

  /// 销毁引擎，返回之前的句柄（若存在）
  pub fn teardown(&mut self) -> Option<EngineHandle<E>> {
    info!("销毁推理引擎");
    self.cell.take()
  }
}
