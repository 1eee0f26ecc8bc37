// 该文件是 Xunmu （寻目） 项目的一部分。
// src/task.rs - 单次检测任务
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

use tracing::info;

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 从输入取一帧，推理一次，交给输出渲染，并返回检测结果。
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Output = D;
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = Instant::now();
    let result = model.infer(&frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());
    let now = Instant::now();
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("负数")]
  struct Negative;

  struct Double;

  impl Model for Double {
    type Input = i32;
    type Output = i32;
    type Error = Negative;

    fn infer(&self, input: &i32) -> Result<i32, Negative> {
      if *input < 0 { Err(Negative) } else { Ok(input * 2) }
    }
  }

  #[derive(Default)]
  struct Collect(RefCell<Vec<(i32, i32)>>);

  impl Render<i32, i32> for &Collect {
    type Error = Negative;

    fn render_result(&self, frame: &i32, result: &i32) -> Result<(), Negative> {
      self.0.borrow_mut().push((*frame, *result));
      Ok(())
    }
  }

  #[test]
  fn renders_first_frame_and_returns_result() {
    let sink = Collect::default();
    let result = OneShotTask.run_task([3, 4].into_iter(), Double, &sink).unwrap();
    assert_eq!(result, 6);
    assert_eq!(*sink.0.borrow(), vec![(3, 6)]);
  }

  #[test]
  fn empty_input_fails() {
    let sink = Collect::default();
    assert!(OneShotTask.run_task(std::iter::empty::<i32>(), Double, &sink).is_err());
  }

  #[test]
  fn model_error_skips_rendering() {
    let sink = Collect::default();
    assert!(OneShotTask.run_task([-1].into_iter(), Double, &sink).is_err());
    assert!(sink.0.borrow().is_empty());
  }
}
