// 该文件是 Xunmu （寻目） 项目的一部分。
// src/preprocess/pack.rs - 画布打包为 NCHW 浮点张量
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

use tracing::debug;

use super::LetterboxResult;
use crate::frame::{InputTensor, RGB_CHANNELS};

/// 依次写入 R、G、B 三个平面，每个平面按行排列，值除以 255 归一化，丢弃 alpha。
///
/// 平面顺序与推理引擎声明的输入形状 `[1, 3, S, S]` 严格对应。
pub fn pack_tensor(letterboxed: &LetterboxResult) -> InputTensor {
  let canvas = letterboxed.canvas();
  let size = letterboxed.input_size();
  let side = size as usize;
  let plane = side * side;

  let mut data = vec![0.0f32; RGB_CHANNELS * plane];
  for c in 0..RGB_CHANNELS {
    for h in 0..side {
      for w in 0..side {
        let pixel = canvas.get_pixel(w as u32, h as u32);
        data[c * plane + h * side + w] = pixel[c] as f32 / 255.0;
      }
    }
  }

  debug!("输入张量: [1, {}, {}, {}], 长度 {}", RGB_CHANNELS, side, side, data.len());
  InputTensor::from_planar(size, data)
}
