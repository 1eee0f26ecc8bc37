// 该文件是 Xunmu （寻目） 项目的一部分。
// src/postprocess/remap.rs - 检测框还原到原图像素坐标
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

use crate::{
  model::{Candidate, DetectionSet, Detection, LabelTable},
  preprocess::{LetterboxGeometry, LetterboxResult},
};

/// 减去填充再除以缩放系数，并裁剪到 `[0, W] × [0, H]`。
pub fn remap_box(bbox: &[f32; 4], geometry: &LetterboxGeometry) -> [f32; 4] {
  let pad_x = geometry.pad_x as f32;
  let pad_y = geometry.pad_y as f32;
  let max_x = geometry.source_width as f32;
  let max_y = geometry.source_height as f32;

  let x1 = ((bbox[0] - pad_x) / geometry.scale).clamp(0.0, max_x);
  let y1 = ((bbox[1] - pad_y) / geometry.scale).clamp(0.0, max_y);
  let x2 = ((bbox[2] - pad_x) / geometry.scale).clamp(0.0, max_x);
  let y2 = ((bbox[3] - pad_y) / geometry.scale).clamp(0.0, max_y);

  [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)]
}

/// NMS 后的候选框转换为检测结果，保持输入顺序。
pub fn remap_candidates(
  candidates: Vec<Candidate>,
  letterboxed: &LetterboxResult,
  labels: &LabelTable,
) -> DetectionSet {
  let geometry = letterboxed.geometry();
  candidates
    .into_iter()
    .map(|candidate| Detection {
      bbox: remap_box(&candidate.bbox, geometry),
      class_id: candidate.class_id,
      label: labels.name(candidate.class_id).into_owned(),
      confidence: candidate.confidence,
    })
    .collect::<Vec<_>>()
    .into()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn full_square_maps_to_full_image() {
    for &(w, h) in &[(1280, 720), (720, 1280), (640, 640), (333, 777), (1, 1000), (1919, 1081)] {
      for size in [320, 416, 640] {
        let geometry = LetterboxGeometry::compute(w, h, size).unwrap();
        let s = size as f32;
        let [x1, y1, x2, y2] = remap_box(&[0.0, 0.0, s, s], &geometry);
        assert_eq!((x1, y1), (0.0, 0.0));
        assert!((x2 - w as f32).abs() <= 1.0, "{}x{}@{}: x2={}", w, h, size, x2);
        assert!((y2 - h as f32).abs() <= 1.0, "{}x{}@{}: y2={}", w, h, size, y2);
      }
    }
  }

  #[test]
  fn content_box_inverts_padding_and_scale() {
    let geometry = LetterboxGeometry::compute(1280, 720, 640).unwrap();
    let bbox = remap_box(&[100.0, 240.0, 300.0, 340.0], &geometry);
    assert_eq!(bbox, [200.0, 200.0, 600.0, 400.0]);
  }

  #[test]
  fn out_of_bounds_coordinates_are_clamped() {
    let geometry = LetterboxGeometry::compute(1280, 720, 640).unwrap();
    let [x1, y1, x2, y2] = remap_box(&[-50.0, 0.0, 700.0, 639.0], &geometry);
    assert_eq!((x1, y1), (0.0, 0.0));
    assert_eq!((x2, y2), (1280.0, 720.0));
  }

  #[test]
  fn inverted_corners_are_reordered() {
    let geometry = LetterboxGeometry::compute(100, 100, 100).unwrap();
    assert_eq!(remap_box(&[30.0, 40.0, 10.0, 20.0], &geometry), [10.0, 20.0, 30.0, 40.0]);
  }
}
