// 该文件是 Xunmu （寻目） 项目的一部分。
// src/postprocess/decode.rs - 原始输出解码为候选框
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

use tracing::{debug, error};

use crate::{
  error::DetectError,
  model::{Candidate, RawOutputTensor},
};

/// 每行前 5 个值: cx, cy, w, h, objectness
pub const BOX_FIELDS: usize = 5;

/// 解码 `[1, N, 5 + C]` 输出。
///
/// 每行取分数最高的类别（并列时取索引较小者），置信度为 `objectness × 类别分数`，
/// 置信度低于阈值的行被丢弃，等于阈值的行保留。框由中心点加宽高转换为角点形式，
/// 仍位于缩放填充后的正方形空间。
pub fn decode(
  output: &RawOutputTensor,
  class_count: usize,
  confidence_threshold: f32,
) -> Result<Vec<Candidate>, DetectError> {
  let shape = output.shape();
  if shape.len() != 3 || shape[0] != 1 {
    error!("输出形状应为 [1, N, K], 实际为 {:?}", shape);
    return Err(DetectError::engine(
      "decode",
      format!("输出形状应为 [1, N, K], 实际为 {:?}", shape),
    ));
  }

  let (rows, row_len) = (shape[1], shape[2]);
  let expected = BOX_FIELDS + class_count;
  if row_len != expected {
    error!("每行长度应为 {}, 实际为 {}", expected, row_len);
    return Err(DetectError::ShapeMismatch {
      stage: "decode",
      expected: vec![1, rows, expected],
      got: shape.to_vec(),
    });
  }

  let mut candidates = Vec::new();
  for row in output.as_slice().chunks_exact(row_len) {
    let Some((class_id, class_score)) = best_class(&row[BOX_FIELDS..]) else {
      continue;
    };

    let objectness = row[4];
    let confidence = objectness * class_score;
    // NaN 也会被丢弃
    if !(confidence >= confidence_threshold) {
      continue;
    }

    let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
    // NaN 或无穷大的框无法裁剪，也无法参与 NMS
    if ![cx, cy, w, h].iter().all(|v| v.is_finite()) {
      continue;
    }
    candidates.push(Candidate {
      bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
      objectness,
      class_id,
      class_score,
      confidence,
    });
  }

  debug!("解码 {} 行, 保留 {} 个候选框", rows, candidates.len());
  Ok(candidates)
}

fn best_class(scores: &[f32]) -> Option<(usize, f32)> {
  let mut best: Option<(usize, f32)> = None;
  for (class_id, &score) in scores.iter().enumerate() {
    match best {
      Some((_, best_score)) if best_score >= score => {}
      _ => best = Some((class_id, score)),
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tensor(rows: &[&[f32]]) -> RawOutputTensor {
    let k = rows.first().map(|r| r.len()).unwrap_or(BOX_FIELDS);
    let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
    RawOutputTensor::new(vec![1, rows.len(), k], data).unwrap()
  }

  #[test]
  fn confidence_is_objectness_times_best_class() {
    let output = tensor(&[&[100.0, 50.0, 20.0, 10.0, 0.8, 0.1, 0.9, 0.3]]);
    let candidates = decode(&output, 3, 0.35).unwrap();
    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert_eq!(c.class_id, 1);
    assert_eq!(c.class_score, 0.9);
    assert_eq!(c.confidence, 0.8 * 0.9);
    assert_eq!(c.bbox, [90.0, 45.0, 110.0, 55.0]);
  }

  #[test]
  fn threshold_boundary_is_inclusive() {
    let output = tensor(&[
      &[10.0, 10.0, 4.0, 4.0, 1.0, 0.35],
      &[10.0, 10.0, 4.0, 4.0, 1.0, 0.3499],
    ]);
    let candidates = decode(&output, 1, 0.35).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].confidence, 0.35);
  }

  #[test]
  fn tied_class_scores_pick_lowest_index() {
    let output = tensor(&[&[0.0, 0.0, 2.0, 2.0, 1.0, 0.5, 0.7, 0.7]]);
    let candidates = decode(&output, 3, 0.1).unwrap();
    assert_eq!(candidates[0].class_id, 1);
  }

  #[test]
  fn all_below_threshold_yields_empty() {
    let output = tensor(&[
      &[0.0, 0.0, 2.0, 2.0, 0.2, 0.5],
      &[5.0, 5.0, 2.0, 2.0, 0.9, 0.1],
    ]);
    assert!(decode(&output, 1, 0.35).unwrap().is_empty());
  }

  #[test]
  fn row_length_must_match_label_count() {
    let output = tensor(&[&[0.0, 0.0, 2.0, 2.0, 0.9, 0.5, 0.5]]);
    let err = decode(&output, 80, 0.35).unwrap_err();
    assert_eq!(
      err,
      DetectError::ShapeMismatch {
        stage: "decode",
        expected: vec![1, 1, 85],
        got: vec![1, 1, 7],
      }
    );
  }

  #[test]
  fn unexpected_rank_is_engine_failure() {
    let output = RawOutputTensor::new(vec![1, 85], vec![0.0; 85]).unwrap();
    assert!(matches!(
      decode(&output, 80, 0.35),
      Err(DetectError::EngineInvocationFailure { stage: "decode", .. })
    ));
  }

  #[test]
  fn non_finite_geometry_is_discarded() {
    let output = tensor(&[
      &[f32::NAN, 250.0, 100.0, 100.0, 1.0, 0.9],
      &[f32::INFINITY, 250.0, f32::INFINITY, 100.0, 1.0, 0.9],
      &[150.0, 250.0, 100.0, 100.0, 1.0, 0.8],
    ]);
    let candidates = decode(&output, 1, 0.35).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].confidence, 0.8);
    assert_eq!(candidates[0].bbox, [100.0, 200.0, 200.0, 300.0]);
  }

  #[test]
  fn empty_output_is_not_an_error() {
    let output = RawOutputTensor::new(vec![1, 0, 85], vec![]).unwrap();
    assert!(decode(&output, 80, 0.35).unwrap().is_empty());
  }
}
