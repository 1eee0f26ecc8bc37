// 该文件是 Xunmu （寻目） 项目的一部分。
// src/postprocess/nms.rs - 非极大值抑制
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

use crate::model::Candidate;

const IOU_EPSILON: f32 = 1e-6;

/// 抑制范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NmsMode {
  /// 不同类别的框也相互抑制
  #[default]
  ClassAgnostic,
  /// 只在同一类别内抑制
  PerClass,
}

/// 两个角点形式框的交并比，分母带一个极小量，退化框（面积为 0）返回 0。
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);

  intersection / (area_a + area_b - intersection + IOU_EPSILON)
}

/// 贪心 NMS。
///
/// 按置信度稳定降序排序，置信度相同的候选框保持输入顺序；一个框只有在与所有已保留框
/// （`PerClass` 时仅同类框）的 IoU 都严格小于阈值时才被保留。
pub fn non_max_suppression(
  mut candidates: Vec<Candidate>,
  iou_threshold: f32,
  mode: NmsMode,
) -> Vec<Candidate> {
  let total = candidates.len();
  candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let mut kept: Vec<Candidate> = Vec::with_capacity(total);
  for candidate in candidates {
    let suppressed = kept
      .iter()
      .filter(|k| mode == NmsMode::ClassAgnostic || k.class_id == candidate.class_id)
      .any(|k| iou(&k.bbox, &candidate.bbox) >= iou_threshold);
    if !suppressed {
      kept.push(candidate);
    }
  }

  debug!("NMS ({:?}): {} -> {}", mode, total, kept.len());
  kept
}
