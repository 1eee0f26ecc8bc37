// 该文件是 Xunmu （寻目） 项目的一部分。
// src/model/labels.rs - 类别标签表
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

use std::{borrow::Cow, path::Path, sync::Arc};

use super::COCO_CLASSES;

/// 有序的类别名称表，类别索引 `i` 对应 `labels[i]`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  labels: Arc<[String]>,
}

impl Default for LabelTable {
  fn default() -> Self {
    Self::coco()
  }
}

impl LabelTable {
  pub fn new<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      labels: labels.into_iter().map(Into::into).collect(),
    }
  }

  pub fn coco() -> Self {
    Self::new(COCO_CLASSES)
  }

  /// 每行一个标签，忽略空行与 `#` 开头的注释行
  pub fn from_lines(text: &str) -> Self {
    Self::new(
      text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(Self::from_lines(&text))
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  /// 索引越界时退回为数字编号，不报错
  pub fn name(&self, class_id: usize) -> Cow<'_, str> {
    match self.labels.get(class_id) {
      Some(label) => Cow::Borrowed(label.as_str()),
      None => Cow::Owned(class_id.to_string()),
    }
  }
}
