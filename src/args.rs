// 该文件是 Xunmu （寻目） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use xunmu::config::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_SIZE, DEFAULT_IOU_THRESHOLD};

/// Xunmu 单图目标检测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理引擎，例如 replay:///path/to/output.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入图像，例如 image:///path/to/input.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出位置
  /// 支持格式:
  /// - 标注图像: image:///path/to/out.jpg[?font=/path/to/font.ttf]
  /// - JSON 记录: json:///path/to/result.json
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 模型输入边长 S
  #[arg(long, default_value_t = DEFAULT_INPUT_SIZE, value_name = "PIXELS")]
  pub input_size: u32,

  /// 置信度阈值 (0.0 - 1.0)，等于阈值的框保留
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IoU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub iou: f32,

  /// 类别标签文件，每行一个；默认使用 COCO 80 类
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 只在同一类别内做 NMS
  #[arg(long)]
  pub per_class_nms: bool,
}
