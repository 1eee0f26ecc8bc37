// 该文件是 Xunmu （寻目） 项目的一部分。
// src/main.rs - 单图检测命令行程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use xunmu::{
  DetectConfig, Detector, FromUrl,
  input::ImageFileInput,
  model::{EngineSlot, ReplayEngine, ReplayEngineBuilder},
  output::OutputWrapper,
  postprocess::NmsMode,
  task::{OneShotTask, Task},
};

static ENGINE: EngineSlot<ReplayEngine> = EngineSlot::new();

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("推理引擎: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let mut config = DetectConfig::default()
    .with_input_size(args.input_size)
    .with_confidence_threshold(args.confidence)
    .with_iou_threshold(args.iou);
  if let Some(path) = &args.labels {
    config = config.with_label_file(path)?;
  }
  if args.per_class_nms {
    config = config.with_nms_mode(NmsMode::PerClass);
  }

  let engine = ENGINE.get_or_try_init(|| {
    ReplayEngineBuilder::from_url(&args.model)?
      .expect_input_size(args.input_size)?
      .build()
  })?;

  let input = ImageFileInput::from_url(&args.input)?;
  let detector = Detector::new(engine, config)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let result = OneShotTask.run_task(input, detector, output)?;

  info!("检测到 {} 个目标", result.len());
  for detection in result.iter() {
    let [x1, y1, x2, y2] = detection.bbox;
    info!(
      "  - {}: {:.1}% at ({:.0}, {:.0}, {:.0}, {:.0})",
      detection.label,
      detection.confidence * 100.0,
      x1,
      y1,
      x2,
      y2
    );
  }

  Ok(())
}
