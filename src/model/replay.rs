// 该文件是 Xunmu （寻目） 项目的一部分。
// src/model/replay.rs - 回放推理引擎：从文件读取已导出的原始输出张量
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

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use super::{InferenceEngine, RawOutputTensor};
use crate::{FromUrl, FromUrlWithScheme, config::DEFAULT_INPUT_SIZE, error::DetectError, frame::InputTensor};

const REPLAY_DTYPE: &str = "float32";

#[derive(Error, Debug)]
pub enum ReplayEngineError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无效的查询参数: {0}")]
  InvalidQuery(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("不支持的数据类型: {0}, 仅支持 float32")]
  UnsupportedDtype(String),
  #[error("张量无效: {0}")]
  InvalidTensor(#[from] DetectError),
  #[error("输入形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
  InputShapeMismatch { expected: [usize; 4], got: [usize; 4] },
  #[error("输入边长冲突: URI 指定 size={query}, 检测配置为 {configured}")]
  InputSizeConflict { query: u32, configured: u32 },
}

#[derive(Deserialize)]
struct TensorDump {
  shape: Vec<usize>,
  #[serde(default = "default_dtype")]
  dtype: String,
  data: Vec<f32>,
}

fn default_dtype() -> String {
  REPLAY_DTYPE.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DumpFile {
  Multiple { outputs: Vec<TensorDump> },
  Single(TensorDump),
}

/// 回放引擎：对任意输入都返回同一组预先导出的输出张量，但会校验输入形状。
#[derive(Debug, Clone)]
pub struct ReplayEngine {
  input_size: u32,
  outputs: Vec<RawOutputTensor>,
}

impl ReplayEngine {
  pub fn from_json_str(input_size: u32, json: &str) -> Result<Self, ReplayEngineError> {
    let dump: DumpFile = serde_json::from_str(json)?;
    let dumps = match dump {
      DumpFile::Multiple { outputs } => outputs,
      DumpFile::Single(tensor) => vec![tensor],
    };

    let outputs = dumps
      .into_iter()
      .map(|tensor| -> Result<RawOutputTensor, ReplayEngineError> {
        if tensor.dtype != REPLAY_DTYPE {
          return Err(ReplayEngineError::UnsupportedDtype(tensor.dtype));
        }
        Ok(RawOutputTensor::new(tensor.shape, tensor.data)?)
      })
      .collect::<Result<Vec<_>, _>>()?;

    for (idx, output) in outputs.iter().enumerate() {
      debug!("回放输出 {}: 形状 {:?}", idx, output.shape());
    }

    Ok(Self { input_size, outputs })
  }

  pub fn input_size(&self) -> u32 {
    self.input_size
  }
}

impl InferenceEngine for ReplayEngine {
  type Error = ReplayEngineError;

  fn run(&self, input: &InputTensor) -> Result<Vec<RawOutputTensor>, Self::Error> {
    let side = self.input_size as usize;
    let expected = [1, 3, side, side];
    if input.shape() != expected {
      error!("输入形状不匹配: 期望 {:?}, 实际 {:?}", expected, input.shape());
      return Err(ReplayEngineError::InputShapeMismatch {
        expected,
        got: input.shape(),
      });
    }
    Ok(self.outputs.clone())
  }
}

pub struct ReplayEngineBuilder {
  dump_path: String,
  input_size: u32,
  size_from_query: bool,
}

impl FromUrlWithScheme for ReplayEngineBuilder {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayEngineBuilder {
  type Error = ReplayEngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayEngineError::SchemeMismatch(format!(
        "期望方案 '{}', 实际方案 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let mut input_size = DEFAULT_INPUT_SIZE;
    let mut size_from_query = false;
    for (k, v) in url.query_pairs() {
      if k == "size" {
        input_size = v
          .parse()
          .map_err(|_| ReplayEngineError::InvalidQuery(format!("size={}", v)))?;
        size_from_query = true;
      }
    }

    Ok(ReplayEngineBuilder {
      dump_path: url.path().to_string(),
      input_size,
      size_from_query,
    })
  }
}

impl ReplayEngineBuilder {
  pub fn input_size(mut self, input_size: u32) -> Self {
    self.input_size = input_size;
    self
  }

  /// 与检测配置的输入边长对齐；URI 显式给出的 `size` 不一致时报错
  pub fn expect_input_size(self, input_size: u32) -> Result<Self, ReplayEngineError> {
    if self.size_from_query && self.input_size != input_size {
      error!(
        "输入边长冲突: URI 指定 {}, 检测配置为 {}",
        self.input_size, input_size
      );
      return Err(ReplayEngineError::InputSizeConflict {
        query: self.input_size,
        configured: input_size,
      });
    }
    Ok(self.input_size(input_size))
  }

  pub fn build(self) -> Result<ReplayEngine, ReplayEngineError> {
    info!("加载输出张量文件: {}", self.dump_path);
    let text = std::fs::read_to_string(&self.dump_path)?;
    debug!(
      "输出张量文件大小: {:.2} MB",
      text.len() as f64 / (1024.0 * 1024.0)
    );
    let engine = ReplayEngine::from_json_str(self.input_size, &text)?;
    info!("回放引擎就绪, 输出数量: {}", engine.outputs.len());
    Ok(engine)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_single_tensor_dump() {
    let engine =
      ReplayEngine::from_json_str(2, r#"{"shape":[1,1,6],"data":[1,1,2,2,0.9,0.8]}"#).unwrap();
    let input = InputTensor::from_planar(2, vec![0.0; 12]);
    let outputs = engine.run(&input).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].shape(), &[1, 1, 6]);
  }

  #[test]
  fn parses_multiple_outputs() {
    let json = r#"{"outputs":[{"shape":[1,0,6],"data":[]},{"shape":[2],"data":[1,2]}]}"#;
    let engine = ReplayEngine::from_json_str(640, json).unwrap();
    assert_eq!(engine.outputs.len(), 2);
  }

  #[test]
  fn rejects_non_float_dump() {
    let json = r#"{"shape":[1],"dtype":"float16","data":[1]}"#;
    assert!(matches!(
      ReplayEngine::from_json_str(640, json),
      Err(ReplayEngineError::UnsupportedDtype(_))
    ));
  }

  #[test]
  fn rejects_inconsistent_shape() {
    let json = r#"{"shape":[1,2,6],"data":[1,2,3]}"#;
    assert!(matches!(
      ReplayEngine::from_json_str(640, json),
      Err(ReplayEngineError::InvalidTensor(_))
    ));
  }

  #[test]
  fn rejects_wrong_input_size() {
    let engine = ReplayEngine::from_json_str(4, r#"{"shape":[1,0,6],"data":[]}"#).unwrap();
    let input = InputTensor::from_planar(2, vec![0.0; 12]);
    assert!(matches!(
      engine.run(&input),
      Err(ReplayEngineError::InputShapeMismatch { .. })
    ));
  }

  #[test]
  fn builder_reads_size_from_query() {
    let url = Url::parse("replay:///tmp/out.json?size=320").unwrap();
    let builder = ReplayEngineBuilder::from_url(&url).unwrap();
    assert_eq!(builder.input_size, 320);
    assert_eq!(builder.dump_path, "/tmp/out.json");

    let url = Url::parse("image:///tmp/out.json").unwrap();
    assert!(ReplayEngineBuilder::from_url(&url).is_err());
  }

  #[test]
  fn query_size_must_agree_with_configured_size() {
    let url = Url::parse("replay:///tmp/out.json?size=320").unwrap();
    let builder = ReplayEngineBuilder::from_url(&url)
      .unwrap()
      .expect_input_size(320)
      .unwrap();
    assert_eq!(builder.input_size, 320);

    assert!(matches!(
      ReplayEngineBuilder::from_url(&url).unwrap().expect_input_size(640),
      Err(ReplayEngineError::InputSizeConflict {
        query: 320,
        configured: 640,
      })
    ));
  }

  #[test]
  fn configured_size_applies_without_query() {
    let url = Url::parse("replay:///tmp/out.json").unwrap();
    let builder = ReplayEngineBuilder::from_url(&url)
      .unwrap()
      .expect_input_size(416)
      .unwrap();
    assert_eq!(builder.input_size, 416);
  }
}
