// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 核心错误类型 (Core error types)
//!
//! 解码与跟踪只在前置条件被破坏时报错, 空输入不是错误。

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    #[error("invalid image size {width}x{height}: both dimensions must be > 0")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("invalid output shape (tensor {tensor}): {reason}")]
    InvalidOutputShape { tensor: usize, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    #[error("non-finite measurement ({x}, {y})")]
    NonFiniteMeasurement { x: f32, y: f32 },
}
