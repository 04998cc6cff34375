// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测后处理 (Detection post-processing)
//!
//! - Postprocessor: 原始输出解码 + NMS
//! - Labels:        类别名称
//! - Types:         检测框数据结构
pub mod labels;
pub mod postprocess;
pub mod types;

pub use labels::ClassNames;
pub use postprocess::{DetectionPostprocessor, PostprocessConfig, RawLayout, PERSON_CLASS_ID};
pub use types::{Bbox, Detection, Point2};
