// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod annotate; // 检测框与跟踪位置绘制
pub mod config; // 配置参数
pub mod detection; // 检测输出后处理
pub mod error;
pub mod frames; // 帧输入输出
pub mod pipeline; // 单帧处理流程
pub mod tracking; // 单目标跟踪

pub use crate::annotate::{Annotator, RenderConfig};
pub use crate::config::{AppConfig, Args};
pub use crate::detection::{
    Bbox, ClassNames, Detection, DetectionPostprocessor, Point2, PostprocessConfig, RawLayout,
};
pub use crate::error::{DetectError, TrackError};
pub use crate::pipeline::{FramePipeline, FrameReport};
pub use crate::tracking::{KalmanConfig, TargetTracker};

/// 按置信度降序排序后贪心抑制, 只在同一类别内比较IOU
pub fn non_max_suppression(xs: &mut Vec<Detection>, iou_threshold: f32) {
    xs.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].class_id() != xs[index].class_id() {
                continue;
            }
            let iou = xs[prev_index].bbox().iou(xs[index].bbox());
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S{}%f",
        delimiter, delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
