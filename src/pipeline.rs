// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 单帧处理流程
//!
//! ```text
//! 原始输出 → 后处理(解码 + NMS) → 选取观测(最高置信度检测框中心)
//!          ↓
//!     TargetTracker::track → 平滑位置 / 预测位置 → 绘制
//! ```

use anyhow::Result;
use image::RgbImage;
use ndarray::ArrayD;
use tracing::debug;

use crate::annotate::Annotator;
use crate::config::AppConfig;
use crate::detection::{ClassNames, Detection, DetectionPostprocessor, Point2};
use crate::tracking::TargetTracker;

/// 单帧结果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub detections: Vec<Detection>,
    /// 本帧观测值, 没有检测时为 None (跟踪器不更新)
    pub measurement: Option<Point2>,
    /// 校正后的位置
    pub tracked: Option<Point2>,
    /// 下一帧预测
    pub predicted: Option<Point2>,
}

pub struct FramePipeline {
    postprocessor: DetectionPostprocessor,
    tracker: TargetTracker,
    class_names: ClassNames,
    annotator: Annotator,
}

impl FramePipeline {
    pub fn new(
        postprocessor: DetectionPostprocessor,
        tracker: TargetTracker,
        class_names: ClassNames,
        annotator: Annotator,
    ) -> Self {
        Self {
            postprocessor,
            tracker,
            class_names,
            annotator,
        }
    }

    /// 按配置构建 (加载类别名称与字体)
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let class_names = match &config.classes_path {
            Some(path) => ClassNames::from_file(path)?,
            None => ClassNames::default(),
        };
        Ok(Self::new(
            DetectionPostprocessor::new(config.postprocess.clone()),
            TargetTracker::new(config.kalman),
            class_names,
            Annotator::from_config(config.render.clone())?,
        ))
    }

    pub fn tracker(&self) -> &TargetTracker {
        &self.tracker
    }

    /// 处理一帧: 解码、跟踪, 并在图像上原地绘制
    pub fn process(&mut self, image: &mut RgbImage, outputs: &[ArrayD<f32>]) -> Result<FrameReport> {
        let detections = self.postprocessor.decode(image.dimensions(), outputs)?;

        for det in &detections {
            let label = self.class_names.label(det);
            self.annotator.render_annotation(image, det, &label);
        }

        // 结果已按置信度降序, 第一个即观测目标
        let measurement = detections.first().map(Detection::centroid);
        let tracked = match measurement {
            Some(m) => Some(self.tracker.track(m)?),
            None => None,
        };
        let predicted = self.tracker.predicted_position();

        if let Some(position) = tracked {
            self.annotator.render_track(image, position, predicted);
        }

        debug!(
            detections = detections.len(),
            ?measurement,
            ?tracked,
            ?predicted,
            "frame processed"
        );
        Ok(FrameReport {
            detections,
            measurement,
            tracked,
            predicted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_empty_frame_skips_tracker() {
        let mut pipeline = FramePipeline::from_config(&AppConfig::default()).unwrap();
        let mut image = RgbImage::new(416, 416);
        let zeros = ndarray::Array2::<f32>::zeros((10, 6)).into_dyn();

        let report = pipeline.process(&mut image, &[zeros]).unwrap();
        assert!(report.detections.is_empty());
        assert_eq!(report.measurement, None);
        assert_eq!(report.tracked, None);
        assert_eq!(pipeline.tracker().steps(), 0);
    }

    #[test]
    fn test_best_detection_seeds_tracker() {
        let mut pipeline = FramePipeline::from_config(&AppConfig::default()).unwrap();
        let mut image = RgbImage::new(416, 416);
        let out = arr2(&[[0.5f32, 0.5, 0.5, 0.5, 0.9], [0.1, 0.1, 0.1, 0.1, 0.7]]).into_dyn();

        let report = pipeline.process(&mut image, &[out]).unwrap();
        assert_eq!(report.detections.len(), 2);
        assert_eq!(report.measurement, Some(Point2::new(208., 208.)));
        assert_eq!(report.tracked, Some(Point2::new(208., 208.)));
        assert_eq!(report.predicted, Some(Point2::new(208., 208.)));
    }
}
