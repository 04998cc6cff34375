// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLO 原始输出后处理
// 置信度/类别过滤 → 几何解码 → NMS

use ndarray::{ArrayD, ArrayView2, Ix2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::types::{Bbox, Detection};
use crate::error::DetectError;
use crate::non_max_suppression;

/// COCO 类别 0 = person
pub const PERSON_CLASS_ID: usize = 0;

/// 每一行的通道布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawLayout {
    /// [cx, cy, w, h, cls0, cls1, ...]
    #[default]
    Plain,
    /// [cx, cy, w, h, obj, cls0, cls1, ...] (Darknet YOLOv3, obj 通道不参与打分)
    Darknet,
}

impl RawLayout {
    /// 类别分数起始列
    pub fn score_offset(&self) -> usize {
        match self {
            RawLayout::Plain => 4,
            RawLayout::Darknet => 5,
        }
    }
}

/// 后处理配置 (构造后不可变)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
    pub min_confidence_score: f32,
    pub nms_threshold: f32,
    /// None = 通用检测器, 保留所有类别 (按类别分组做NMS)
    pub target_class_id: Option<usize>,
    pub layout: RawLayout,
    /// 设置后严格校验每行列数
    pub num_classes: Option<usize>,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            min_confidence_score: 0.5,
            nms_threshold: 0.4,
            target_class_id: Some(PERSON_CLASS_ID),
            layout: RawLayout::Plain,
            num_classes: None,
        }
    }
}

/// 检测输出后处理器
#[derive(Debug, Clone, Default)]
pub struct DetectionPostprocessor {
    config: PostprocessConfig,
}

impl DetectionPostprocessor {
    pub fn new(config: PostprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostprocessConfig {
        &self.config
    }

    /// 解码所有输出层, 返回按置信度降序排列的检测结果
    ///
    /// # 参数
    /// - `image_size`: 原图 (width, height), 像素
    /// - `raw_outputs`: 每个检测层一个二维张量, 每行一个候选框
    pub fn decode(
        &self,
        image_size: (u32, u32),
        raw_outputs: &[ArrayD<f32>],
    ) -> Result<Vec<Detection>, DetectError> {
        let (width, height) = image_size;
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidImageSize { width, height });
        }

        let mut candidates = Vec::new();
        for (idx, output) in raw_outputs.iter().enumerate() {
            let rows = output
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|_| DetectError::InvalidOutputShape {
                    tensor: idx,
                    reason: format!("expected a 2-D tensor, got shape {:?}", output.shape()),
                })?;
            self.decode_tensor(idx, rows, width as f32, height as f32, &mut candidates)?;
        }

        let num_candidates = candidates.len();
        non_max_suppression(&mut candidates, self.config.nms_threshold);

        debug!(
            candidates = num_candidates,
            kept = candidates.len(),
            "decoded raw outputs"
        );
        Ok(candidates)
    }

    fn decode_tensor(
        &self,
        idx: usize,
        rows: ArrayView2<f32>,
        width: f32,
        height: f32,
        candidates: &mut Vec<Detection>,
    ) -> Result<(), DetectError> {
        let offset = self.config.layout.score_offset();
        let cols = rows.ncols();

        // 空张量 (0 行) 不需要校验列数
        if rows.nrows() == 0 {
            return Ok(());
        }
        if cols <= offset {
            return Err(DetectError::InvalidOutputShape {
                tensor: idx,
                reason: format!("row has {} columns, need at least {}", cols, offset + 1),
            });
        }
        if let Some(nc) = self.config.num_classes {
            if cols != offset + nc {
                return Err(DetectError::InvalidOutputShape {
                    tensor: idx,
                    reason: format!("row has {} columns, expected {}", cols, offset + nc),
                });
            }
        }
        if let Some(target) = self.config.target_class_id {
            if target >= cols - offset {
                return Err(DetectError::InvalidOutputShape {
                    tensor: idx,
                    reason: format!(
                        "target class {} out of range for {} class scores",
                        target,
                        cols - offset
                    ),
                });
            }
        }

        for row in rows.rows() {
            // argmax, 相同分数取最小类别ID
            let (class_id, confidence) = row
                .iter()
                .skip(offset)
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (id, &score)| {
                    if score > best.1 {
                        (id, score)
                    } else {
                        best
                    }
                });

            if confidence <= self.config.min_confidence_score {
                continue;
            }
            if let Some(target) = self.config.target_class_id {
                if class_id != target {
                    continue;
                }
            }

            let bbox = Bbox::from_cxcywh(
                row[0] * width,
                row[1] * height,
                row[2] * width,
                row[3] * height,
            );
            trace!(class_id, confidence, ?bbox, "candidate");
            candidates.push(Detection::new(class_id, confidence, bbox));
        }

        Ok(())
    }
}
