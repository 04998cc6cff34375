// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 帧输入输出 (Frame sources and sinks)
//!
//! 推理不在本 crate 内完成: `FrameSource` 提供每一帧的图像和原始输出张量,
//! `Recording` 从磁盘回放录制好的输出。`AnnotationSink` 把标注后的帧写成 PNG。
//! 两者都由帧循环持有, 循环结束即释放。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use ndarray::{Array2, ArrayD};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// 一帧输入
pub struct Frame {
    pub index: usize,
    pub image: RgbImage,
    pub outputs: Vec<ArrayD<f32>>,
}

impl Frame {
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// 帧来源 (采集 + 推理)
pub trait FrameSource {
    /// 下一帧, 结束时返回 None
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// 录制文件中的一帧
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// 帧图像, 相对路径以录制文件所在目录为基准
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// 每个输出层一个张量, 每行 [cx, cy, w, h, scores...]
    pub outputs: Vec<Vec<Vec<f32>>>,
}

/// 录制文件格式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingFile {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    pub frames: Vec<RecordedFrame>,
}

/// YOLOv3 默认输入尺寸
fn default_size() -> u32 {
    416
}

/// 回放录制好的检测输出
pub struct Recording {
    base_dir: PathBuf,
    file: RecordingFile,
    cursor: usize,
}

impl Recording {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {:?}", path))?;
        let file: RecordingFile = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse recording {:?}", path))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        info!("📹 录制文件 {:?}: {} 帧", path, file.frames.len());
        Ok(Self::from_file(file, base_dir))
    }

    pub fn from_file(file: RecordingFile, base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            file,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.file.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.frames.is_empty()
    }

    fn load_image(&self, recorded: &RecordedFrame) -> Result<RgbImage> {
        let width = recorded.width.unwrap_or(self.file.width);
        let height = recorded.height.unwrap_or(self.file.height);

        match &recorded.image {
            Some(image) => {
                let path = self.base_dir.join(image);
                let img = image::open(&path)
                    .with_context(|| format!("Failed to open frame image {:?}", path))?
                    .into_rgb8();
                Ok(img)
            }
            None => Ok(RgbImage::new(width, height)),
        }
    }
}

impl FrameSource for Recording {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(recorded) = self.file.frames.get(self.cursor) else {
            return Ok(None);
        };
        let index = self.cursor;

        let image = self.load_image(recorded)?;
        let outputs = recorded
            .outputs
            .iter()
            .enumerate()
            .map(|(layer, rows)| to_tensor(rows).with_context(|| format!("frame {index} layer {layer}")))
            .collect::<Result<Vec<_>>>()?;

        self.cursor += 1;
        debug!(index, layers = outputs.len(), "frame loaded");
        Ok(Some(Frame {
            index,
            image,
            outputs,
        }))
    }
}

/// 行列表 → 二维张量, 行长度不一致时报错
pub fn to_tensor(rows: &[Vec<f32>]) -> Result<ArrayD<f32>> {
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(anyhow!(
            "invalid output shape: row {} has {} columns, expected {}",
            i,
            row.len(),
            cols
        ));
    }
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    let tensor = Array2::from_shape_vec((rows.len(), cols), flat)?;
    Ok(tensor.into_dyn())
}

/// 标注帧输出目录
pub struct AnnotationSink {
    dir: PathBuf,
    written: usize,
}

impl AnnotationSink {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
        info!("💾 标注图像输出到 {:?}", dir);
        Ok(Self { dir, written: 0 })
    }

    /// 以时间戳命名的输出目录
    pub fn timestamped<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::create(root.as_ref().join(crate::gen_time_string("-")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&mut self, index: usize, image: &RgbImage) -> Result<PathBuf> {
        let path = self.dir.join(format!("{:06}.png", index));
        image
            .save(&path)
            .with_context(|| format!("Failed to save frame {:?}", path))?;
        self.written += 1;
        Ok(path)
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl Drop for AnnotationSink {
    fn drop(&mut self) {
        if self.written == 0 {
            warn!("⚠️ 输出目录 {:?} 中没有写入任何帧", self.dir);
        } else {
            info!("✅ 共写入 {} 帧到 {:?}", self.written, self.dir);
        }
    }
}
