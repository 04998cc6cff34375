// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 配置 - 通过JSON文件调整参数, 命令行参数覆盖

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::annotate::RenderConfig;
use crate::detection::PostprocessConfig;
use crate::tracking::KalmanConfig;

/// 完整配置 (缺省字段使用默认值)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub postprocess: PostprocessConfig,
    pub kalman: KalmanConfig,
    pub render: RenderConfig,
    /// 类别名称文件, 每行一个
    pub classes_path: Option<PathBuf>,
}

impl AppConfig {
    /// 从JSON文件加载配置, 文件不存在时写入默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("📝 配置文件 {:?} 不存在, 创建默认配置...", path);
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        info!("✅ 配置已从 {:?} 加载", path);
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("Failed to write config {:?}", path))?;
        info!("💾 配置已保存到 {:?}", path);
        Ok(())
    }

    /// 命令行参数覆盖配置文件
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(conf) = args.conf {
            self.postprocess.min_confidence_score = conf;
        }
        if let Some(nms) = args.nms {
            self.postprocess.nms_threshold = nms;
        }
        if args.all_classes {
            self.postprocess.target_class_id = None;
        } else if let Some(class) = args.class {
            self.postprocess.target_class_id = Some(class);
        }
        if let Some(classes) = &args.classes {
            self.classes_path = Some(classes.clone());
        }
        if let Some(font) = &args.font {
            self.render.font_path = Some(font.clone());
        }
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        let pp = &self.postprocess;
        info!("🎛️  当前配置:");
        info!("  置信度阈值: {:.2}", pp.min_confidence_score);
        info!("  NMS IOU阈值: {:.2}", pp.nms_threshold);
        match pp.target_class_id {
            Some(id) => info!("  目标类别: {}", id),
            None => info!("  目标类别: 全部"),
        }
        info!("  输出布局: {:?}", pp.layout);
        info!(
            "  卡尔曼噪声: 过程 {} / 观测 {} / 初始 {}",
            self.kalman.process_noise, self.kalman.measurement_noise, self.kalman.initial_error_cov
        );
        if pp.min_confidence_score >= 1.0 {
            warn!("⚠️ 置信度阈值 >= 1.0, 不会有任何检测结果");
        }
    }
}

/// 目标跟踪参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "YOLO 检测输出回放 + 单目标卡尔曼跟踪", long_about = None)]
pub struct Args {
    /// 录制的检测输出 (JSON)
    #[arg(short, long)]
    pub recording: PathBuf,

    /// 配置文件
    #[arg(short = 'C', long, default_value = "tracker_config.json")]
    pub config: PathBuf,

    /// 标注图像输出目录 (未指定时不保存)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 保存标注图像到带时间戳的目录
    #[arg(long, default_value_t = false)]
    pub save: bool,

    /// 类别名称文件
    #[arg(long)]
    pub classes: Option<PathBuf>,

    /// 标签字体
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// 置信度阈值
    #[arg(long)]
    pub conf: Option<f32>,

    /// NMS IOU阈值
    #[arg(long)]
    pub nms: Option<f32>,

    /// 目标类别ID
    #[arg(long)]
    pub class: Option<usize>,

    /// 检测所有类别 (通用检测器)
    #[arg(long, default_value_t = false)]
    pub all_classes: bool,

    /// 日志目录 (同时写入文件)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}
