// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 目标跟踪回放 (Detection replay + tracking)
//!
//! 1. 帧来源: 回放录制的 YOLO 原始输出 (推理在外部完成)
//! 2. 后处理: 置信度过滤 + NMS
//! 3. 跟踪:   匀速卡尔曼滤波平滑目标位置
//! 4. 输出:   日志 + 可选的标注图像

use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use yolo_tracker_rs::frames::{AnnotationSink, FrameSource, Recording};
use yolo_tracker_rs::{AppConfig, Args, FramePipeline};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_dir.as_deref())?;

    let mut config = AppConfig::load(&args.config)?;
    config.apply_args(&args);
    config.print_summary();

    info!("🚀 目标跟踪启动");
    let mut pipeline = FramePipeline::from_config(&config)?;

    // 帧来源与输出目录只在帧循环内存在
    let mut source = Recording::open(&args.recording)?;
    let mut sink = match (&args.output, args.save) {
        (Some(dir), _) => Some(AnnotationSink::create(dir)?),
        (None, true) => Some(AnnotationSink::timestamped("runs")?),
        (None, false) => None,
    };

    let start = Instant::now();
    let mut frames = 0usize;
    let mut tracked_frames = 0usize;
    while let Some(mut frame) = source.next_frame()? {
        let report = pipeline
            .process(&mut frame.image, &frame.outputs)
            .with_context(|| format!("Failed to process frame {}", frame.index))?;

        frames += 1;
        match (report.tracked, report.predicted) {
            (Some(p), Some(next)) => {
                tracked_frames += 1;
                info!(
                    "🎯 帧 {:06}: {} 个检测 | 位置 ({:.1}, {:.1}) | 预测 ({:.1}, {:.1})",
                    frame.index,
                    report.detections.len(),
                    p.x(),
                    p.y(),
                    next.x(),
                    next.y()
                );
            }
            _ => warn!("⚠️ 帧 {:06}: 没有检测到目标", frame.index),
        }

        if let Some(sink) = sink.as_mut() {
            sink.write(frame.index, &frame.image)?;
        }
    }
    drop(source);
    drop(sink);

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "✅ 完成: {} 帧, {} 帧有目标, {:.1}ms/帧",
        frames,
        tracked_frames,
        if frames > 0 {
            elapsed * 1000.0 / frames as f64
        } else {
            0.0
        }
    );
    Ok(())
}

fn init_logging(log_dir: Option<&Path>) -> Result<()> {
    let console_appender = fmt::layer().with_writer(std::io::stdout).with_ansi(true);
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).context("Failed to create log directory")?;
            let file_name = dir.join(format!(
                "yolo_tracker_{}.log",
                Local::now().format("%Y-%m-%d_%H-%M-%S")
            ));
            let file = File::create(&file_name).context("Failed to create log file")?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(EnvFilter::new("trace")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_appender.with_filter(console_filter))
        .with(file_appender)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;
    Ok(())
}
