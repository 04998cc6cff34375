use std::error::Error;
use std::fs;

use image::{Rgb, RgbImage};
use tempfile::tempdir;

use yolo_tracker_rs::frames::{AnnotationSink, FrameSource, Recording};
use yolo_tracker_rs::{AppConfig, FramePipeline};

/// 目标从 (104, 208) 匀速右移, 每帧 4 像素, 中间一帧没有检测
fn write_recording(dir: &std::path::Path) -> Result<std::path::PathBuf, Box<dyn Error>> {
    let mut frames = Vec::new();
    for i in 0..30 {
        let outputs = if i == 10 {
            serde_json::json!([[[0.5, 0.5, 0.2, 0.2, 0.1]]])
        } else {
            let cx = (104.0 + 4.0 * i as f32) / 416.0;
            serde_json::json!([
                [[cx, 0.5, 0.1, 0.3, 0.9], [cx + 0.002, 0.5, 0.1, 0.3, 0.8]],
                [[0.9, 0.1, 0.05, 0.05, 0.2]]
            ])
        };
        frames.push(serde_json::json!({ "outputs": outputs }));
    }
    frames.push(serde_json::json!({ "image": "frame.png", "outputs": [] }));

    RgbImage::from_pixel(64, 48, Rgb([10, 20, 30])).save(dir.join("frame.png"))?;

    let path = dir.join("recording.json");
    let recording = serde_json::json!({ "width": 416, "height": 416, "frames": frames });
    fs::write(&path, serde_json::to_string(&recording)?)?;
    Ok(path)
}

#[test]
fn test_replay_tracks_moving_target() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let recording = write_recording(dir.path())?;
    fs::write(dir.path().join("coco.names"), "person\nbicycle\n")?;

    let config = AppConfig {
        classes_path: Some(dir.path().join("coco.names")),
        ..Default::default()
    };
    let mut pipeline = FramePipeline::from_config(&config)?;
    let mut source = Recording::open(&recording)?;
    assert_eq!(source.len(), 31);

    let mut sink = AnnotationSink::create(dir.path().join("out"))?;
    let mut reports = Vec::new();
    while let Some(mut frame) = source.next_frame()? {
        let report = pipeline.process(&mut frame.image, &frame.outputs)?;
        sink.write(frame.index, &frame.image)?;
        reports.push(report);
    }

    assert_eq!(reports.len(), 31);
    assert_eq!(sink.written(), 31);
    assert!(dir.path().join("out/000000.png").exists());
    assert!(dir.path().join("out/000030.png").exists());

    // 重叠的低分框被抑制
    assert_eq!(reports[0].detections.len(), 1);
    let seed = reports[0].tracked.ok_or("tracker not seeded")?;
    assert_eq!(reports[0].measurement, Some(seed));
    assert!((seed.x() - 104.0).abs() < 1e-3 && (seed.y() - 208.0).abs() < 1e-3);

    // 没有检测的帧不更新跟踪器
    assert!(reports[10].detections.is_empty());
    assert_eq!(reports[10].tracked, None);
    assert_eq!(pipeline.tracker().steps(), 29);

    // 匀速运动, 预测接近下一帧真实位置
    let last = reports[29].predicted.ok_or("no prediction")?;
    let expected_next = 104.0 + 4.0 * 30.0;
    assert!((last.x() - expected_next).abs() < 1.0, "x = {}", last.x());
    assert!((last.y() - 208.0).abs() < 1e-2);
    let (vx, vy) = pipeline.tracker().velocity().ok_or("not tracking")?;
    assert!((vx - 4.0).abs() < 0.2, "vx = {}", vx);
    assert!(vy.abs() < 1e-2);

    // 图像帧保留原始尺寸
    let image = image::open(dir.path().join("out/000030.png"))?;
    assert_eq!((image.width(), image.height()), (64, 48));

    Ok(())
}

#[test]
fn test_recording_with_ragged_rows_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{ "frames": [ { "outputs": [[[0.5, 0.5, 0.1, 0.1, 0.9], [0.5, 0.5]]] } ] }"#,
    )?;

    let mut source = Recording::open(&path)?;
    assert!(source.next_frame().is_err());
    Ok(())
}

#[test]
fn test_missing_recording_fails() {
    assert!(Recording::open("nonexistent_recording.json").is_err());
}

#[test]
fn test_config_load_creates_default() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("tracker_config.json");

    let config = AppConfig::load(&path)?;
    assert_eq!(config, AppConfig::default());
    assert!(path.exists());

    let mut edited = config.clone();
    edited.postprocess.target_class_id = None;
    edited.kalman.measurement_noise = 0.5;
    edited.save(&path)?;
    assert_eq!(AppConfig::load(&path)?, edited);
    Ok(())
}

#[test]
fn test_config_parse_error() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json")?;
    assert!(AppConfig::load(&path).is_err());
    Ok(())
}
