// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测结果绘制 (Annotation rendering)
//!
//! 在 RGB 图像缓冲区上原地绘制检测框、标签和跟踪位置。
//! 所有坐标先裁剪到画布附近再转换为整数, 任意越界的框都不会 panic。

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_cross_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::detection::{Detection, Point2};

/// 绘制参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub box_color: [u8; 3],
    pub box_thickness: u32,
    pub label_background: [u8; 3],
    pub label_text_color: [u8; 3],
    /// 标签字体 (TTF/OTF), 未设置时只绘制标签底色
    pub font_path: Option<PathBuf>,
    pub font_scale: f32,
    pub track_color: [u8; 3],
    pub prediction_color: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            box_color: [255, 178, 50],
            box_thickness: 3,
            label_background: [255, 255, 255],
            label_text_color: [0, 0, 0],
            font_path: None,
            font_scale: 16.0,
            track_color: [0, 255, 0],
            prediction_color: [255, 0, 0],
        }
    }
}

const LABEL_PADDING: i32 = 2;

pub struct Annotator {
    config: RenderConfig,
    font: Option<FontArc>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Annotator {
    /// 不加载字体
    pub fn new(config: RenderConfig) -> Self {
        Self { config, font: None }
    }

    /// 按配置加载字体
    pub fn from_config(config: RenderConfig) -> Result<Self> {
        let font = match &config.font_path {
            Some(path) => Some(load_font(path)?),
            None => None,
        };
        Ok(Self { config, font })
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// 绘制一个检测框及其上方的标签
    pub fn render_annotation(&self, image: &mut RgbImage, detection: &Detection, label: &str) {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let bbox = detection.bbox();
        let color = Rgb(self.config.box_color);
        for t in 0..self.config.box_thickness {
            let t = t as f32;
            let x1 = clamp_coord(bbox.xmin() + t, width);
            let y1 = clamp_coord(bbox.ymin() + t, height);
            let x2 = clamp_coord(bbox.xmax() - t, width);
            let y2 = clamp_coord(bbox.ymax() - t, height);
            if x2 < x1 || y2 < y1 {
                break;
            }
            let rect = Rect::at(x1, y1).of_size((x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32);
            draw_hollow_rect_mut(image, rect, color);
        }

        if label.is_empty() {
            return;
        }

        // 标签放在框的上方, 框贴近顶部时下移到图像内
        let (text_w, text_h) = self.text_size(label);
        let label_w = text_w as i32 + 2 * LABEL_PADDING;
        let label_h = text_h as i32 + 2 * LABEL_PADDING;
        let left = clamp_coord(bbox.xmin(), width).clamp(0, width as i32 - 1);
        let top = clamp_coord(bbox.ymin(), height).clamp(label_h, (height as i32).max(label_h));

        let background = Rect::at(left, top - label_h).of_size(label_w as u32, label_h as u32);
        draw_filled_rect_mut(image, background, Rgb(self.config.label_background));

        if let Some(font) = &self.font {
            draw_text_mut(
                image,
                Rgb(self.config.label_text_color),
                left + LABEL_PADDING,
                top - label_h + LABEL_PADDING,
                PxScale::from(self.config.font_scale),
                font,
                label,
            );
        }
    }

    /// 绘制跟踪位置 (圆) 与下一帧预测 (十字)
    pub fn render_track(&self, image: &mut RgbImage, position: Point2, predicted: Option<Point2>) {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let radius = 6;
        let center = (
            clamp_marker(position.x(), width, radius),
            clamp_marker(position.y(), height, radius),
        );
        draw_hollow_circle_mut(image, center, radius, Rgb(self.config.track_color));

        if let Some(p) = predicted {
            draw_cross_mut(
                image,
                Rgb(self.config.prediction_color),
                clamp_marker(p.x(), width, radius),
                clamp_marker(p.y(), height, radius),
            );
        }
    }

    fn text_size(&self, label: &str) -> (u32, u32) {
        match &self.font {
            Some(font) => text_size(PxScale::from(self.config.font_scale), font, label),
            // 无字体时按等宽字形估算
            None => {
                let h = self.config.font_scale.max(1.0);
                ((label.chars().count() as f32 * h * 0.5) as u32, h as u32)
            }
        }
    }
}

pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontArc> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("Failed to read font {:?}", path))?;
    let font =
        FontArc::try_from_vec(data).map_err(|e| anyhow!("Failed to parse font {:?}: {e}", path))?;
    info!("✅ 字体已加载: {:?}", path);
    Ok(font)
}

/// 裁剪到 [-1, max], -1 与 max 均在画布外
fn clamp_coord(v: f32, max: u32) -> i32 {
    if v.is_nan() {
        return -1;
    }
    v.round().clamp(-1.0, max as f32) as i32
}

fn clamp_marker(v: f32, max: u32, margin: i32) -> i32 {
    if v.is_nan() {
        return -margin - 1;
    }
    v.round()
        .clamp(-(margin as f32) - 1.0, max as f32 + margin as f32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Bbox;

    fn det(x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection::new(0, 0.9, Bbox::new(x, y, w, h))
    }

    #[test]
    fn test_draws_box_inside_image() {
        let annotator = Annotator::default();
        let mut image = RgbImage::new(100, 100);
        annotator.render_annotation(&mut image, &det(20., 30., 40., 40.), "");

        assert_eq!(image.get_pixel(20, 50), &Rgb([255, 178, 50]));
        assert_eq!(image.get_pixel(22, 50), &Rgb([255, 178, 50]));
        assert_eq!(image.get_pixel(40, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_out_of_bounds_boxes_do_not_panic() {
        let annotator = Annotator::default();
        let mut image = RgbImage::new(64, 48);
        let boxes = [
            det(-30., -20., 200., 150.),
            det(-1e9, -1e9, 2e9, 2e9),
            det(500., 500., 10., 10.),
            det(-50., -50., 10., 10.),
            det(10., 10., 0., 0.),
            det(f32::NAN, 5., f32::INFINITY, 3.),
            det(60., 40., 30., 30.),
        ];
        for b in &boxes {
            annotator.render_annotation(&mut image, b, "person:0.90");
        }
        annotator.render_track(&mut image, Point2::new(-1e7, 1e7), Some(Point2::new(1e9, -5.)));
    }

    #[test]
    fn test_label_kept_inside_image() {
        let annotator = Annotator::default();
        let mut image = RgbImage::new(100, 100);
        // 框紧贴顶部, 标签底色下移到图像内
        annotator.render_annotation(&mut image, &det(-10., -10., 50., 50.), "person:0.90");
        assert_eq!(image.get_pixel(1, 1), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_outside_edges_not_drawn() {
        let annotator = Annotator::default();
        let mut image = RgbImage::new(50, 50);
        annotator.render_annotation(&mut image, &det(-100., 10., 120., 20.), "");
        // 左边缘在图像外, 只剩右边缘
        assert_eq!(image.get_pixel(0, 20), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(19, 20), &Rgb([255, 178, 50]));
    }

    #[test]
    fn test_empty_canvas() {
        let annotator = Annotator::default();
        let mut image = RgbImage::new(0, 0);
        annotator.render_annotation(&mut image, &det(0., 0., 10., 10.), "x");
        annotator.render_track(&mut image, Point2::new(0., 0.), None);
    }
}
