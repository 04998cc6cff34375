// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测数据结构定义
//! Data structures for detection post-processing

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Point2 {
    x: f32,
    y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// 像素坐标下的轴对齐边界框 (left, top, width, height)
///
/// 不做裁剪, 坐标可以为负或超出图像范围。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bbox {
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
        }
    }

    /// 由中心点和宽高构造
    pub fn from_cxcywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2., cy - height / 2., width, height)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn cxcy(&self) -> Point2 {
        Point2::new(self.xmin + self.width / 2., self.ymin + self.height / 2.)
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.) * self.height.max(0.)
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = self.xmax().min(another.xmax());
        let t = self.ymin.max(another.ymin);
        let b = self.ymax().min(another.ymax());
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    /// 交并比, 面积为零的并集返回 0
    pub fn iou(&self, another: &Bbox) -> f32 {
        let union = self.union(another);
        if union <= 0. {
            return 0.;
        }
        self.intersection_area(another) / union
    }
}

/// 单个检测结果 (解码后不可变)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    class_id: usize,
    confidence: f32,
    bbox: Bbox,
}

impl Detection {
    pub fn new(class_id: usize, confidence: f32, bbox: Bbox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn bbox(&self) -> &Bbox {
        &self.bbox
    }

    /// 检测框中心, 作为跟踪器的观测值
    pub fn centroid(&self) -> Point2 {
        self.bbox.cxcy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical() {
        let a = Bbox::new(10., 10., 20., 20.);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = Bbox::new(0., 0., 10., 10.);
        let b = Bbox::new(20., 20., 10., 10.);
        assert_eq!(a.intersection_area(&b), 0.);
        assert_eq!(a.iou(&b), 0.);
    }

    #[test]
    fn test_iou_half_overlap() {
        // 重叠 50 / 并集 150
        let a = Bbox::new(0., 0., 10., 10.);
        let b = Bbox::new(5., 0., 10., 10.);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate() {
        let a = Bbox::new(5., 5., 0., 0.);
        assert_eq!(a.iou(&a), 0.);
    }

    #[test]
    fn test_from_cxcywh() {
        let b = Bbox::from_cxcywh(208., 208., 208., 208.);
        assert_eq!(b.xmin(), 104.);
        assert_eq!(b.ymin(), 104.);
        assert_eq!(b.cxcy(), Point2::new(208., 208.));
    }
}
