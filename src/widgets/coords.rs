//! Node-local geometry helpers.
//!
//! Conventions:
//! - Node-local space: origin at the node's top-left, +Y down, canvas units.
//! - Image rects are always the letterboxed placement inside a content rect.

/// Axis-aligned rectangle in node-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Left part of the rect, up to (not including) `x`.
    pub fn left_of(&self, x: f32) -> Rect {
        let right = x.clamp(self.x, self.max_x());
        Rect::new(self.x, self.y, right - self.x, self.h)
    }
}

/// Fit an image into `area` preserving aspect ratio, centered.
///
/// Degenerate image sizes yield an empty rect at the area's center.
pub fn letterbox(image_w: u32, image_h: u32, area: Rect) -> Rect {
    if image_w == 0 || image_h == 0 || area.is_empty() {
        return Rect::new(area.x + area.w * 0.5, area.y + area.h * 0.5, 0.0, 0.0);
    }
    let (iw, ih) = (image_w as f32, image_h as f32);
    let scale = (area.w / iw).min(area.h / ih);
    let (w, h) = (iw * scale, ih * scale);
    Rect::new(area.x + (area.w - w) * 0.5, area.y + (area.h - h) * 0.5, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_wide_and_tall() {
        let area = Rect::new(0.0, 0.0, 500.0, 500.0);
        let wide = letterbox(800, 600, area);
        assert_eq!(wide, Rect::new(0.0, 62.5, 500.0, 375.0));

        let tall = letterbox(250, 500, area);
        assert_eq!(tall, Rect::new(125.0, 0.0, 250.0, 500.0));
    }

    #[test]
    fn test_letterbox_same_aspect_same_rect() {
        let area = Rect::new(0.0, 30.0, 500.0, 400.0);
        assert_eq!(letterbox(800, 600, area), letterbox(400, 300, area));
    }

    #[test]
    fn test_letterbox_degenerate() {
        let r = letterbox(0, 10, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(r.is_empty());
        assert_eq!((r.x, r.y), (50.0, 25.0));
    }

    #[test]
    fn test_left_of_clamps() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(a.left_of(30.0).w, 30.0);
        assert_eq!(a.left_of(-5.0).w, 0.0);
        assert_eq!(a.left_of(500.0).w, 100.0);
    }
}
