//! Pan/zoom state for the overlay viewport. Every zoom operation produces a
//! transform centered on the viewport midpoint, equivalent to
//! translate(c) · scale(k) · translate(-c).

use serde::Serialize;

pub const DEFAULT_SCALE: f32 = 0.7;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 3.0;
pub const ZOOM_IN_FACTOR: f32 = 1.25;
pub const ZOOM_OUT_FACTOR: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub k: f32,
    pub x: f32,
    pub y: f32,
}

impl Transform {
    fn centered(scale: f32, width: f32, height: f32) -> Self {
        let cx = width / 2.0;
        let cy = height / 2.0;
        Transform {
            k: scale,
            x: cx - scale * cx,
            y: cy - scale * cy,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub transform: Transform,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport {
            width,
            height,
            transform: Transform::centered(DEFAULT_SCALE, width, height),
        }
    }

    pub fn reset_zoom(&mut self) {
        self.transform = Transform::centered(DEFAULT_SCALE, self.width, self.height);
    }

    pub fn zoom_in(&mut self) {
        let scale = (self.transform.k * ZOOM_IN_FACTOR).min(MAX_SCALE);
        self.transform = Transform::centered(scale, self.width, self.height);
    }

    pub fn zoom_out(&mut self) {
        let scale = (self.transform.k * ZOOM_OUT_FACTOR).max(MIN_SCALE);
        self.transform = Transform::centered(scale, self.width, self.height);
    }

    /// A size change resets the zoom along with the new dimensions.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.reset_zoom();
    }

    pub fn scale(&self) -> f32 {
        self.transform.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-5;

    #[test]
    fn test_default_transform_is_centered_at_default_scale() {
        let viewport = Viewport::new(100.0, 200.0);
        assert!((viewport.scale() - 0.7).abs() < TOLERANCE);
        // cx = 50 → x = 50 - 0.7 * 50 = 15
        assert!((viewport.transform.x - 15.0).abs() < TOLERANCE);
        assert!((viewport.transform.y - 30.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_zoom_in_then_out_returns_to_default_scale() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.zoom_in();
        viewport.zoom_out();
        assert!((viewport.scale() - 0.7).abs() < TOLERANCE);
    }

    #[test]
    fn test_zoom_in_clamps_at_max_scale() {
        let mut viewport = Viewport::new(800.0, 600.0);
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert!(viewport.scale() <= MAX_SCALE + TOLERANCE);
        assert!((viewport.scale() - MAX_SCALE).abs() < TOLERANCE);
    }

    #[test]
    fn test_zoom_out_clamps_at_min_scale() {
        let mut viewport = Viewport::new(800.0, 600.0);
        for _ in 0..30 {
            viewport.zoom_out();
        }
        assert!((viewport.scale() - MIN_SCALE).abs() < TOLERANCE);
    }

    #[test]
    fn test_reset_zoom_restores_default_after_zooming() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.zoom_in();
        viewport.zoom_in();
        viewport.reset_zoom();
        assert!((viewport.scale() - DEFAULT_SCALE).abs() < TOLERANCE);
    }

    #[test]
    fn test_resize_resets_zoom_and_recenters() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.zoom_in();
        viewport.resize(400.0, 300.0);
        assert!((viewport.scale() - DEFAULT_SCALE).abs() < TOLERANCE);
        // cx = 200 → x = 200 * (1 - 0.7) = 60
        assert!((viewport.transform.x - 60.0).abs() < TOLERANCE);
    }
}
