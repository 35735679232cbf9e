use eframe::egui::{Pos2, Rect, Vec2};

use super::render_utils::{screen_to_world, world_to_screen};

const MIN_SCALE: f32 = 0.6;
const MAX_SCALE: f32 = 2.2;
const WHEEL_SENSITIVITY: f32 = 0.0018;

#[derive(Clone, Copy, Debug, PartialEq)]
struct PinchStart {
    scale: f32,
    distance: f32,
}

/// Scale and translation applied on top of the layout's viewport space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Camera {
    scale: f32,
    translate: Vec2,
    pinch: Option<PinchStart>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::ZERO,
            pinch: None,
        }
    }
}

impl Camera {
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.x.is_finite() && delta.y.is_finite() {
            self.translate += delta;
        }
    }

    pub fn begin_pinch(&mut self, distance: f32) {
        self.pinch = (distance.is_finite() && distance > f32::EPSILON).then_some(PinchStart {
            scale: self.scale,
            distance,
        });
    }

    /// Scale becomes `initial · distance / initial_distance`, clamped.
    pub fn update_pinch(&mut self, distance: f32) -> f32 {
        if let Some(start) = self.pinch {
            self.set_scale(start.scale * (distance / start.distance));
        }
        self.scale
    }

    pub fn end_pinch(&mut self) {
        self.pinch = None;
    }

    /// Wheel zoom that keeps the world point under `anchor` fixed on screen.
    pub fn zoom_wheel(&mut self, rect: Rect, anchor: Pos2, scroll: f32) {
        if scroll.abs() <= f32::EPSILON || !scroll.is_finite() {
            return;
        }

        let world_before = self.screen_to_world(rect, anchor);
        let factor = (1.0 + scroll * WHEEL_SENSITIVITY).clamp(0.85, 1.15);
        self.set_scale(self.scale * factor);
        let drift = anchor - self.world_to_screen(rect, world_before);
        self.translate += drift;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn world_to_screen(&self, rect: Rect, world: Pos2) -> Pos2 {
        world_to_screen(rect, self.translate, self.scale, world)
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Pos2 {
        screen_to_world(rect, self.translate, self.scale, screen)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn rect() -> Rect {
        Rect::from_min_size(pos2(10.0, 20.0), vec2(800.0, 600.0))
    }

    #[test]
    fn pinch_scales_by_distance_ratio() {
        let mut camera = Camera::default();
        camera.begin_pinch(100.0);
        assert!((camera.update_pinch(150.0) - 1.5).abs() < 1e-6);
        assert!((camera.update_pinch(120.0) - 1.2).abs() < 1e-6);
        camera.end_pinch();
        assert!((camera.update_pinch(400.0) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn pinch_is_clamped() {
        let mut camera = Camera::default();
        camera.begin_pinch(100.0);
        assert_eq!(camera.update_pinch(1_000.0), MAX_SCALE);
        assert_eq!(camera.update_pinch(10.0), MIN_SCALE);
        camera.set_scale(f32::NAN);
        assert_eq!(camera.scale(), MIN_SCALE);
    }

    #[test]
    fn identity_maps_viewport_onto_rect() {
        let camera = Camera::default();
        assert_eq!(camera.world_to_screen(rect(), pos2(400.0, 300.0)), pos2(410.0, 320.0));
        assert_eq!(camera.screen_to_world(rect(), pos2(10.0, 20.0)), pos2(0.0, 0.0));
    }

    #[test]
    fn wheel_zoom_keeps_anchor_fixed() {
        let mut camera = Camera::default();
        let anchor = pos2(600.0, 200.0);
        let world = camera.screen_to_world(rect(), anchor);
        camera.zoom_wheel(rect(), anchor, 80.0);

        assert!(camera.scale() > 1.0);
        assert!(camera.world_to_screen(rect(), world).distance(anchor) < 0.01);
    }

    #[test]
    fn reset_restores_identity() {
        let mut camera = Camera::default();
        camera.pan_by(vec2(30.0, -12.0));
        camera.set_scale(2.0);
        camera.reset();
        assert_eq!(camera, Camera::default());
    }
}
