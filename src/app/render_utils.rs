use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};

use crate::echo::Category;
use crate::util::SeededRandom;

const STAR_COUNT: usize = 90;
/// Weight beyond which nodes and edges stop growing.
pub(super) const MAX_VISUAL_WEIGHT: f32 = 4.0;

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(11, 14, 26));

    if rect.width() < 1.0 || rect.height() < 1.0 {
        return;
    }

    // Parallax: stars follow a fraction of the pan.
    let mut random = SeededRandom::new(0x5eed);
    let drift = pan * 0.15;
    for _ in 0..STAR_COUNT {
        let x = (random.next_unit() * rect.width() + drift.x).rem_euclid(rect.width());
        let y = (random.next_unit() * rect.height() + drift.y).rem_euclid(rect.height());
        let radius = (0.4 + random.next_unit() * 1.1) * zoom.clamp(0.6, 1.4);
        let alpha = (40.0 + random.next_unit() * 110.0) as u8;
        painter.circle_filled(
            rect.min + vec2(x, y),
            radius,
            Color32::from_rgba_unmultiplied(210, 225, 255, alpha),
        );
    }
}

pub(super) fn draw_orbit_guides(painter: &Painter, center: Pos2, zoom: f32, radii: &[f32]) {
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(120, 140, 190, 28));
    for radius in radii {
        painter.circle_stroke(center, radius * zoom, stroke);
    }
}

/// The painted area, used to skip shapes that cannot reach it.
#[derive(Clone, Copy, Debug)]
pub(super) struct ScreenClip {
    area: Rect,
}

impl ScreenClip {
    pub fn new(area: Rect) -> Self {
        Self { area }
    }

    pub fn shows_disc(&self, center: Pos2, radius: f32) -> bool {
        self.area.expand(radius.max(0.0)).contains(center)
    }

    /// Clips the segment against the padded area and reports whether any
    /// part of it survives.
    pub fn shows_segment(&self, start: Pos2, end: Pos2, padding: f32) -> bool {
        let area = self.area.expand(padding.max(0.0));
        let delta = end - start;
        let (mut enter, mut leave) = (0.0_f32, 1.0_f32);
        let bounds = [
            (-delta.x, start.x - area.left()),
            (delta.x, area.right() - start.x),
            (-delta.y, start.y - area.top()),
            (delta.y, area.bottom() - start.y),
        ];

        for (direction, room) in bounds {
            if direction == 0.0 {
                if room < 0.0 {
                    return false;
                }
                continue;
            }
            let t = room / direction;
            if direction < 0.0 {
                enter = enter.max(t);
            } else {
                leave = leave.min(t);
            }
            if enter > leave {
                return false;
            }
        }
        true
    }
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Pos2) -> Pos2 {
    let local_center = (rect.size() * 0.5).to_pos2();
    rect.center() + pan + (world - local_center) * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Pos2 {
    let local_center = (rect.size() * 0.5).to_pos2();
    local_center + (screen - rect.center() - pan) / zoom
}

pub(super) fn node_radius(category: Category, weight: f32) -> f32 {
    let base = match category {
        Category::Metaphor => 26.0,
        Category::Tag => 13.0,
        Category::Word => 7.0,
        Category::Echo => 14.0,
        Category::Style | Category::Usage => 11.0,
        Category::Other => 9.0,
    };
    base + weight.clamp(0.0, MAX_VISUAL_WEIGHT) * 1.5
}

pub(super) fn category_color(category: Category) -> Color32 {
    match category {
        Category::Metaphor => Color32::from_rgb(251, 191, 36),
        Category::Tag => Color32::from_rgb(96, 165, 250),
        Category::Word => Color32::from_rgb(148, 163, 184),
        Category::Echo => Color32::from_rgb(186, 230, 253),
        Category::Style => Color32::from_rgb(196, 181, 253),
        Category::Usage => Color32::from_rgb(134, 239, 172),
        Category::Other => Color32::from_rgb(203, 213, 225),
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (color.a() as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn screen_and_world_are_inverse() {
        let rect = Rect::from_min_size(pos2(5.0, 5.0), vec2(640.0, 480.0));
        let pan = vec2(-30.0, 12.0);
        let world = pos2(100.0, 250.0);
        let screen = world_to_screen(rect, pan, 1.7, world);
        assert!(screen_to_world(rect, pan, 1.7, screen).distance(world) < 0.001);
    }

    #[test]
    fn hubs_are_drawn_largest() {
        let hub = node_radius(Category::Metaphor, 1.0);
        for category in [Category::Tag, Category::Word, Category::Echo, Category::Other] {
            assert!(node_radius(category, 4.0) < hub);
        }
        assert_eq!(node_radius(Category::Word, f32::MAX), node_radius(Category::Word, 4.0));
    }

    #[test]
    fn clip_keeps_segments_that_cross_the_area() {
        let clip = ScreenClip::new(Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0)));
        assert!(clip.shows_segment(pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(clip.shows_segment(pos2(20.0, 20.0), pos2(30.0, 30.0), 0.0));
        assert!(!clip.shows_segment(pos2(-50.0, -50.0), pos2(-10.0, -20.0), 0.0));
        // Bounding boxes overlap but the diagonal misses the corner.
        assert!(!clip.shows_segment(pos2(-40.0, 90.0), pos2(90.0, 160.0), 0.0));
        assert!(clip.shows_segment(pos2(105.0, 50.0), pos2(105.0, 60.0), 6.0));
    }

    #[test]
    fn clip_keeps_discs_touching_the_area() {
        let clip = ScreenClip::new(Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0)));
        assert!(clip.shows_disc(pos2(105.0, 50.0), 10.0));
        assert!(!clip.shows_disc(pos2(130.0, 50.0), 10.0));
    }
}
