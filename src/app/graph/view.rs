use std::time::Duration;

use anyhow::{Result, bail};
use eframe::egui::{self, Align2, Color32, Context, FontId, Painter, Sense, Stroke, Ui, vec2};
use log::error;

use crate::layout::{LayoutStrategy, RING_ORDER, orbit_radius, viewport_center};
use crate::util::truncate_label;

use super::super::gesture::PointerTarget;
use super::super::highlight::{edge_visual, node_visual};
use super::super::render_utils::{
    ScreenClip, category_color, draw_background, draw_orbit_guides, with_opacity,
};
use super::interaction::OVERLAY_RADIUS;
use super::{GraphEngine, GraphHost};

const PLACEHOLDER: &str = "Aucun écho pour l'instant. Écris quelques mots pour réveiller la bulle.";
const FALLBACK: &str = "La scène n'a pas pu être dessinée. Nouvel essai à la prochaine image.";
const LABEL_MAX_CHARS: usize = 18;

const EDGE_COLOR: Color32 = Color32::from_rgb(165, 180, 252);
const NODE_STROKE: Color32 = Color32::from_rgb(15, 23, 42);
const LABEL_COLOR: Color32 = Color32::from_gray(236);
const SEARCH_RING: Color32 = Color32::from_rgb(103, 196, 255);
const OVERLAY_FILL: Color32 = Color32::from_rgba_premultiplied(159, 159, 166, 166);
const BADGE_COLOR: Color32 = Color32::from_rgb(251, 191, 36);

impl GraphEngine {
    /// Shown instead of the scene while there is nothing to lay out.
    pub(in crate::app) fn placeholder_text(&self) -> Option<&'static str> {
        self.snapshot.is_empty().then_some(PLACEHOLDER)
    }

    pub(in crate::app) fn degraded_badge(&self) -> Option<&'static str> {
        if !self.platform.is_degraded() {
            return None;
        }
        Some(match (self.platform.animation, self.platform.resize) {
            (false, false) => "mode dégradé : statique, taille figée",
            (false, true) => "mode dégradé : mise en page statique",
            _ => "mode dégradé : taille figée",
        })
    }

    /// Allocates the scene, routes this frame's input, lays out and paints.
    /// A failing frame is replaced by a fallback message and retried on the
    /// next one.
    pub(in crate::app) fn show(&mut self, ui: &mut Ui, host: &mut dyn GraphHost) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.rect = rect;
        self.set_viewport(rect.size());

        let now_ms = ui.input(|input| input.time) * 1000.0;
        for event in self.collect_pointer_events(ui, rect, now_ms) {
            self.handle_pointer(event, host);
        }
        self.poll(now_ms, host);

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            let anchor = ui
                .input(|input| input.pointer.hover_pos())
                .unwrap_or_else(|| rect.center());
            self.zoom_wheel(anchor, scroll);
        }

        if let Some(hover) = response.hover_pos()
            && matches!(self.target_at(hover), PointerTarget::Node(_) | PointerTarget::Overlay)
        {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let painter = ui.painter_at(rect);
        let frame = self
            .layout_frame(now_ms)
            .and_then(|()| self.render_frame(&painter, now_ms));
        match frame {
            Ok(()) => self.frame_error = None,
            Err(err) => {
                if self.frame_error.is_none() {
                    error!("dropping scene frame: {err:#}");
                }
                self.frame_error = Some(format!("{err:#}"));
                self.positions.clear();
                draw_background(&painter, rect, self.camera.translate(), self.camera.scale());
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    FALLBACK,
                    FontId::proportional(15.0),
                    LABEL_COLOR,
                );
            }
        }

        self.schedule_repaint(ui.ctx(), now_ms);
    }

    fn render_frame(&self, painter: &Painter, now_ms: f64) -> Result<()> {
        let rect = self.rect;
        let scale = self.camera.scale();
        draw_background(painter, rect, self.camera.translate(), scale);

        if let Some(placeholder) = self.placeholder_text() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                placeholder,
                FontId::proportional(16.0),
                LABEL_COLOR,
            );
            self.paint_badge(painter);
            return Ok(());
        }

        if self.strategy == LayoutStrategy::Orbital {
            let radii = RING_ORDER
                .into_iter()
                .filter(|category| {
                    self.snapshot
                        .nodes()
                        .iter()
                        .any(|node| node.category == *category)
                })
                .map(orbit_radius)
                .collect::<Vec<_>>();
            let center = self.to_screen(viewport_center(self.viewport));
            draw_orbit_guides(painter, center, scale, &radii);
        }

        let clip = ScreenClip::new(rect);
        let emphasis = self.emphasis();
        for link in self.snapshot.links() {
            let (Some(source), Some(target)) = (
                self.positions.get(&link.source),
                self.positions.get(&link.target),
            ) else {
                bail!("link {} -> {} has no position", link.source, link.target);
            };
            let start = self.to_screen(*source);
            let end = self.to_screen(*target);
            if !clip.shows_segment(start, end, 2.0) {
                continue;
            }

            let visual = edge_visual(link, emphasis);
            painter.line_segment(
                [start, end],
                Stroke::new(visual.width * scale, with_opacity(EDGE_COLOR, visual.opacity)),
            );
        }

        let time_ms = self.platform.animation.then_some(now_ms);
        for node in self.snapshot.nodes() {
            let Some(position) = self.positions.get(&node.id) else {
                bail!("node {} has no position", node.id);
            };
            let center = self.to_screen(*position);
            let visual = node_visual(node, emphasis, time_ms);
            let radius = visual.radius.max(1.0) * scale;
            if !clip.shows_disc(center, radius + visual.stroke) {
                continue;
            }

            painter.circle_filled(
                center,
                radius,
                with_opacity(category_color(node.category), visual.opacity),
            );
            painter.circle_stroke(
                center,
                radius,
                Stroke::new(
                    visual.stroke * 0.5 * scale,
                    with_opacity(NODE_STROKE, visual.opacity),
                ),
            );
            if self.search_hits.contains(&node.id) {
                painter.circle_stroke(center, radius + 5.0, Stroke::new(2.0, SEARCH_RING));
            }

            if let Some(emoji) = &node.emoji {
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    emoji,
                    FontId::proportional((radius * 1.1).max(8.0)),
                    Color32::WHITE,
                );
            }
            painter.text(
                center + vec2(0.0, radius + 4.0),
                Align2::CENTER_TOP,
                truncate_label(&node.label, LABEL_MAX_CHARS),
                FontId::proportional(12.0),
                with_opacity(LABEL_COLOR, visual.opacity),
            );
        }

        if let Some(center) = self.overlay_center()
            && let Some(text) = self.resonance_text()
        {
            let radius = OVERLAY_RADIUS * scale;
            painter.circle_filled(center, radius, OVERLAY_FILL);
            painter.text(
                center,
                Align2::CENTER_CENTER,
                "✨",
                FontId::proportional(radius),
                Color32::BLACK,
            );
            painter.text(
                center + vec2(0.0, radius + 6.0),
                Align2::CENTER_TOP,
                text,
                FontId::proportional(13.0),
                LABEL_COLOR,
            );
        }

        self.paint_badge(painter);
        Ok(())
    }

    fn paint_badge(&self, painter: &Painter) {
        if let Some(badge) = self.degraded_badge() {
            painter.text(
                self.rect.right_top() + vec2(-10.0, 10.0),
                Align2::RIGHT_TOP,
                badge,
                FontId::proportional(12.0),
                BADGE_COLOR,
            );
        }
    }

    /// Keeps frames coming while the scene moves; otherwise wakes up only for
    /// the next long-press deadline.
    fn schedule_repaint(&self, ctx: &Context, now_ms: f64) {
        let moving = self.platform.animation && !self.snapshot.is_empty();
        if moving || !self.is_settled() {
            ctx.request_repaint();
        } else if let Some(deadline) = self.next_deadline() {
            let wait = ((deadline - now_ms) / 1000.0).max(0.0);
            ctx.request_repaint_after(Duration::from_secs_f64(wait));
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{CentralPanel, RawInput, pos2};

    use super::super::Platform;
    use super::super::tests::{RecordingHost, engine_with, sample_snapshot};
    use super::*;
    use crate::echo::GraphSnapshot;

    fn run_frame(engine: &mut GraphEngine, host: &mut RecordingHost) {
        let ctx = Context::default();
        let _ = ctx.run(RawInput::default(), |ctx| {
            CentralPanel::default().show(ctx, |ui| engine.show(ui, host));
        });
    }

    #[test]
    fn healthy_frame_paints_without_error() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        let mut host = RecordingHost::default();
        run_frame(&mut engine, &mut host);
        assert_eq!(engine.frame_error(), None);
        assert_eq!(engine.positions().len(), 4);
    }

    #[test]
    fn broken_frame_falls_back_and_recovers() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        let mut host = RecordingHost::default();
        engine.pins.insert("w".to_owned(), pos2(f32::NAN, 0.0));
        run_frame(&mut engine, &mut host);
        assert!(engine.frame_error().is_some_and(|err| err.contains('w')));
        assert!(engine.positions().is_empty());

        engine.pins.clear();
        run_frame(&mut engine, &mut host);
        assert_eq!(engine.frame_error(), None);
    }

    #[test]
    fn placeholder_only_for_empty_graphs() {
        let engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        assert!(engine.placeholder_text().is_none());
        assert!(engine.degraded_badge().is_none());

        let mut empty = engine_with(
            GraphSnapshot::default(),
            LayoutStrategy::Orbital,
            Platform::default(),
        );
        let mut host = RecordingHost::default();
        run_frame(&mut empty, &mut host);
        assert!(empty.placeholder_text().is_some());
        assert_eq!(empty.frame_error(), None);
    }
}
