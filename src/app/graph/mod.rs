use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use eframe::egui::{Pos2, Rect, Vec2};

use crate::echo::{GraphSnapshot, Node};
use crate::layout::{
    LayoutStrategy, PositionMap, apply_focus_orbit, orbital_positions, viewport_center,
};

use super::camera::Camera;
use super::gesture::GestureRecognizer;
use super::highlight::Emphasis;
use super::physics::{PhysicsConfig, Simulation};
use super::selection::Selection;

mod build;
mod interaction;
mod view;

/// Upper bound on synchronous ticks when the scene cannot animate.
const SETTLE_TICKS: usize = 600;

/// Receives interaction outcomes from the engine. Every method has an empty
/// default so hosts only implement what they care about.
pub(in crate::app) trait GraphHost {
    fn on_focus_change(&mut self, _node: Option<&Node>) {}
    fn on_selection_change(&mut self, _ids: &[String]) {}
    fn on_empty_tap(&mut self) {}
    fn on_reset(&mut self) {}
    fn on_pair_synthesized(&mut self, _pair: [&Node; 2], _text: &str) {}
}

/// Platform primitives the scene can rely on. A missing one degrades the
/// scene instead of failing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Platform {
    /// Continuous frame callbacks; without them the layout is computed once.
    pub animation: bool,
    /// Viewport size changes; without them the first size read is kept.
    pub resize: bool,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            animation: true,
            resize: true,
        }
    }
}

impl Platform {
    pub fn is_degraded(self) -> bool {
        !self.animation || !self.resize
    }
}

#[derive(Clone, Debug, PartialEq)]
struct DrillDown {
    id: String,
    satellites: Vec<String>,
    /// Camera scale to go back to when the drill-down ends.
    return_scale: f32,
}

#[derive(Clone, Debug, PartialEq)]
struct Resonance {
    pair: [String; 2],
    text: String,
}

pub(in crate::app) struct GraphEngine {
    source: GraphSnapshot,
    snapshot: GraphSnapshot,
    stable_echoes: Vec<Node>,
    echo_serial: u64,
    strategy: LayoutStrategy,
    physics_config: PhysicsConfig,
    simulation: Option<Simulation>,
    positions: PositionMap,
    pins: HashMap<String, Pos2>,
    gestures: GestureRecognizer,
    selection: Selection,
    focus: Option<String>,
    drill_down: Option<DrillDown>,
    resonance: Option<Resonance>,
    camera: Camera,
    rect: Rect,
    viewport: Vec2,
    viewport_read: bool,
    platform: Platform,
    search_query: String,
    search_hits: HashSet<String>,
    frame_error: Option<String>,
    mouse_down: bool,
}

impl GraphEngine {
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    #[cfg(test)]
    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn position(&self, id: &str) -> Option<Pos2> {
        self.positions.get(id).copied()
    }

    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    #[cfg(test)]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[cfg(test)]
    pub fn selection(&self) -> &[String] {
        self.selection.ids()
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn resonance_text(&self) -> Option<&str> {
        self.resonance.as_ref().map(|resonance| resonance.text.as_str())
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn frame_error(&self) -> Option<&str> {
        self.frame_error.as_deref()
    }

    pub fn stable_echo_count(&self) -> usize {
        self.stable_echoes.len()
    }

    pub fn is_settled(&self) -> bool {
        self.simulation
            .as_ref()
            .is_none_or(|simulation| !simulation.is_running())
    }

    fn emphasis(&self) -> Emphasis<'_> {
        if let Some((first, second)) = self.selection.pair() {
            return Emphasis::Pair(first, second);
        }
        if let Some(drill_down) = &self.drill_down {
            return Emphasis::Focus {
                id: &drill_down.id,
                satellites: &drill_down.satellites,
            };
        }
        match &self.focus {
            Some(id) => Emphasis::Focus { id, satellites: &[] },
            None => Emphasis::Rest,
        }
    }

    /// Computes this frame's positions with the active strategy. Fails when
    /// any position is not finite so the frame can be dropped as a whole.
    pub fn layout_frame(&mut self, time_ms: f64) -> Result<()> {
        let time_ms = if self.platform.animation { time_ms } else { 0.0 };

        match self.strategy {
            LayoutStrategy::Orbital => {
                self.positions = orbital_positions(self.snapshot.nodes(), self.viewport, time_ms);
                for (id, pinned) in &self.pins {
                    if let Some(position) = self.positions.get_mut(id) {
                        *position = *pinned;
                    }
                }
            }
            LayoutStrategy::Physics => match self.simulation.as_mut() {
                Some(simulation) => {
                    if self.platform.animation {
                        simulation.tick();
                    } else if simulation.is_running() {
                        simulation.settle(SETTLE_TICKS);
                    }
                    simulation.write_positions(&mut self.positions);
                }
                None => self.positions.clear(),
            },
        }

        if let Some(drill_down) = &self.drill_down {
            apply_focus_orbit(
                &mut self.positions,
                &drill_down.id,
                &drill_down.satellites,
                time_ms,
            );
        }

        if let Some((id, position)) = self
            .positions
            .iter()
            .find(|(_, position)| !position.x.is_finite() || !position.y.is_finite())
        {
            bail!("node {id} has a non-finite position {position:?}");
        }
        Ok(())
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        if !size.x.is_finite() || !size.y.is_finite() || size.x < 1.0 || size.y < 1.0 {
            return;
        }
        if self.viewport_read && (!self.platform.resize || size == self.viewport) {
            return;
        }

        let first_read = !self.viewport_read;
        self.viewport = size;
        self.viewport_read = true;
        if first_read {
            self.rebuild();
        } else if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_center(viewport_center(size));
            simulation.reheat(0.3);
        }
    }

    pub fn set_search(&mut self, query: &str) {
        if self.search_query != query {
            self.search_query = query.to_owned();
            self.refresh_search();
        }
    }

    pub fn search_hit_count(&self) -> usize {
        self.search_hits.len()
    }
}

impl Drop for GraphEngine {
    fn drop(&mut self) {
        self.gestures.teardown();
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.unpin_all();
            simulation.stop();
        }
    }
}

#[cfg(test)]
pub(in crate::app) mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;
    use crate::app::gesture::{PointerEvent, PointerPhase};
    use crate::echo::{Category, Link};

    #[derive(Default)]
    pub(in crate::app) struct RecordingHost {
        pub focus: Vec<Option<String>>,
        pub selections: Vec<Vec<String>>,
        pub empty_taps: usize,
        pub resets: usize,
        pub pairs: Vec<([String; 2], String)>,
    }

    impl GraphHost for RecordingHost {
        fn on_focus_change(&mut self, node: Option<&Node>) {
            self.focus.push(node.map(|node| node.id.clone()));
        }

        fn on_selection_change(&mut self, ids: &[String]) {
            self.selections.push(ids.to_vec());
        }

        fn on_empty_tap(&mut self) {
            self.empty_taps += 1;
        }

        fn on_reset(&mut self) {
            self.resets += 1;
        }

        fn on_pair_synthesized(&mut self, pair: [&Node; 2], text: &str) {
            self.pairs
                .push(([pair[0].id.clone(), pair[1].id.clone()], text.to_owned()));
        }
    }

    pub(in crate::app) fn sample_snapshot() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Node::new("a", "Eau", Category::Metaphor).with_emoji("💧"),
                Node::new("b", "flux", Category::Tag),
                Node::new("c", "marée", Category::Tag),
                Node::new("w", "pluie", Category::Word),
            ],
            vec![
                Link::new("a", "b", 1.0),
                Link::new("a", "c", 1.0),
                Link::new("a", "w", 2.0),
                Link::new("w", "zzz", 1.0),
            ],
        )
    }

    pub(in crate::app) fn engine_with(
        snapshot: GraphSnapshot,
        strategy: LayoutStrategy,
        platform: Platform,
    ) -> GraphEngine {
        let mut engine = GraphEngine::new(
            snapshot,
            strategy,
            PhysicsConfig::default(),
            platform,
            vec2(800.0, 600.0),
        );
        engine.layout_frame(0.0).unwrap();
        engine
    }

    pub(in crate::app) fn press(
        engine: &mut GraphEngine,
        host: &mut RecordingHost,
        pos: Pos2,
        down_ms: f64,
        up_ms: f64,
    ) {
        for (phase, time_ms) in [(PointerPhase::Down, down_ms), (PointerPhase::Up, up_ms)] {
            engine.handle_pointer(
                PointerEvent {
                    pointer_id: 0,
                    phase,
                    pos,
                    time_ms,
                },
                host,
            );
        }
    }

    #[test]
    fn dangling_link_never_reaches_the_scene() {
        let engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        assert_eq!(engine.snapshot().links().len(), 3);
        for link in engine.snapshot().links() {
            assert!(engine.position(&link.source).is_some());
            assert!(engine.position(&link.target).is_some());
        }
        assert!(engine.position("zzz").is_none());
    }

    #[test]
    fn anchor_sits_at_viewport_center() {
        let engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        assert_eq!(engine.position("a"), Some(pos2(400.0, 300.0)));
        assert_eq!(engine.positions().len(), 4);
    }

    #[test]
    fn empty_snapshot_shows_placeholder() {
        let mut engine = engine_with(
            GraphSnapshot::default(),
            LayoutStrategy::Physics,
            Platform::default(),
        );
        engine.layout_frame(16.0).unwrap();
        assert!(engine.positions().is_empty());
        assert!(engine.placeholder_text().is_some());
    }

    #[test]
    fn physics_positions_stay_finite() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Physics, Platform::default());
        for frame in 0..400 {
            engine.layout_frame(frame as f64 * 16.0).unwrap();
        }
        assert!(engine.is_settled());
        assert_eq!(engine.positions().len(), 4);
    }

    #[test]
    fn missing_animation_settles_synchronously() {
        let platform = Platform {
            animation: false,
            resize: true,
        };
        let engine = engine_with(sample_snapshot(), LayoutStrategy::Physics, platform);
        assert!(engine.is_settled());
        assert!(engine.platform().is_degraded());
        assert!(engine.degraded_badge().is_some());
    }

    #[test]
    fn frozen_viewport_ignores_resizes() {
        let platform = Platform {
            animation: true,
            resize: false,
        };
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, platform);
        engine.set_viewport(vec2(1200.0, 900.0));
        engine.layout_frame(0.0).unwrap();
        assert_eq!(engine.position("a"), Some(pos2(400.0, 300.0)));

        let mut resizable =
            engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        resizable.set_viewport(vec2(1200.0, 900.0));
        resizable.layout_frame(0.0).unwrap();
        assert_eq!(resizable.position("a"), Some(pos2(600.0, 450.0)));
    }

    #[test]
    fn orbital_drag_pins_until_release() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        let mut host = RecordingHost::default();
        let start = engine.position("w").unwrap();
        let target = pos2(100.0, 100.0);

        for (phase, pos, time_ms) in [
            (PointerPhase::Down, start, 0.0),
            (PointerPhase::Move, target, 20.0),
        ] {
            engine.handle_pointer(
                PointerEvent {
                    pointer_id: 0,
                    phase,
                    pos,
                    time_ms,
                },
                &mut host,
            );
        }
        engine.layout_frame(40.0).unwrap();
        assert_eq!(engine.position("w"), Some(target));

        engine.handle_pointer(
            PointerEvent {
                pointer_id: 0,
                phase: PointerPhase::Up,
                pos: target,
                time_ms: 60.0,
            },
            &mut host,
        );
        engine.layout_frame(80.0).unwrap();
        assert_ne!(engine.position("w"), Some(target));
        assert!(host.focus.is_empty());
    }
}
