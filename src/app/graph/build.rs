use std::collections::{HashMap, HashSet};

use eframe::egui::{Pos2, Rect, Vec2, vec2};
use log::debug;

use crate::echo::{Category, GraphSnapshot, Node};
use crate::layout::{LayoutStrategy, anchor_id, orbital_positions, viewport_center};
use crate::util::stable_pair;

use super::super::camera::Camera;
use super::super::gesture::GestureRecognizer;
use super::super::highlight::{focus_satellites, search_matches};
use super::super::physics::{PhysicsConfig, SimLink, SimNode, Simulation};
use super::super::selection::{Selection, resonance_text};
use super::{DrillDown, GraphEngine, GraphHost, Platform, Resonance, SETTLE_TICKS};

const SEED_JITTER: f32 = 14.0;
const STABLE_ECHO_EMOJI: &str = "🫧";

fn jittered(position: Pos2, id: &str) -> Pos2 {
    let (jx, jy) = stable_pair(id);
    position + vec2(jx, jy) * SEED_JITTER
}

impl GraphEngine {
    pub(in crate::app) fn new(
        snapshot: GraphSnapshot,
        strategy: LayoutStrategy,
        physics_config: PhysicsConfig,
        platform: Platform,
        viewport: Vec2,
    ) -> Self {
        let viewport_read = viewport.x >= 1.0 && viewport.y >= 1.0;
        let mut engine = Self {
            source: snapshot,
            snapshot: GraphSnapshot::default(),
            stable_echoes: Vec::new(),
            echo_serial: 0,
            strategy,
            physics_config,
            simulation: None,
            positions: HashMap::new(),
            pins: HashMap::new(),
            gestures: GestureRecognizer::default(),
            selection: Selection::default(),
            focus: None,
            drill_down: None,
            resonance: None,
            camera: Camera::default(),
            rect: Rect::from_min_size(Pos2::ZERO, viewport),
            viewport,
            viewport_read,
            platform,
            search_query: String::new(),
            search_hits: HashSet::new(),
            frame_error: None,
            mouse_down: false,
        };
        engine.rebuild();
        engine
    }

    /// Replaces the graph. Pointer state and pins are dropped, interaction
    /// state pointing at vanished ids is pruned and reported.
    pub(in crate::app) fn set_snapshot(
        &mut self,
        snapshot: GraphSnapshot,
        host: &mut dyn GraphHost,
    ) {
        if snapshot == self.source {
            return;
        }

        debug!(
            "replacing snapshot: {} nodes, {} links",
            snapshot.nodes().len(),
            snapshot.links().len()
        );
        self.source = snapshot;
        self.gestures.teardown();
        self.mouse_down = false;
        self.pins.clear();
        self.rebuild();
        self.prune_interaction(host);
    }

    pub(in crate::app) fn set_strategy(&mut self, strategy: LayoutStrategy) {
        if self.strategy == strategy {
            return;
        }

        self.strategy = strategy;
        self.pins.clear();
        self.rebuild();
    }

    pub(in crate::app) fn set_physics_config(&mut self, config: PhysicsConfig) {
        self.physics_config = config;
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_config(config);
        }
    }

    pub(in crate::app) fn physics_config(&self) -> PhysicsConfig {
        self.physics_config
    }

    /// Turns the current resonance into a lasting echo node linked to the
    /// anchor. Returns the new node id.
    pub(in crate::app) fn stabilize_resonance(&mut self) -> Option<String> {
        let text = self.resonance.as_ref()?.text.clone();
        self.echo_serial += 1;
        let id = format!("resonance-{}", self.echo_serial);
        self.stable_echoes
            .push(Node::new(id.clone(), text, Category::Echo).with_emoji(STABLE_ECHO_EMOJI));
        self.rebuild();
        debug!("stabilized resonance as {id}");
        Some(id)
    }

    pub(super) fn rebuild(&mut self) {
        let anchor = anchor_id(self.source.nodes()).map(str::to_owned);
        self.snapshot = self
            .source
            .with_extra_nodes(&self.stable_echoes, anchor.as_deref());

        self.simulation = match self.strategy {
            LayoutStrategy::Physics if !self.snapshot.is_empty() => Some(self.build_simulation()),
            _ => None,
        };
        if let Some(drill_down) = self.drill_down.as_mut() {
            drill_down.satellites = focus_satellites(&self.snapshot, &drill_down.id);
        }
        self.refresh_search();
    }

    /// Seeds every node from its last drawn position, falling back to the
    /// orbital slot plus a per-id jitter so no two nodes start stacked.
    fn build_simulation(&self) -> Simulation {
        let center = viewport_center(self.viewport);
        let orbital = orbital_positions(self.snapshot.nodes(), self.viewport, 0.0);

        let nodes = self
            .snapshot
            .nodes()
            .iter()
            .map(|node| {
                let seed = self
                    .positions
                    .get(&node.id)
                    .copied()
                    .or_else(|| orbital.get(&node.id).map(|pos| jittered(*pos, &node.id)))
                    .unwrap_or(center);
                SimNode::new(node.id.clone(), seed, node.category, node.weight)
            })
            .collect::<Vec<_>>();

        let index_by_id = self.snapshot.index_by_id();
        let links = self
            .snapshot
            .links()
            .iter()
            .filter_map(|link| {
                Some(SimLink {
                    source: *index_by_id.get(link.source.as_str())?,
                    target: *index_by_id.get(link.target.as_str())?,
                    weight: link.weight,
                })
            })
            .collect::<Vec<_>>();

        let mut simulation = Simulation::new(nodes, links, center, self.physics_config);
        if !self.platform.animation {
            let ticks = simulation.settle(SETTLE_TICKS);
            debug!("static layout settled after {ticks} ticks");
        }
        simulation
    }

    pub(super) fn refresh_search(&mut self) {
        self.search_hits = search_matches(&self.snapshot, &self.search_query);
    }

    fn prune_interaction(&mut self, host: &mut dyn GraphHost) {
        let snapshot = &self.snapshot;
        if self
            .selection
            .retain_existing(|id| snapshot.node(id).is_some())
        {
            host.on_selection_change(self.selection.ids());
        }

        if let Some(focus) = &self.focus
            && self.snapshot.node(focus).is_none()
        {
            self.focus = None;
            self.leave_drill_down();
            host.on_focus_change(None);
        }

        self.sync_resonance(host);
    }

    /// Keeps the resonance in step with the selected pair and announces a
    /// newly formed pair.
    pub(super) fn sync_resonance(&mut self, host: &mut dyn GraphHost) {
        let pair = self.selection.pair().and_then(|(first, second)| {
            Some((self.snapshot.node(first)?, self.snapshot.node(second)?))
        });
        let Some((first, second)) = pair else {
            self.resonance = None;
            return;
        };

        let ids = [first.id.clone(), second.id.clone()];
        if self
            .resonance
            .as_ref()
            .is_some_and(|resonance| resonance.pair == ids)
        {
            return;
        }

        let text = resonance_text(first, second);
        host.on_pair_synthesized([first, second], &text);
        self.resonance = Some(Resonance { pair: ids, text });
    }

    pub(super) fn start_drill_down(&mut self, id: &str) {
        let return_scale = self
            .drill_down
            .as_ref()
            .map_or(self.camera.scale(), |drill| drill.return_scale);
        self.drill_down = Some(DrillDown {
            id: id.to_owned(),
            satellites: focus_satellites(&self.snapshot, id),
            return_scale,
        });
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::super::tests::{RecordingHost, engine_with, sample_snapshot};
    use super::*;
    use crate::echo::Link;

    #[test]
    fn replacing_snapshot_prunes_selection() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        let mut host = RecordingHost::default();
        engine.selection.toggle("b");
        engine.selection.toggle("w");
        engine.sync_resonance(&mut host);
        assert!(engine.resonance_text().is_some());

        let smaller = GraphSnapshot::new(
            vec![
                Node::new("a", "Eau", Category::Metaphor),
                Node::new("b", "flux", Category::Tag),
            ],
            vec![Link::new("a", "b", 1.0)],
        );
        engine.set_snapshot(smaller, &mut host);

        assert_eq!(engine.selection(), ["b"]);
        assert_eq!(host.selections, vec![vec!["b".to_owned()]]);
        assert!(engine.resonance_text().is_none());
    }

    #[test]
    fn identical_snapshot_is_a_no_op() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        let mut host = RecordingHost::default();
        engine.focus = Some("b".to_owned());
        engine.set_snapshot(sample_snapshot(), &mut host);
        assert_eq!(engine.focus(), Some("b"));
        assert!(host.focus.is_empty());
    }

    #[test]
    fn vanished_focus_is_cleared() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        let mut host = RecordingHost::default();
        engine.focus = Some("c".to_owned());
        engine.set_snapshot(GraphSnapshot::default(), &mut host);
        assert_eq!(engine.focus(), None);
        assert_eq!(host.focus, vec![None]);
    }

    #[test]
    fn physics_reuses_prior_positions() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        engine.positions.insert("a".to_owned(), pos2(123.0, 456.0));
        engine.set_strategy(LayoutStrategy::Physics);
        engine.layout_frame(0.0).unwrap();

        let a = engine.position("a").unwrap();
        assert!(a.distance(pos2(123.0, 456.0)) < 60.0);
        assert_eq!(engine.positions().len(), 4);
    }

    #[test]
    fn stabilized_resonance_becomes_echo_node() {
        let mut engine = engine_with(sample_snapshot(), LayoutStrategy::Orbital, Platform::default());
        let mut host = RecordingHost::default();
        assert!(engine.stabilize_resonance().is_none());

        engine.selection.toggle("a");
        engine.selection.toggle("w");
        engine.sync_resonance(&mut host);
        let id = engine.stabilize_resonance().unwrap();

        let node = engine.snapshot().node(&id).unwrap();
        assert_eq!(node.category, Category::Echo);
        assert_eq!(Some(node.label.as_str()), engine.resonance_text());
        assert!(engine.snapshot().links().iter().any(|link| link.touches(&id)));

        // Echoes survive a new snapshot from the host.
        let replacement = GraphSnapshot::new(vec![Node::new("z", "z", Category::Word)], vec![]);
        engine.set_snapshot(replacement, &mut host);
        assert!(engine.snapshot().node(&id).is_some());
        assert_eq!(engine.stable_echo_count(), 1);
    }
}
