use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use clap::ValueEnum;
use eframe::egui::{Pos2, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

use crate::echo::{Category, Node};

pub type PositionMap = HashMap<String, Pos2>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Deterministic rings keyed by category.
    #[default]
    Orbital,
    /// Iterative force simulation.
    Physics,
}

impl LayoutStrategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Orbital => "Orbital",
            Self::Physics => "Physics",
        }
    }
}

const CENTER_RING_RADIUS: f32 = 28.0;
const WOBBLE_AMPLITUDE: f32 = 2.8;
const FOCUS_ORBIT_RADIUS: f32 = 70.0;
const FOCUS_ORBIT_SWAY: f32 = 6.0;

/// Orbit rings from the innermost outwards.
pub const RING_ORDER: [Category; 6] = [
    Category::Tag,
    Category::Word,
    Category::Style,
    Category::Echo,
    Category::Usage,
    Category::Other,
];

pub fn orbit_radius(category: Category) -> f32 {
    match category {
        Category::Metaphor => 0.0,
        Category::Tag => 80.0,
        Category::Word => 130.0,
        Category::Style => 175.0,
        Category::Echo => 220.0,
        Category::Usage => 265.0,
        Category::Other => 310.0,
    }
}

/// The node placed at the center: the first metaphor, else the first node.
pub fn anchor_id(nodes: &[Node]) -> Option<&str> {
    nodes
        .iter()
        .find(|node| node.category == Category::Metaphor)
        .or_else(|| nodes.first())
        .map(|node| node.id.as_str())
}

/// Radius offset in `[-2·A, 2·A]`, smooth in time.
fn wobble(index: usize, time_ms: f64) -> f32 {
    let index = index as f64;
    let value = (time_ms * 0.0012 + index).sin() + (time_ms * 0.0008 + index * 1.3).cos();
    value as f32 * WOBBLE_AMPLITUDE
}

fn ring_point(center: Pos2, radius: f32, index: usize, count: usize) -> Pos2 {
    let angle = TAU * index as f32 / count.max(1) as f32 - FRAC_PI_2;
    center + vec2(angle.cos(), angle.sin()) * radius
}

pub fn viewport_center(viewport: Vec2) -> Pos2 {
    pos2(viewport.x * 0.5, viewport.y * 0.5)
}

pub fn orbital_positions(nodes: &[Node], viewport: Vec2, time_ms: f64) -> PositionMap {
    let mut positions = PositionMap::with_capacity(nodes.len());
    let Some(anchor) = anchor_id(nodes) else {
        return positions;
    };
    let center = viewport_center(viewport);

    let metaphors = nodes
        .iter()
        .filter(|node| node.category == Category::Metaphor)
        .collect::<Vec<_>>();
    if metaphors.len() > 1 {
        for (index, node) in metaphors.iter().enumerate() {
            let radius = CENTER_RING_RADIUS + wobble(index, time_ms);
            positions.insert(
                node.id.clone(),
                ring_point(center, radius, index, metaphors.len()),
            );
        }
    } else {
        positions.insert(anchor.to_owned(), center);
    }

    for category in RING_ORDER {
        let members = nodes
            .iter()
            .filter(|node| node.category == category && node.id != anchor)
            .collect::<Vec<_>>();
        for (index, node) in members.iter().enumerate() {
            let radius = orbit_radius(category) + wobble(index, time_ms);
            positions.insert(node.id.clone(), ring_point(center, radius, index, members.len()));
        }
    }

    positions
}

/// Moves `satellites` onto a rotating orbit around the focused node.
pub fn apply_focus_orbit(
    positions: &mut PositionMap,
    focus_id: &str,
    satellites: &[String],
    time_ms: f64,
) {
    let Some(&focus) = positions.get(focus_id) else {
        return;
    };

    let total = satellites.len().max(1) as f64;
    for (index, id) in satellites.iter().enumerate() {
        let Some(position) = positions.get_mut(id) else {
            continue;
        };
        let angle = (std::f64::consts::TAU * index as f64 / total + time_ms * 0.0012) as f32;
        let radius =
            FOCUS_ORBIT_RADIUS + ((time_ms * 0.001 + index as f64).sin() as f32) * FOCUS_ORBIT_SWAY;
        *position = focus + vec2(angle.cos(), angle.sin()) * radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Vec2 {
        vec2(800.0, 600.0)
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(orbital_positions(&[], viewport(), 0.0).is_empty());
        assert!(anchor_id(&[]).is_none());
    }

    #[test]
    fn single_node_sits_at_center() {
        let nodes = [Node::new("w", "pluie", Category::Word)];
        let positions = orbital_positions(&nodes, viewport(), 1234.0);
        assert_eq!(positions["w"], pos2(400.0, 300.0));
    }

    #[test]
    fn metaphor_center_and_tag_at_top_of_ring() {
        let nodes = [
            Node::new("a", "Eau", Category::Metaphor),
            Node::new("b", "flux", Category::Tag),
        ];
        let positions = orbital_positions(&nodes, viewport(), 0.0);

        assert_eq!(positions["a"], pos2(400.0, 300.0));
        let b = positions["b"];
        assert!((b.x - 400.0).abs() < 0.001);
        let radius = 300.0 - b.y;
        assert!((radius - orbit_radius(Category::Tag)).abs() <= 2.0 * WOBBLE_AMPLITUDE);
    }

    #[test]
    fn first_node_anchors_when_no_metaphor() {
        let nodes = [
            Node::new("x", "un", Category::Word),
            Node::new("y", "deux", Category::Word),
            Node::new("z", "trois", Category::Tag),
        ];
        assert_eq!(anchor_id(&nodes), Some("x"));

        let positions = orbital_positions(&nodes, viewport(), 500.0);
        assert_eq!(positions.len(), 3);
        assert_eq!(positions["x"], pos2(400.0, 300.0));
        let y_radius = positions["y"].distance(pos2(400.0, 300.0));
        assert!((y_radius - orbit_radius(Category::Word)).abs() <= 2.0 * WOBBLE_AMPLITUDE);
    }

    #[test]
    fn several_metaphors_ring_the_center() {
        let nodes = [
            Node::new("m1", "Eau", Category::Metaphor),
            Node::new("m2", "Feu", Category::Metaphor),
        ];
        let positions = orbital_positions(&nodes, viewport(), 0.0);
        let center = pos2(400.0, 300.0);
        for id in ["m1", "m2"] {
            let distance = positions[id].distance(center);
            assert!(distance > 0.0 && distance <= CENTER_RING_RADIUS + 2.0 * WOBBLE_AMPLITUDE);
        }
    }

    #[test]
    fn wobble_stays_small() {
        for index in 0..16 {
            for step in 0..200 {
                assert!(wobble(index, step as f64 * 37.0).abs() <= 2.0 * WOBBLE_AMPLITUDE);
            }
        }
    }

    #[test]
    fn ring_gaps_exceed_wobble() {
        for pair in RING_ORDER.windows(2) {
            let gap = orbit_radius(pair[1]) - orbit_radius(pair[0]);
            assert!(gap > 4.0 * WOBBLE_AMPLITUDE);
        }
    }

    #[test]
    fn focus_orbit_circles_the_focus() {
        let mut positions = PositionMap::new();
        positions.insert("hub".to_owned(), pos2(100.0, 100.0));
        positions.insert("tag".to_owned(), pos2(0.0, 0.0));
        apply_focus_orbit(&mut positions, "hub", &["tag".to_owned()], 0.0);

        let distance = positions["tag"].distance(pos2(100.0, 100.0));
        assert!((distance - FOCUS_ORBIT_RADIUS).abs() <= FOCUS_ORBIT_SWAY);
    }
}
