use crate::echo::{Category, Link, Node};

mod collect;

pub(super) use self::collect::{focus_satellites, search_matches};
use super::render_utils::{MAX_VISUAL_WEIGHT, node_radius};

const PULSE_AMPLITUDE: f32 = 2.5;
const PULSE_RATE: f64 = 0.002;

/// What the scene is currently emphasizing. A selected pair wins over focus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Emphasis<'a> {
    Rest,
    Focus {
        id: &'a str,
        satellites: &'a [String],
    },
    Pair(&'a str, &'a str),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct EdgeVisual {
    pub opacity: f32,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct NodeVisual {
    pub opacity: f32,
    pub stroke: f32,
    pub radius: f32,
}

pub(super) fn edge_visual(link: &Link, emphasis: Emphasis<'_>) -> EdgeVisual {
    let weight = link.weight.clamp(0.0, MAX_VISUAL_WEIGHT);
    let (opacity, width) = match emphasis {
        Emphasis::Rest => (0.45, (0.8 * weight).max(1.0)),
        Emphasis::Focus { id, .. } => {
            if link.touches(id) {
                (0.95, (1.1 * weight).max(1.4))
            } else {
                (0.08, 0.8)
            }
        }
        Emphasis::Pair(first, second) => {
            let joins = (link.source == first && link.target == second)
                || (link.source == second && link.target == first);
            if joins {
                (0.95, (1.25 * weight).max(1.8))
            } else if link.touches(first) || link.touches(second) {
                (0.35, (0.9 * weight).max(1.2))
            } else {
                (0.05, 0.6)
            }
        }
    };
    EdgeVisual { opacity, width }
}

fn base_opacity(category: Category) -> f32 {
    if category == Category::Echo { 0.65 } else { 0.95 }
}

fn base_stroke(category: Category) -> f32 {
    if category == Category::Metaphor { 6.0 } else { 2.0 }
}

/// Metaphor nodes breathe with `2.5·sin(0.002·t)`; `time_ms` is `None` when
/// the scene is static.
pub(super) fn node_visual(
    node: &Node,
    emphasis: Emphasis<'_>,
    time_ms: Option<f64>,
) -> NodeVisual {
    let mut radius = node_radius(node.category, node.weight);
    if node.category == Category::Metaphor
        && let Some(time_ms) = time_ms
    {
        radius += (time_ms * PULSE_RATE).sin() as f32 * PULSE_AMPLITUDE;
    }

    let base = (base_opacity(node.category), base_stroke(node.category));
    let (opacity, stroke) = match emphasis {
        Emphasis::Rest => base,
        Emphasis::Focus { id, satellites } => {
            if node.id == id {
                (1.0, 8.0)
            } else if satellites.contains(&node.id) {
                (0.9, 3.0)
            } else {
                (0.2, base.1)
            }
        }
        Emphasis::Pair(first, second) => {
            if node.id == first || node.id == second {
                (1.0, 8.0)
            } else {
                (0.12, base.1)
            }
        }
    };

    NodeVisual {
        opacity,
        stroke,
        radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_edges_scale_with_weight() {
        let link = Link::new("a", "b", 3.0);
        let visual = edge_visual(&link, Emphasis::Rest);
        assert_eq!(visual.opacity, 0.45);
        assert!((visual.width - 2.4).abs() < 1e-6);
        assert_eq!(edge_visual(&Link::new("a", "b", 0.1), Emphasis::Rest).width, 1.0);
    }

    #[test]
    fn heavy_edges_stop_growing() {
        let capped = Link::new("a", "b", MAX_VISUAL_WEIGHT);
        let heavy = Link::new("a", "b", 1.0e9);
        for emphasis in [
            Emphasis::Rest,
            Emphasis::Pair("a", "b"),
            Emphasis::Focus {
                id: "a",
                satellites: &[],
            },
        ] {
            assert_eq!(edge_visual(&heavy, emphasis), edge_visual(&capped, emphasis));
        }
        assert!((edge_visual(&heavy, Emphasis::Rest).width - 3.2).abs() < 1e-6);
    }

    #[test]
    fn focus_lights_touching_edges() {
        let focus = Emphasis::Focus {
            id: "a",
            satellites: &[],
        };
        assert_eq!(edge_visual(&Link::new("b", "a", 1.0), focus).opacity, 0.95);
        assert_eq!(
            edge_visual(&Link::new("b", "c", 1.0), focus),
            EdgeVisual {
                opacity: 0.08,
                width: 0.8,
            }
        );
    }

    #[test]
    fn pair_distinguishes_joining_and_touching_edges() {
        let pair = Emphasis::Pair("a", "b");
        assert_eq!(edge_visual(&Link::new("b", "a", 2.0), pair).opacity, 0.95);
        assert_eq!(edge_visual(&Link::new("a", "c", 1.0), pair).opacity, 0.35);
        assert_eq!(edge_visual(&Link::new("c", "d", 1.0), pair).opacity, 0.05);
    }

    #[test]
    fn node_emphasis_levels() {
        let hub = Node::new("hub", "Eau", Category::Metaphor);
        let tag = Node::new("tag", "flux", Category::Tag);
        let echo = Node::new("echo", "écho", Category::Echo);
        let satellites = ["tag".to_owned()];
        let focus = Emphasis::Focus {
            id: "hub",
            satellites: &satellites,
        };

        assert_eq!(node_visual(&hub, focus, None).stroke, 8.0);
        assert_eq!(node_visual(&tag, focus, None).opacity, 0.9);
        assert_eq!(node_visual(&echo, focus, None).opacity, 0.2);
        assert_eq!(node_visual(&echo, Emphasis::Rest, None).opacity, 0.65);
        assert_eq!(node_visual(&tag, Emphasis::Pair("hub", "echo"), None).opacity, 0.12);
    }

    #[test]
    fn only_metaphors_pulse() {
        let hub = Node::new("hub", "Eau", Category::Metaphor);
        let word = Node::new("w", "pluie", Category::Word);
        let still = node_visual(&hub, Emphasis::Rest, None).radius;
        let peak = node_visual(&hub, Emphasis::Rest, Some(785.398)).radius;

        assert!((peak - still - PULSE_AMPLITUDE).abs() < 0.01);
        assert_eq!(
            node_visual(&word, Emphasis::Rest, Some(785.398)).radius,
            node_visual(&word, Emphasis::Rest, None).radius
        );
    }
}
