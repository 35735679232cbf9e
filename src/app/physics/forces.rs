use eframe::egui::{Vec2, vec2};

use super::{PhysicsConfig, SimLink, SimNode};

const MIN_DISTANCE_SQ: f32 = 1.0;
const COINCIDENT_SQ: f32 = 0.000_001;
const MAX_SPEED: f32 = 40.0;

/// Deterministic unit direction for a pair sitting on top of each other.
fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) fn rest_length(config: &PhysicsConfig, weight: f32) -> f32 {
    let base = config.link_distance;
    (base / (0.5 + 0.5 * weight.max(0.0))).clamp(base * 0.4, base * 2.0)
}

pub(super) fn link_strength(config: &PhysicsConfig, weight: f32) -> f32 {
    (config.link_strength * (0.6 + 0.4 * weight.max(0.0))).min(1.0)
}

pub(super) fn apply_links(
    nodes: &mut [SimNode],
    links: &[SimLink],
    config: &PhysicsConfig,
    alpha: f32,
) {
    let node_count = nodes.len();
    for link in links {
        let (source, target) = (link.source, link.target);
        if source >= node_count || target >= node_count || source == target {
            continue;
        }

        let mut delta = nodes[target].pos - nodes[source].pos;
        if delta.length_sq() < COINCIDENT_SQ {
            delta = separation_direction(source, target);
        }
        let distance = delta.length();

        let rest = rest_length(config, link.weight);
        let k = ((distance - rest) / distance) * link_strength(config, link.weight) * alpha;
        let correction = delta * (k * 0.5);

        nodes[source].velocity += correction;
        nodes[target].velocity -= correction;
    }
}

pub(super) fn apply_many_body(nodes: &mut [SimNode], config: &PhysicsConfig, alpha: f32) {
    let node_count = nodes.len();
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let mut delta = nodes[j].pos - nodes[i].pos;
            if delta.length_sq() < COINCIDENT_SQ {
                delta = separation_direction(i, j);
            }
            let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);

            let strength = (nodes[i].charge + nodes[j].charge) * 0.5 * config.charge_scale;
            let push = delta * (strength * alpha / distance_sq);

            nodes[i].velocity += push;
            nodes[j].velocity -= push;
        }
    }
}

pub(super) fn apply_centering(
    nodes: &mut [SimNode],
    center: Vec2,
    config: &PhysicsConfig,
    alpha: f32,
) {
    for node in nodes {
        node.velocity += (center - node.pos) * (config.center_strength * alpha);
    }
}

pub(super) fn apply_collisions(nodes: &mut [SimNode], config: &PhysicsConfig) {
    let node_count = nodes.len();
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let min_distance = nodes[i].radius + nodes[j].radius;
            let delta = nodes[j].pos - nodes[i].pos;
            let distance_sq = delta.length_sq();
            if distance_sq >= min_distance * min_distance {
                continue;
            }

            let distance = distance_sq.sqrt();
            let direction = if distance_sq > COINCIDENT_SQ {
                delta / distance
            } else {
                separation_direction(i, j)
            };
            let push = direction * ((min_distance - distance) * config.collision_strength * 0.5);

            nodes[i].velocity -= push;
            nodes[j].velocity += push;
        }
    }
}

/// Applies velocity decay and moves every node. Returns whether anything moved.
pub(super) fn integrate(nodes: &mut [SimNode], config: &PhysicsConfig) -> bool {
    let retain = 1.0 - config.velocity_decay.clamp(0.0, 1.0);
    let mut any_motion = false;

    for node in nodes {
        if !node.velocity.x.is_finite() || !node.velocity.y.is_finite() {
            node.velocity = Vec2::ZERO;
        }

        node.velocity *= retain;
        let speed_sq = node.velocity.length_sq();
        if speed_sq > MAX_SPEED * MAX_SPEED {
            node.velocity *= MAX_SPEED / speed_sq.sqrt();
        }

        if let Some(fixed) = node.fixed {
            node.pos = fixed;
            node.velocity = Vec2::ZERO;
            continue;
        }

        let next = node.pos + node.velocity;
        if next.x.is_finite() && next.y.is_finite() {
            node.pos = next;
            any_motion |= node.velocity.length_sq() > 0.000_001;
        } else {
            node.velocity = Vec2::ZERO;
        }
    }

    any_motion
}
