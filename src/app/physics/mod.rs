use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2};

use crate::echo::Category;
use crate::layout::PositionMap;

use super::render_utils::node_radius;

mod forces;

const COLLISION_PADDING: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct PhysicsConfig {
    pub link_distance: f32,
    pub link_strength: f32,
    pub charge_scale: f32,
    pub center_strength: f32,
    pub collision_strength: f32,
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            link_distance: 90.0,
            link_strength: 0.35,
            charge_scale: 1.0,
            center_strength: 0.03,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
        }
    }
}

#[derive(Clone, Debug)]
pub(in crate::app) struct SimNode {
    pub id: String,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub fixed: Option<Vec2>,
    pub radius: f32,
    pub charge: f32,
}

impl SimNode {
    pub fn new(id: impl Into<String>, pos: Pos2, category: Category, weight: f32) -> Self {
        Self {
            id: id.into(),
            pos: pos.to_vec2(),
            velocity: Vec2::ZERO,
            fixed: None,
            radius: node_radius(category, weight) + COLLISION_PADDING,
            charge: category_charge(category),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct SimLink {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
}

/// Many-body strength per category; hubs push hardest, tags barely at all.
pub(in crate::app) fn category_charge(category: Category) -> f32 {
    match category {
        Category::Metaphor => -320.0,
        Category::Tag => -60.0,
        Category::Word => -140.0,
        Category::Echo => -120.0,
        Category::Style | Category::Usage => -100.0,
        Category::Other => -120.0,
    }
}

/// Force simulation with an `alpha` cooldown. Forces scale with `alpha`, which
/// eases toward `alpha_target` every tick; once it drops below `alpha_min`
/// the simulation stops until restarted.
pub(in crate::app) struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    index_by_id: HashMap<String, usize>,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    center: Vec2,
    config: PhysicsConfig,
}

impl Simulation {
    pub fn new(
        nodes: Vec<SimNode>,
        links: Vec<SimLink>,
        center: Pos2,
        config: PhysicsConfig,
    ) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();
        let links = links
            .into_iter()
            .filter(|link| {
                link.source < nodes.len() && link.target < nodes.len() && link.source != link.target
            })
            .collect();

        Self {
            nodes,
            links,
            index_by_id,
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            center: center.to_vec2(),
            config,
        }
    }

    #[cfg(test)]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub fn config(&self) -> PhysicsConfig {
        self.config
    }

    /// Advances one step. Returns `false` once the simulation has cooled.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        if self.alpha < self.config.alpha_min {
            self.running = false;
            return false;
        }

        let alpha = self.alpha;
        forces::apply_links(&mut self.nodes, &self.links, &self.config, alpha);
        forces::apply_many_body(&mut self.nodes, &self.config, alpha);
        forces::apply_centering(&mut self.nodes, self.center, &self.config, alpha);
        forces::apply_collisions(&mut self.nodes, &self.config);
        forces::integrate(&mut self.nodes, &self.config);
        true
    }

    /// Runs until cooled or `max_ticks` is reached; returns the ticks taken.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }

    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        self.restart();
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
        self.restart();
    }

    pub fn set_center(&mut self, center: Pos2) {
        self.center = center.to_vec2();
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        if self.config != config {
            self.config = config;
            self.reheat(0.3);
        }
    }

    pub fn pin(&mut self, id: &str, pos: Pos2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let node = &mut self.nodes[index];
        node.fixed = Some(pos.to_vec2());
        node.pos = pos.to_vec2();
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, id: &str) {
        if let Some(&index) = self.index_by_id.get(id) {
            self.nodes[index].fixed = None;
        }
    }

    /// Frees every pinned node. Returns whether any was pinned.
    pub fn unpin_all(&mut self) -> bool {
        let mut released = false;
        for node in &mut self.nodes {
            released |= node.fixed.take().is_some();
        }
        released
    }

    pub fn position(&self, id: &str) -> Option<Pos2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].pos.to_pos2())
    }

    pub fn write_positions(&self, positions: &mut PositionMap) {
        positions.clear();
        positions.reserve(self.nodes.len());
        for node in &self.nodes {
            positions.insert(node.id.clone(), node.pos.to_pos2());
        }
    }
}
