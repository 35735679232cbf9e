use eframe::egui::Pos2;

use crate::echo::Node;
use crate::layout::PositionMap;
use crate::util::hash_seed;

const MAX_SELECTED: usize = 2;

/// Up to two selected ids, most recent last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Removes `id` when present, otherwise appends it and evicts the oldest
    /// entry past the window.
    pub fn toggle(&mut self, id: &str) {
        if let Some(index) = self.ids.iter().position(|selected| selected == id) {
            self.ids.remove(index);
            return;
        }

        self.ids.push(id.to_owned());
        if self.ids.len() > MAX_SELECTED {
            let overflow = self.ids.len() - MAX_SELECTED;
            self.ids.drain(..overflow);
        }
    }

    /// Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.ids.is_empty();
        self.ids.clear();
        had_any
    }

    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.ids.as_slice() {
            [first, second] => Some((first.as_str(), second.as_str())),
            _ => None,
        }
    }

    /// Drops ids for which `exists` is false. Returns whether anything changed.
    pub fn retain_existing(&mut self, exists: impl Fn(&str) -> bool) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| exists(id));
        before != self.ids.len()
    }

    /// Midpoint of both selected nodes, `None` unless both have a position.
    pub fn overlay_anchor(&self, positions: &PositionMap) -> Option<Pos2> {
        let (first, second) = self.pair()?;
        let first = positions.get(first)?;
        let second = positions.get(second)?;
        Some(first.lerp(*second, 0.5))
    }
}

/// Short poetic line for a pair of nodes. The template is picked from the two
/// labels, so the same ordered pair always reads the same.
pub(in crate::app) fn resonance_text(first: &Node, second: &Node) -> String {
    let label_a = label_or_id(first);
    let label_b = label_or_id(second);
    let kind_a = first.category.label();
    let kind_b = second.category.label();

    let templates = [
        format!("Un souffle {kind_a}-{kind_b} relie {label_a} et {label_b}."),
        format!("{label_a} et {label_b} scintillent en tandem, comme deux {kind_a}s complices."),
        format!("Entre {label_a} et {label_b}, une onde douce murmure un nouvel écho."),
        format!("{label_a} prête sa lumière à {label_b}, le temps d'un battement."),
    ];

    let index = (hash_seed(&format!("{label_a}|{label_b}")) % templates.len() as u64) as usize;
    templates[index].clone()
}

fn label_or_id(node: &Node) -> &str {
    if node.label.trim().is_empty() {
        &node.id
    } else {
        &node.label
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::echo::Category;

    #[test]
    fn toggle_keeps_two_most_recent() {
        let mut selection = Selection::default();
        for id in ["a", "b", "c"] {
            selection.toggle(id);
            assert!(selection.ids().len() <= 2);
        }
        assert_eq!(selection.ids(), ["b", "c"]);

        selection.toggle("b");
        assert_eq!(selection.ids(), ["c"]);
        assert!(selection.pair().is_none());
    }

    #[test]
    fn clear_reports_prior_state() {
        let mut selection = Selection::default();
        assert!(!selection.clear());
        selection.toggle("a");
        assert!(selection.clear());
        assert!(selection.is_empty());
    }

    #[test]
    fn pruning_drops_missing_ids() {
        let mut selection = Selection::default();
        selection.toggle("keep");
        selection.toggle("gone");
        assert!(selection.retain_existing(|id| id == "keep"));
        assert_eq!(selection.ids(), ["keep"]);
        assert!(!selection.retain_existing(|id| id == "keep"));
    }

    #[test]
    fn overlay_sits_at_pair_midpoint() {
        let mut selection = Selection::default();
        let mut positions = PositionMap::new();
        positions.insert("a".to_owned(), pos2(0.0, 0.0));
        positions.insert("b".to_owned(), pos2(100.0, 40.0));

        selection.toggle("a");
        assert_eq!(selection.overlay_anchor(&positions), None);
        selection.toggle("b");
        assert_eq!(selection.overlay_anchor(&positions), Some(pos2(50.0, 20.0)));

        positions.remove("b");
        assert_eq!(selection.overlay_anchor(&positions), None);
    }

    #[test]
    fn resonance_text_is_stable_for_a_pair() {
        let water = Node::new("m", "Eau", Category::Metaphor);
        let rain = Node::new("w", "pluie", Category::Word);

        let first = resonance_text(&water, &rain);
        assert!(first.contains("Eau") && first.contains("pluie"));
        assert_eq!(first, resonance_text(&water, &rain));

        let mut selection = Selection::default();
        selection.toggle("m");
        selection.toggle("w");
        selection.clear();
        selection.toggle("m");
        selection.toggle("w");
        assert_eq!(selection.pair(), Some(("m", "w")));
        assert_eq!(first, resonance_text(&water, &rain));
    }

    #[test]
    fn blank_label_falls_back_to_id() {
        let blank = Node::new("node-7", "  ", Category::Other);
        let tag = Node::new("t", "flux", Category::Tag);
        assert!(resonance_text(&blank, &tag).contains("node-7"));
    }
}
