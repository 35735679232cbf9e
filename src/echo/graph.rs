use std::collections::{HashMap, HashSet};

use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Metaphor,
    Tag,
    Word,
    Echo,
    Style,
    Usage,
    Other,
}

impl Category {
    /// Maps a free-form category name onto the closed set; unknown names fall
    /// back to `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "metaphor" | "center" | "centre" => Self::Metaphor,
            "tag" => Self::Tag,
            "word" | "token" => Self::Word,
            "echo" => Self::Echo,
            "style" => Self::Style,
            "usage" => Self::Usage,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Metaphor => "metaphor",
            Self::Tag => "tag",
            Self::Word => "word",
            Self::Echo => "echo",
            Self::Style => "style",
            Self::Usage => "usage",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub weight: f32,
    pub emoji: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category,
            weight: 1.0,
            emoji: None,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = sanitize_weight(weight);
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub weight: f32,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: sanitize_weight(weight),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }

    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(self.target.as_str())
        } else if self.target == id {
            Some(self.source.as_str())
        } else {
            None
        }
    }
}

pub(crate) fn sanitize_weight(weight: f32) -> f32 {
    if weight.is_finite() {
        weight.max(0.0)
    } else {
        1.0
    }
}

/// Validated node/link set. Ids are unique and every link points at two
/// distinct nodes of the snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut kept_nodes = Vec::with_capacity(nodes.len());
        for mut node in nodes {
            if !seen.insert(node.id.clone()) {
                debug!("dropping duplicate node id {}", node.id);
                continue;
            }
            node.weight = sanitize_weight(node.weight);
            kept_nodes.push(node);
        }

        let kept_links = links
            .into_iter()
            .filter(|link| {
                let valid = link.source != link.target
                    && seen.contains(&link.source)
                    && seen.contains(&link.target);
                if !valid {
                    debug!("dropping dangling link {} -> {}", link.source, link.target);
                }
                valid
            })
            .map(|mut link| {
                link.weight = sanitize_weight(link.weight);
                link
            })
            .collect();

        Self {
            nodes: kept_nodes,
            links: kept_links,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn index_by_id(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect()
    }

    pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.links
            .iter()
            .filter_map(move |link| link.other_end(id))
            .filter_map(|other| self.node(other))
    }

    /// Returns a new snapshot with `extra` appended, each extra node linked to
    /// `anchor` when it exists.
    pub fn with_extra_nodes(&self, extra: &[Node], anchor: Option<&str>) -> Self {
        if extra.is_empty() {
            return self.clone();
        }

        let mut nodes = self.nodes.clone();
        let mut links = self.links.clone();
        for node in extra {
            if let Some(anchor) = anchor {
                links.push(Link::new(anchor, node.id.clone(), 0.6));
            }
            nodes.push(node.clone());
        }
        Self::new(nodes, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_falls_back_to_other() {
        assert_eq!(Category::parse("center"), Category::Metaphor);
        assert_eq!(Category::parse("Metaphor"), Category::Metaphor);
        assert_eq!(Category::parse("token"), Category::Word);
        assert_eq!(Category::parse("constellation"), Category::Other);
        assert_eq!(Category::parse(""), Category::Other);
    }

    #[test]
    fn dangling_links_are_dropped() {
        let snapshot = GraphSnapshot::new(
            vec![
                Node::new("a", "Eau", Category::Metaphor),
                Node::new("b", "flux", Category::Tag),
            ],
            vec![
                Link::new("a", "b", 1.0),
                Link::new("a", "zzz", 1.0),
                Link::new("b", "b", 1.0),
            ],
        );

        assert_eq!(snapshot.links().len(), 1);
        for link in snapshot.links() {
            assert!(snapshot.node(&link.source).is_some());
            assert!(snapshot.node(&link.target).is_some());
        }
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let snapshot = GraphSnapshot::new(
            vec![
                Node::new("a", "first", Category::Word),
                Node::new("a", "second", Category::Tag),
            ],
            Vec::new(),
        );

        assert_eq!(snapshot.nodes().len(), 1);
        assert_eq!(snapshot.nodes()[0].label, "first");
    }

    #[test]
    fn weights_are_sanitized() {
        let snapshot = GraphSnapshot::new(
            vec![
                Node::new("a", "a", Category::Word).with_weight(f32::NAN),
                Node::new("b", "b", Category::Word).with_weight(-3.0),
            ],
            vec![Link::new("a", "b", f32::INFINITY)],
        );

        assert_eq!(snapshot.nodes()[0].weight, 1.0);
        assert_eq!(snapshot.nodes()[1].weight, 0.0);
        assert_eq!(snapshot.links()[0].weight, 1.0);
    }

    #[test]
    fn extra_nodes_link_to_anchor() {
        let base = GraphSnapshot::new(vec![Node::new("a", "Eau", Category::Metaphor)], Vec::new());
        let extended = base.with_extra_nodes(
            &[Node::new("resonance-1", "Un souffle", Category::Echo)],
            Some("a"),
        );

        assert_eq!(extended.nodes().len(), 2);
        assert_eq!(extended.links().len(), 1);
        assert_eq!(extended.neighbors("a").count(), 1);
        assert_eq!(base.nodes().len(), 1);
    }
}
