use anyhow::{Context, Result};
use serde_json::Value;

use super::graph::{Category, GraphSnapshot, Link, Node};

/// Parses a `{nodes, links}` document. Only malformed JSON is an error; shape
/// problems (missing arrays, unknown fields, dangling links) are recovered.
pub fn parse_snapshot(raw: &str) -> Result<GraphSnapshot> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON graph snapshot")?;
    Ok(snapshot_from_value(&parsed))
}

fn snapshot_from_value(value: &Value) -> GraphSnapshot {
    let nodes = value
        .get("nodes")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .enumerate()
                .filter_map(|(index, entry)| node_from_value(index, entry))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let links = value
        .get("links")
        .or_else(|| value.get("edges"))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(link_from_value).collect::<Vec<_>>())
        .unwrap_or_default();

    GraphSnapshot::new(nodes, links)
}

fn string_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn number_field(value: &Value, keys: &[&str]) -> Option<f32> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_f64))
        .map(|number| number as f32)
}

fn node_from_value(index: usize, value: &Value) -> Option<Node> {
    if !value.is_object() {
        return None;
    }

    let id = string_field(value, &["id"])
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node-{index}"));
    let label = string_field(value, &["label", "name"]).unwrap_or("∅");
    let category = string_field(value, &["category", "level", "type", "kind"])
        .map(Category::parse)
        .unwrap_or(Category::Other);
    let weight = number_field(value, &["weight", "strength"]).unwrap_or(1.0);

    let mut node = Node::new(id, label, category).with_weight(weight);
    if let Some(emoji) = string_field(value, &["emoji"]) {
        node = node.with_emoji(emoji);
    }
    Some(node)
}

fn link_from_value(value: &Value) -> Option<Link> {
    let source = string_field(value, &["source", "from"])?;
    let target = string_field(value, &["target", "to"])?;
    let weight = number_field(value, &["weight", "strength"]).unwrap_or(1.0);
    Some(Link::new(source, target, weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_array_fields_become_empty() {
        let snapshot = parse_snapshot(r#"{"nodes": "oops", "links": 4}"#).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.links().is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_snapshot("{nodes: [").is_err());
    }

    #[test]
    fn parses_aliases_and_defaults() {
        let raw = r#"{
            "nodes": [
                {"id": "a", "type": "center", "label": "Eau", "emoji": "💧"},
                {"id": "b", "level": "tag", "label": "flux", "weight": 2},
                {"label": "sans id"},
                42
            ],
            "edges": [
                {"from": "a", "to": "b", "weight": 3},
                {"source": "a", "target": "zzz"}
            ]
        }"#;

        let snapshot = parse_snapshot(raw).unwrap();
        assert_eq!(snapshot.nodes().len(), 3);
        assert_eq!(snapshot.nodes()[0].category, Category::Metaphor);
        assert_eq!(snapshot.nodes()[0].emoji.as_deref(), Some("💧"));
        assert_eq!(snapshot.nodes()[1].weight, 2.0);
        assert_eq!(snapshot.nodes()[2].id, "node-2");
        assert_eq!(snapshot.nodes()[2].category, Category::Other);
        assert_eq!(snapshot.links().len(), 1);
        assert_eq!(snapshot.links()[0].weight, 3.0);
    }
}
