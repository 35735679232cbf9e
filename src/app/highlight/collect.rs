use std::collections::HashSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::echo::{Category, GraphSnapshot};

/// Tags linked to `focus_id`, in link order, each listed once.
pub(in crate::app) fn focus_satellites(snapshot: &GraphSnapshot, focus_id: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    snapshot
        .neighbors(focus_id)
        .filter(|node| node.category == Category::Tag)
        .filter(|node| seen.insert(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect()
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Ids whose label fuzzily matches `query`; empty for a blank query.
pub(in crate::app) fn search_matches(snapshot: &GraphSnapshot, query: &str) -> HashSet<String> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    let matcher = SkimMatcherV2::default();
    snapshot
        .nodes()
        .iter()
        .filter(|node| fuzzy_match_score(&matcher, &node.label, query).is_some())
        .map(|node| node.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::{Link, Node};

    fn snapshot() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Node::new("hub", "Eau", Category::Metaphor),
                Node::new("t1", "flux", Category::Tag),
                Node::new("t2", "Marée", Category::Tag),
                Node::new("w", "pluie", Category::Word),
            ],
            vec![
                Link::new("hub", "t1", 1.0),
                Link::new("t2", "hub", 1.0),
                Link::new("hub", "t1", 0.5),
                Link::new("hub", "w", 2.0),
            ],
        )
    }

    #[test]
    fn satellites_are_linked_tags_only() {
        assert_eq!(focus_satellites(&snapshot(), "hub"), ["t1", "t2"]);
        assert!(focus_satellites(&snapshot(), "w").is_empty());
    }

    #[test]
    fn search_is_fuzzy_and_case_insensitive() {
        let matches = search_matches(&snapshot(), "MAR");
        assert!(matches.contains("t2"));
        assert!(!matches.contains("w"));
        assert!(search_matches(&snapshot(), "   ").is_empty());
    }
}
