mod classify;
mod graph;
mod parse;

pub use classify::{Classifier, KeywordClassifier, murmur_for, tokenize};
pub use graph::{Category, GraphSnapshot, Link, Node};
pub use parse::parse_snapshot;
