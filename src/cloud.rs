//! Optional prompt sink. No request ever leaves the machine: a disabled sink
//! answers with a fixed local stub and the known provider is mocked.

use crate::echo::{Category, GraphSnapshot};

const DISABLED_OUTPUT: &str = "IA désactivée. Rien n'a été envoyé.";
const UNKNOWN_PROVIDER_OUTPUT: &str = "Provider inconnu. Aucun appel effectué.";
const NEBIUS_MOCK_OUTPUT: &str = "Réponse créative (mock). Branchez vos clés API pour activer l'IA.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudOptions {
    pub provider: String,
    pub enabled: bool,
}

impl Default for CloudOptions {
    fn default() -> Self {
        Self {
            provider: "nebius".to_owned(),
            enabled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudReply {
    pub provider: String,
    pub prompt: String,
    pub output: String,
}

pub trait PromptSink {
    fn send(&self, prompt: &str, options: &CloudOptions) -> CloudReply;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LocalSink;

impl PromptSink for LocalSink {
    fn send(&self, prompt: &str, options: &CloudOptions) -> CloudReply {
        let (provider, output) = if !options.enabled {
            ("local", DISABLED_OUTPUT)
        } else if options.provider == "nebius" {
            ("nebius", NEBIUS_MOCK_OUTPUT)
        } else {
            (options.provider.as_str(), UNKNOWN_PROVIDER_OUTPUT)
        };

        log::info!("prompt handled by {provider} ({} chars)", prompt.chars().count());
        CloudReply {
            provider: provider.to_owned(),
            prompt: prompt.to_owned(),
            output: output.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PromptInput {
    pub words: Vec<String>,
    pub metaphors: Vec<String>,
    pub tags: Vec<String>,
    pub style: Option<String>,
    pub usage: Option<String>,
}

impl PromptInput {
    pub fn from_snapshot(snapshot: &GraphSnapshot, style: &str, usage: &str) -> Self {
        let labels = |category: Category| {
            snapshot
                .nodes()
                .iter()
                .filter(|node| node.category == category)
                .map(|node| node.label.clone())
                .collect::<Vec<_>>()
        };

        Self {
            words: labels(Category::Word),
            metaphors: labels(Category::Metaphor),
            tags: labels(Category::Tag),
            style: Some(style.to_owned()).filter(|value| !value.is_empty()),
            usage: Some(usage.to_owned()).filter(|value| !value.is_empty()),
        }
    }
}

pub fn build_prompt(input: &PromptInput) -> String {
    let word_line = if input.words.is_empty() {
        "Aucun mot déposé pour le moment.".to_owned()
    } else {
        format!("Mots sources : {}", input.words.join(", "))
    };
    let metaphor_line = if input.metaphors.is_empty() {
        "Pas de résonance identifiée, rester dans l'écoute.".to_owned()
    } else {
        format!("Résonances : {}", input.metaphors.join(" · "))
    };
    let tag_line = if input.tags.is_empty() {
        "Tags en attente.".to_owned()
    } else {
        format!("Tags : {}", input.tags.join(", "))
    };
    let style_line = input
        .style
        .as_ref()
        .map(|style| format!("Style : {style}"))
        .unwrap_or_else(|| "Style libre.".to_owned());
    let usage_line = input
        .usage
        .as_ref()
        .map(|usage| format!("Contexte : {usage}"))
        .unwrap_or_else(|| "Contexte général.".to_owned());

    [word_line, metaphor_line, tag_line, style_line, usage_line].join("\n")
}
