use std::collections::HashMap;

use crate::util::hash_seed;

use super::graph::{Category, GraphSnapshot, Link, Node};

/// Turns free text into a graph snapshot. Implementations must be pure: the
/// same text always yields the same snapshot.
pub trait Classifier {
    fn classify(&self, text: &str) -> GraphSnapshot;
}

struct Domain {
    id: &'static str,
    name: &'static str,
    emoji: &'static str,
    themes: &'static [&'static str],
    tags: &'static [&'static str],
    keywords: &'static [&'static str],
    punchlines: &'static [&'static str],
}

const DOMAINS: &[Domain] = &[
    Domain {
        id: "water",
        name: "Eau",
        emoji: "💧",
        themes: &["courant sous la peau", "pression intérieure", "éclat liquide"],
        tags: &["flux", "marée", "dissolution", "bulle"],
        keywords: &[
            "eau", "vague", "marée", "flot", "flux", "bulle", "pluie", "courant", "mouill", "noy",
            "larme",
        ],
        punchlines: &[
            "Comme une bulle trop pleine qui tremble sans éclater.",
            "Une marée discrète cherche la faille pour passer.",
            "La surface tient, mais le dessous se soulève lentement.",
        ],
    },
    Domain {
        id: "air",
        name: "Air",
        emoji: "🫧",
        themes: &["souffle contenu", "silence suspendu", "vide vibrant"],
        tags: &["respiration", "lévitation", "retenue"],
        keywords: &["souffle", "air", "respir", "vide", "aspir", "étouff", "poumon", "vent"],
        punchlines: &[
            "Une poche de silence gonfle sans se décider.",
            "Les mots se tiennent en apnée, flottant entre deux battements.",
            "Un courant léger passe, mais quelque chose fait barrage.",
        ],
    },
    Domain {
        id: "fire",
        name: "Feu",
        emoji: "🔥",
        themes: &["tension brûlante", "incandescence contenue", "braise sous la peau"],
        tags: &["braise", "excès", "fissure"],
        keywords: &["brûl", "feu", "fièvre", "ardeur", "colère", "rage", "tension", "impulsion"],
        punchlines: &[
            "Une braise tient, étouffée, mais la chaleur cherche sa faille.",
            "Les nerfs scintillent comme des filaments rouges sous verre.",
            "Ça chauffe en sourdine, comme une forge qui retient le marteau.",
        ],
    },
    Domain {
        id: "earth",
        name: "Terre",
        emoji: "🪨",
        themes: &["gravité douce", "ancrage lourd", "terrassement intérieur"],
        tags: &["lourdeur", "ancrage", "inertie", "strates"],
        keywords: &["lourd", "roche", "pierre", "sol", "terre", "ancr", "bloc", "plomb", "fatigue"],
        punchlines: &[
            "Une masse immobile retient le geste, solide comme une dalle froide.",
            "Des strates s'empilent, gardiennes d'un repos malgré tout.",
            "Une lourdeur minérale étale son silence rassurant.",
        ],
    },
    Domain {
        id: "shadow",
        name: "Ombre",
        emoji: "🌘",
        themes: &["retranchement doux", "ombre fertile", "silence gardé"],
        tags: &["repli", "secret", "gestation", "clair-obscur"],
        keywords: &["ombre", "noir", "silence", "retrait", "caché", "secret", "nuit", "absence"],
        punchlines: &[
            "Un pli d'ombre se referme doucement pour garder la chaleur.",
            "Des formes passent derrière le rideau, sans se nommer.",
            "Le murmure s'enroule dans un coin, gardien d'un possible.",
        ],
    },
    Domain {
        id: "light",
        name: "Lumière",
        emoji: "✨",
        themes: &["clarté naissante", "éclat partagé", "aube intérieure"],
        tags: &["éclat", "ouverture", "aube"],
        keywords: &["lumi", "soleil", "clair", "aube", "briller", "éclat", "jour", "rayon"],
        punchlines: &[
            "Une clarté fine se glisse entre deux pensées.",
            "Le jour passe par une fente et dessine un chemin.",
            "Quelque chose s'allume sans bruit, à hauteur d'épaule.",
        ],
    },
];

const STOPWORDS: &[&str] = &[
    "et", "ou", "de", "des", "du", "la", "le", "les", "un", "une", "en", "dans", "sur", "sous",
    "avec", "que", "qui", "quoi", "où", "au", "aux", "ce", "cet", "cette", "ces", "mon", "ma",
    "mes", "ton", "ta", "tes", "son", "sa", "ses", "pour", "par", "pas", "ne", "plus", "je", "tu",
    "il", "elle", "on", "nous", "vous", "ils", "elles", "y", "a", "d", "l", "j", "m", "n", "s",
    "t", "c", "qu", "est",
];

const FALLBACK_NAME: &str = "Écho discret";
const FALLBACK_EMOJI: &str = "…";
const FALLBACK_TAGS: &[&str] = &["silence", "pause", "écoute"];
const FALLBACK_PUNCHLINE: &str = "L'écho reste discret. Rien n'insiste pour l'instant.";

const MAX_HUBS: usize = 3;
const MAX_WORDS: usize = 8;
const TAG_COUNT: usize = 3;
const PUNCHLINE_COUNT: usize = 2;

pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty() && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

fn keyword_matches(token: &str, keyword: &str) -> bool {
    token.contains(keyword) || (token.chars().count() >= 3 && keyword.contains(token))
}

fn domain_matches(domain: &Domain, token: &str) -> bool {
    domain
        .keywords
        .iter()
        .any(|keyword| keyword_matches(token, keyword))
}

/// Picks `count` distinct items walking the list with a stride of 3 from a
/// seed, then fills sequentially if the stride cycles early.
fn pick_items<'a>(list: &[&'a str], seed: u64, count: usize) -> Vec<&'a str> {
    let wanted = count.min(list.len());
    let mut picked = Vec::with_capacity(wanted);
    if wanted == 0 {
        return picked;
    }

    let mut cursor = (seed % list.len() as u64) as usize;
    for _ in 0..(list.len() * 3) {
        if picked.len() >= wanted {
            break;
        }
        let candidate = list[cursor % list.len()];
        if !picked.contains(&candidate) {
            picked.push(candidate);
        }
        cursor += 3;
    }

    for candidate in list {
        if picked.len() >= wanted {
            break;
        }
        if !picked.contains(candidate) {
            picked.push(candidate);
        }
    }

    picked
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { '-' })
        .collect::<String>()
        .to_lowercase()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    fn score_domains(tokens: &[String]) -> Vec<(usize, u32)> {
        let mut scored = DOMAINS
            .iter()
            .enumerate()
            .map(|(index, domain)| {
                let score = tokens
                    .iter()
                    .filter(|token| domain_matches(domain, token))
                    .count() as u32
                    * 2;
                (index, score)
            })
            .filter(|(_, score)| *score > 0)
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(MAX_HUBS);
        scored
    }

    fn frequent_tokens(tokens: &[String]) -> Vec<String> {
        let mut frequency: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, token) in tokens.iter().enumerate() {
            let entry = frequency.entry(token.as_str()).or_insert((0, position));
            entry.0 += 1;
        }

        let mut ranked = frequency
            .into_iter()
            .filter(|(token, _)| token.chars().count() > 3)
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.1.1.cmp(&b.1.1)));
        ranked
            .into_iter()
            .map(|(token, _)| token.to_owned())
            .collect()
    }

    fn unique_tokens(tokens: &[String]) -> Vec<&str> {
        let mut unique = Vec::new();
        for token in tokens {
            if !unique.contains(&token.as_str()) {
                unique.push(token.as_str());
            }
        }
        unique
    }

    fn fallback_snapshot(tokens: &[String], seed: u64) -> GraphSnapshot {
        let hub_id = "metaphor-silence";
        let mut nodes =
            vec![Node::new(hub_id, FALLBACK_NAME, Category::Metaphor).with_emoji(FALLBACK_EMOJI)];
        let mut links = Vec::new();

        for tag in pick_items(FALLBACK_TAGS, seed, TAG_COUNT) {
            let id = format!("tag-{}", slug(tag));
            links.push(Link::new(hub_id, id.clone(), 1.0));
            nodes.push(Node::new(id, tag, Category::Tag));
        }

        for token in Self::unique_tokens(tokens).into_iter().take(MAX_WORDS) {
            let id = format!("word-{}", slug(token));
            links.push(Link::new(hub_id, id.clone(), 0.5));
            nodes.push(Node::new(id, token, Category::Word));
        }

        nodes.push(Node::new("echo-0", FALLBACK_PUNCHLINE, Category::Echo));
        links.push(Link::new(hub_id, "echo-0", 0.5));

        GraphSnapshot::new(nodes, links)
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> GraphSnapshot {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return GraphSnapshot::default();
        }

        let seed = hash_seed(&tokens.join("-")) % 9_973;
        let scored = Self::score_domains(&tokens);
        let Some(&(dominant_index, _)) = scored.first() else {
            return Self::fallback_snapshot(&tokens, seed);
        };
        let dominant = &DOMAINS[dominant_index];
        let dominant_id = format!("metaphor-{}", dominant.id);

        let mut nodes = Vec::new();
        let mut links = Vec::new();

        for &(index, score) in &scored {
            let domain = &DOMAINS[index];
            nodes.push(
                Node::new(format!("metaphor-{}", domain.id), domain.name, Category::Metaphor)
                    .with_emoji(domain.emoji)
                    .with_weight(score as f32 / 2.0),
            );
        }
        for pair in nodes
            .iter()
            .skip(1)
            .map(|hub| hub.id.clone())
            .collect::<Vec<_>>()
        {
            links.push(Link::new(dominant_id.clone(), pair, 1.5));
        }

        let theme = pick_items(dominant.themes, seed, 1);
        if let Some(theme) = theme.first() {
            nodes.push(Node::new("style-theme", *theme, Category::Style));
            links.push(Link::new(dominant_id.clone(), "style-theme", 1.0));
        }

        let mut tag_pool = Self::frequent_tokens(&tokens);
        for tag in dominant.tags {
            if !tag_pool.iter().any(|existing| existing == tag) {
                tag_pool.push((*tag).to_owned());
            }
        }
        let tag_refs = tag_pool.iter().map(String::as_str).collect::<Vec<_>>();
        let tags = pick_items(&tag_refs, seed + 11, TAG_COUNT);
        for tag in &tags {
            let id = format!("tag-{}", slug(tag));
            links.push(Link::new(dominant_id.clone(), id.clone(), 1.0));
            nodes.push(Node::new(id, *tag, Category::Tag));
        }

        for token in Self::unique_tokens(&tokens).into_iter().take(MAX_WORDS) {
            let id = format!("word-{}", slug(token));
            if nodes.iter().any(|node| node.id == id) {
                continue;
            }
            let mut linked = false;
            for &(index, _) in &scored {
                let domain = &DOMAINS[index];
                if domain_matches(domain, token) {
                    links.push(Link::new(format!("metaphor-{}", domain.id), id.clone(), 2.0));
                    linked = true;
                }
            }
            if !linked {
                links.push(Link::new(dominant_id.clone(), id.clone(), 0.5));
            }
            nodes.push(Node::new(id, token, Category::Word));
        }

        for (index, line) in pick_items(dominant.punchlines, seed + 23, PUNCHLINE_COUNT)
            .into_iter()
            .enumerate()
        {
            let id = format!("echo-{index}");
            links.push(Link::new(dominant_id.clone(), id.clone(), 0.5));
            nodes.push(Node::new(id, line, Category::Echo));
        }

        GraphSnapshot::new(nodes, links)
    }
}

/// Short line shown when a node gains focus.
pub fn murmur_for(node: &Node) -> String {
    match node.category {
        Category::Metaphor => format!(
            "{} {} · Un centre respire doucement.",
            node.emoji.as_deref().unwrap_or("🪨"),
            node.label
        ),
        Category::Tag => format!("✧ {} · Une nuance se dévoile.", node.label),
        Category::Echo => format!("🫧 {}", node.label),
        _ => format!("• {}", node.label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stopwords_and_punctuation() {
        assert_eq!(
            tokenize("La pluie, et le VENT dans la nuit!"),
            vec!["pluie", "vent", "nuit"]
        );
        assert!(tokenize("  ,;  ").is_empty());
    }

    #[test]
    fn empty_text_yields_empty_snapshot() {
        assert!(KeywordClassifier.classify("").is_empty());
        assert!(KeywordClassifier.classify("et de la").is_empty());
    }

    #[test]
    fn dominant_domain_becomes_first_hub() {
        let snapshot = KeywordClassifier.classify("une vague de pluie, des larmes et une marée");
        let first = &snapshot.nodes()[0];
        assert_eq!(first.id, "metaphor-water");
        assert_eq!(first.category, Category::Metaphor);
        assert_eq!(first.emoji.as_deref(), Some("💧"));
        assert!(
            snapshot
                .nodes()
                .iter()
                .any(|node| node.category == Category::Tag)
        );
        assert!(
            snapshot
                .nodes()
                .iter()
                .any(|node| node.id == "word-vague")
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "le feu de la colère sous une pierre lourde";
        assert_eq!(
            KeywordClassifier.classify(text),
            KeywordClassifier.classify(text)
        );
    }

    #[test]
    fn unmatched_words_use_fallback_hub() {
        let snapshot = KeywordClassifier.classify("bibliothèque municipale");
        assert_eq!(snapshot.nodes()[0].id, "metaphor-silence");
        assert!(snapshot.node("word-bibliothèque").is_some());
        for link in snapshot.links() {
            assert!(snapshot.node(&link.target).is_some());
        }
    }

    #[test]
    fn pick_items_terminates_when_stride_cycles() {
        let list = ["a", "b", "c"];
        let picked = pick_items(&list, 0, 3);
        assert_eq!(picked.len(), 3);
        assert!(pick_items(&list, 5, 10).len() == 3);
        assert!(pick_items(&[], 5, 2).is_empty());
    }

    #[test]
    fn murmur_depends_on_category() {
        let hub = Node::new("m", "Eau", Category::Metaphor).with_emoji("💧");
        assert!(murmur_for(&hub).starts_with("💧 Eau"));
        let tag = Node::new("t", "flux", Category::Tag);
        assert!(murmur_for(&tag).starts_with("✧ flux"));
    }
}
