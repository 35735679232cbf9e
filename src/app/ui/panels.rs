use eframe::egui::{self, Align, Color32, Context, Layout, Vec2};
use log::{debug, info};

use crate::cloud::{CloudOptions, LocalSink, PromptInput, build_prompt};
use crate::echo::{Classifier, GraphSnapshot, KeywordClassifier, tokenize};
use crate::store::{Session, load_history};

use super::super::graph::GraphEngine;
use super::super::physics::PhysicsConfig;
use super::super::{Feed, LaunchOptions, ViewModel};
use super::{STYLES, USAGES, catalog_label};

const TYPED_SOURCE: &str = "mots déposés";

fn unique_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for token in tokenize(text) {
        if !words.contains(&token) {
            words.push(token);
        }
    }
    words
}

impl ViewModel {
    /// Builds the model from the persisted session, letting the command line
    /// override words, strategy and the cloud toggle. A snapshot loaded from a
    /// file wins over the classifier.
    pub(in crate::app) fn new(snapshot: Option<GraphSnapshot>, options: &LaunchOptions) -> Self {
        let store = options.store.clone();
        match store.path() {
            Some(path) => debug!("session file {}", path.display()),
            None => debug!("session kept in memory only"),
        }
        let mut session = Session::load(&store);
        if let Some(text) = &options.text {
            session.words = unique_words(text);
        }
        if let Some(strategy) = options.strategy {
            session.strategy = strategy;
        }
        session.cloud_enabled |= options.cloud;
        session.persist(&store);

        let classifier: Box<dyn Classifier> = Box::new(KeywordClassifier);
        let source_label = match (&snapshot, &options.graph_path) {
            (Some(_), Some(path)) => path.display().to_string(),
            _ => TYPED_SOURCE.to_owned(),
        };
        let snapshot = snapshot.unwrap_or_else(|| classifier.classify(&session.words.join(" ")));
        info!(
            "starting with {} nodes from {source_label} ({} layout)",
            snapshot.nodes().len(),
            session.strategy.label()
        );

        let engine = GraphEngine::new(
            snapshot,
            session.strategy,
            PhysicsConfig::default(),
            options.platform,
            Vec2::ZERO,
        );
        let cloud = CloudOptions {
            enabled: session.cloud_enabled,
            ..CloudOptions::default()
        };

        Self {
            engine,
            feed: Feed {
                history: load_history(&store),
                store,
                murmur: None,
                selection: Vec::new(),
            },
            classifier,
            sink: Box::new(LocalSink),
            draft: session.words.join(" "),
            session,
            search: String::new(),
            cloud,
            cloud_reply: None,
            source_label,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("cosmobulle");
                    ui.separator();
                    ui.label(format!("source : {}", self.source_label));
                    ui.label(format!("nœuds : {}", self.engine.snapshot().nodes().len()));
                    ui.label(format!("liens : {}", self.engine.snapshot().links().len()));
                    ui.label(format!("disposition : {}", self.engine.strategy().label()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(badge) = self.engine.degraded_badge() {
                            ui.colored_label(Color32::from_rgb(251, 191, 36), badge);
                        }
                        ui.label(format!("zoom ×{:.2}", self.engine.camera().scale()));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.engine.show(ui, &mut self.feed));
    }

    /// Classifies the draft text and hands the new snapshot to the scene.
    pub(in crate::app) fn deposit(&mut self) {
        self.session.words = unique_words(&self.draft);
        let snapshot = self.classifier.classify(&self.session.words.join(" "));
        self.engine.set_snapshot(snapshot, &mut self.feed);
        self.source_label = TYPED_SOURCE.to_owned();
        self.cloud_reply = None;
        self.persist_session();
    }

    pub(in crate::app) fn prompt_text(&self) -> String {
        let input = PromptInput::from_snapshot(
            self.engine.snapshot(),
            catalog_label(&STYLES, &self.session.style_id),
            catalog_label(&USAGES, &self.session.usage_id),
        );
        build_prompt(&input)
    }

    pub(in crate::app) fn send_prompt(&mut self) {
        let prompt = self.prompt_text();
        self.cloud_reply = Some(self.sink.send(&prompt, &self.cloud));
    }

    pub(in crate::app) fn persist_session(&self) {
        self.session.persist(&self.feed.store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Platform;
    use crate::app::graph::GraphHost;
    use crate::echo::{Category, Node};
    use crate::layout::LayoutStrategy;
    use crate::store::LocalStore;

    fn options(store: LocalStore, text: Option<&str>) -> LaunchOptions {
        LaunchOptions {
            text: text.map(str::to_owned),
            graph_path: None,
            strategy: Some(LayoutStrategy::Physics),
            store,
            cloud: false,
            platform: Platform::default(),
        }
    }

    #[test]
    fn words_are_deduplicated_in_order() {
        assert_eq!(unique_words("Mer, mer et VAGUE mer"), ["mer", "vague"]);
    }

    #[test]
    fn launch_text_overrides_and_persists_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::at(dir.path().join("store.json"));
        let model = ViewModel::new(None, &options(store.clone(), Some("la pluie sur la mer")));

        assert!(!model.engine.snapshot().is_empty());
        assert_eq!(model.draft, "pluie mer");
        assert_eq!(model.engine.strategy(), LayoutStrategy::Physics);

        let session = Session::load(&store);
        assert_eq!(session.words, ["pluie", "mer"]);
        assert_eq!(session.strategy, LayoutStrategy::Physics);
    }

    #[test]
    fn deposit_replaces_the_scene() {
        let mut model = ViewModel::new(None, &options(LocalStore::disabled(), None));
        assert!(model.engine.snapshot().is_empty());

        model.draft = "le vent souffle sur la forêt".to_owned();
        model.deposit();
        assert!(!model.engine.snapshot().is_empty());
        assert_eq!(model.session.words, ["vent", "souffle", "forêt"]);
        assert!(model.prompt_text().contains("vent"));
    }

    #[test]
    fn disabled_cloud_answers_locally() {
        let mut model = ViewModel::new(None, &options(LocalStore::disabled(), Some("mer")));
        model.send_prompt();
        let reply = model.cloud_reply.as_ref().unwrap();
        assert_eq!(reply.provider, "local");
        assert_eq!(reply.prompt, model.prompt_text());
    }

    #[test]
    fn synthesized_pairs_land_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = ViewModel::new(None, &options(LocalStore::at(dir.path().join("s.json")), None));
        let water = Node::new("m", "Eau", Category::Metaphor);
        let rain = Node::new("w", "pluie", Category::Word);

        model.feed.on_pair_synthesized([&water, &rain], "Eau et pluie.");
        assert_eq!(model.feed.history.len(), 1);
        assert_eq!(load_history(&model.feed.store)[0].pair, ["m".to_owned(), "w".to_owned()]);

        model.feed.on_focus_change(Some(&water));
        assert!(model.feed.murmur.as_deref().is_some_and(|murmur| murmur.contains("Eau")));
        model.feed.on_reset();
        assert!(model.feed.murmur.is_none());
    }
}
