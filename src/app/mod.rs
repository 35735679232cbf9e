use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context as _, Result};
use eframe::egui::{self, Context};
use log::{debug, info};

use crate::cloud::{CloudOptions, CloudReply, PromptSink};
use crate::echo::{Classifier, GraphSnapshot, Node, murmur_for, parse_snapshot};
use crate::layout::LayoutStrategy;
use crate::store::{LocalStore, ResonanceRecord, Session, record_resonance};

mod camera;
mod gesture;
mod graph;
mod highlight;
mod physics;
mod render_utils;
mod selection;
mod ui;

pub use graph::Platform;

use graph::{GraphEngine, GraphHost};

/// Everything the command line decides before the window opens.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub text: Option<String>,
    pub graph_path: Option<PathBuf>,
    pub strategy: Option<LayoutStrategy>,
    pub store: LocalStore,
    pub cloud: bool,
    pub platform: Platform,
}

pub struct CosmoApp {
    options: LaunchOptions,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// Receives the scene's callbacks and keeps what the side panels show.
struct Feed {
    store: LocalStore,
    murmur: Option<String>,
    selection: Vec<String>,
    history: Vec<ResonanceRecord>,
}

impl GraphHost for Feed {
    fn on_focus_change(&mut self, node: Option<&Node>) {
        if let Some(node) = node {
            info!("focus on {}", node.id);
        }
        self.murmur = node.map(murmur_for);
    }

    fn on_selection_change(&mut self, ids: &[String]) {
        info!("selection is now {ids:?}");
        self.selection = ids.to_vec();
    }

    fn on_empty_tap(&mut self) {
        debug!("empty tap");
    }

    fn on_reset(&mut self) {
        info!("scene reset");
        self.murmur = None;
        self.selection.clear();
    }

    fn on_pair_synthesized(&mut self, pair: [&Node; 2], text: &str) {
        info!("resonance between {} and {}", pair[0].id, pair[1].id);
        let ids = [pair[0].id.clone(), pair[1].id.clone()];
        let record = ResonanceRecord::now(ids, text.to_owned());
        self.history = record_resonance(&self.store, record);
    }
}

struct ViewModel {
    engine: GraphEngine,
    feed: Feed,
    classifier: Box<dyn Classifier>,
    sink: Box<dyn PromptSink>,
    session: Session,
    draft: String,
    search: String,
    cloud: CloudOptions,
    cloud_reply: Option<CloudReply>,
    source_label: String,
}

impl CosmoApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let state = Self::start(&options);
        Self { options, state }
    }

    fn start(options: &LaunchOptions) -> AppState {
        match &options.graph_path {
            Some(path) => AppState::Loading {
                rx: Self::spawn_load(path.clone()),
            },
            None => AppState::Ready(Box::new(ViewModel::new(None, options))),
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<Result<GraphSnapshot, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_snapshot_file(&path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }
}

fn load_snapshot_file(path: &Path) -> Result<GraphSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    parse_snapshot(&raw).with_context(|| format!("invalid graph file {}", path.display()))
}

impl eframe::App for CosmoApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(snapshot)) => {
                        let model = ViewModel::new(Some(snapshot), &self.options);
                        transition = Some(AppState::Ready(Box::new(model)));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        let message = "Le chargement en arrière-plan s'est interrompu.".to_owned();
                        transition = Some(AppState::Error(message));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Chargement du graphe...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Impossible de charger le graphe");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("Réessayer").clicked() {
                            transition = Some(Self::start(&self.options));
                        }
                        if ui.button("Continuer avec les mots").clicked() {
                            transition =
                                Some(AppState::Ready(Box::new(ViewModel::new(None, &self.options))));
                        }
                    });
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
