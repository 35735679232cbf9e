mod app;
mod cloud;
mod echo;
mod layout;
mod store;
mod util;

use std::env;
use std::path::PathBuf;

use clap::Parser;

use crate::app::{LaunchOptions, Platform};
use crate::layout::LayoutStrategy;
use crate::store::LocalStore;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Words to start with instead of the saved session.
    #[arg(long)]
    text: Option<String>,
    /// Load a graph snapshot from a JSON file instead of classifying words.
    #[arg(long)]
    graph: Option<PathBuf>,
    #[arg(long, value_enum)]
    strategy: Option<LayoutStrategy>,
    /// Session file. Defaults to the user data directory.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Enable the optional cloud prompt sink.
    #[arg(long)]
    cloud: bool,
    /// Compute the layout once instead of animating it.
    #[arg(long)]
    no_animation: bool,
    /// Keep the first viewport size and ignore resizes.
    #[arg(long)]
    frozen_viewport: bool,
}

fn default_store_path() -> Option<PathBuf> {
    let data_home = env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))?;
    Some(data_home.join("cosmobulle").join("store.json"))
}

impl Args {
    fn into_launch_options(self) -> LaunchOptions {
        let store = match self.store.or_else(default_store_path) {
            Some(path) => LocalStore::at(path),
            None => {
                log::warn!("no data directory found, the session will not be saved");
                LocalStore::disabled()
            }
        };

        LaunchOptions {
            text: self.text,
            graph_path: self.graph,
            strategy: self.strategy,
            store,
            cloud: self.cloud,
            platform: Platform {
                animation: !self.no_animation,
                resize: !self.frozen_viewport,
            },
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let launch = Args::parse().into_launch_options();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "cosmobulle",
        options,
        Box::new(move |cc| Ok(Box::new(app::CosmoApp::new(cc, launch)))),
    )
}
