use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod media;
mod ui;

use clap::Parser;
use client_core::{load_settings, Settings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{ScoreSenseApp, StartupConfig};

#[derive(Debug, Parser)]
#[command(name = "scoresense-gui", about = "Desktop viewer for ScoreSense visualizations")]
struct Args {
    /// Backend base URL, overriding config files and environment.
    #[arg(long)]
    base_url: Option<String>,
    /// Explicit settings file instead of the default search locations.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn resolve_settings(args: &Args) -> Settings {
    let mut settings = match &args.config {
        Some(path) => match client_core::config::load_settings_file(path) {
            Ok(mut settings) => {
                client_core::config::apply_overrides(&mut settings, |key| std::env::var(key).ok());
                settings
            }
            Err(err) => {
                tracing::warn!("{err:#}; falling back to default settings");
                load_settings()
            }
        },
        None => load_settings(),
    };
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    settings
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = resolve_settings(&args);
    let startup = StartupConfig {
        base_url: settings.base_url.clone(),
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("ScoreSense")
            .with_inner_size([960.0, 820.0])
            .with_min_inner_size([640.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "ScoreSense",
        options,
        Box::new(|_cc| Ok(Box::new(ScoreSenseApp::new(cmd_tx, ui_rx, startup)))),
    )
}
