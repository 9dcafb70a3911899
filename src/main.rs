// pixview - A directory image viewer for Wayland
// Browses the images of one folder with a right-click popup menu and a thumbnail grid

mod app;
mod button;
mod canvas;
mod cli;
mod config;
mod error;
mod image_loader;
mod input;
mod menu;
mod viewer;
mod views;
mod wayland;

use anyhow::Result;
use app::{App, DesktopPlatform};
use config::Config;
use image_loader::ImageStore;
use log::{info, warn};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = cli::parse_args();

    let config_path = args.config.or_else(config::default_path);
    let config = match &config_path {
        Some(path) => config::load_or_create(path).unwrap_or_else(|e| {
            warn!("{}; using default settings", e);
            Config::default()
        }),
        None => {
            warn!("No config directory available; using default settings");
            Config::default()
        }
    };
    info!(
        "Settings: gridStep={}, defaultMode={}",
        config.grid_step,
        config.default_mode.label()
    );

    let store = ImageStore::scan(&args.directory);
    if store.is_empty() {
        warn!("No supported images in {}", args.directory.display());
    }

    let app = App::new(config, config_path, store, Box::new(DesktopPlatform));
    wayland::run(app)
}
