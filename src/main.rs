mod app;
mod config;
mod location;
mod map;
mod ui;
mod weather;

use clap::Parser;
use eframe::egui;
use mimalloc::MiMalloc;

use app::{RainScopeApp, StartView};
use config::AppConfig;
use map::MapStyle;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Animated precipitation radar and satellite imagery on a slippy map.
#[derive(Parser, Debug)]
#[command(name = "rainscope", version, about, long_about = None)]
struct Args {
    /// Startup latitude (defaults to the configured home view)
    #[arg(long)]
    lat: Option<f64>,

    /// Startup longitude
    #[arg(long)]
    lon: Option<f64>,

    /// Startup zoom level
    #[arg(long)]
    zoom: Option<f32>,

    /// Basemap for this run: dark, light, satellite or terrain
    #[arg(long)]
    style: Option<String>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });

    let style = args
        .style
        .as_deref()
        .and_then(|name| {
            let parsed = MapStyle::from_name(name);
            if parsed.is_none() {
                log::warn!("Unknown basemap style {name:?}, using the configured one");
            }
            parsed
        })
        .unwrap_or(config.map_style);

    let start = StartView {
        lat: args.lat.unwrap_or(config.home_latitude),
        lon: args.lon.unwrap_or(config.home_longitude),
        zoom: args.zoom.unwrap_or(config.home_zoom),
        style,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("RainScope"),
        ..Default::default()
    };

    eframe::run_native(
        "RainScope",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(RainScopeApp::new(config, start)?))
        }),
    )
}
