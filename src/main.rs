mod app;
mod catalog;
mod color_input;
mod config;
mod export;
mod extended;
mod handlers;
mod panel;
mod picker;
mod preview;
mod state;
mod thumbnail;

use std::path::PathBuf;

use app::MemeApp;
use catalog::Catalog;
use config::AppConfig;
use export::{ExportFormat, ExportOptions, MemeExporter};

const CATALOG_ENV: &str = "MEMEGEN_CATALOG";
const EXPORT_FORMAT_ENV: &str = "MEMEGEN_EXPORT_FORMAT";

fn parse_export_format(value: &str) -> ExportFormat {
    ExportFormat::parse(value).unwrap_or(ExportFormat::Png)
}

fn resolve_export_format(env: Option<String>, config: &AppConfig) -> ExportFormat {
    if let Some(raw) = env {
        return parse_export_format(&raw);
    }
    if let Some(raw) = config.export_format.as_deref() {
        return parse_export_format(raw);
    }
    ExportFormat::Png
}

/// Command line beats environment beats config.
fn resolve_catalog_path(
    arg: Option<String>,
    env: Option<String>,
    config: &AppConfig,
) -> Option<PathBuf> {
    arg.or(env)
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| export::expand_home_prefix(raw.trim()))
        .or_else(|| config.catalog_path.clone())
}

fn load_catalog(path: Option<PathBuf>) -> Catalog {
    let Some(path) = path else {
        tracing::info!("no catalog configured");
        return Catalog::default();
    };
    match Catalog::load(&path) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "catalog unavailable; starting empty");
            Catalog::default()
        }
    }
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let catalog_path = resolve_catalog_path(
        std::env::args().nth(1),
        std::env::var(CATALOG_ENV).ok(),
        &config,
    );
    let catalog = load_catalog(catalog_path);

    let export_dir = config
        .export_dir
        .clone()
        .unwrap_or_else(export::default_export_dir);
    let options = ExportOptions {
        format: resolve_export_format(std::env::var(EXPORT_FORMAT_ENV).ok(), &config),
        ..Default::default()
    };
    tracing::info!(
        dir = %export_dir.display(),
        format = options.format.label(),
        "export target"
    );
    let exporter = MemeExporter::new(export_dir, options);

    let width = config.window_width.unwrap_or(1200.0);
    let height = config.window_height.unwrap_or(800.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("memegen")
            .with_app_id("memegen")
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "memegen",
        native_options,
        Box::new(|cc| Ok(Box::new(MemeApp::new(cc, config, catalog, exporter)))),
    )
}
