use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{Catalog, MemeId, MemeTemplate};
use crate::config::AppConfig;
use crate::export::MemeExporter;
use crate::panel::MemeSettingsPanel;
use crate::preview::PreviewSurface;
use crate::state::SettingsStore;

const SETTINGS_WIDTH: f32 = 420.0;

pub struct MemeApp {
    catalog: Catalog,
    selected_meme: Option<MemeTemplate>,
    prev_selected: Option<MemeId>,
    store: SettingsStore,
    panel: MemeSettingsPanel,
    preview: PreviewSurface,
    exporter: MemeExporter,
    status: String,
    config: AppConfig,
}

impl MemeApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        catalog: Catalog,
        exporter: MemeExporter,
    ) -> Self {
        let status = if catalog.is_empty() {
            "No catalog loaded. Start with `memegen <catalog.json>`".to_string()
        } else {
            format!("{} memes loaded", catalog.len())
        };
        Self {
            catalog,
            selected_meme: None,
            prev_selected: None,
            store: SettingsStore::new(),
            panel: MemeSettingsPanel::new(),
            preview: PreviewSurface::new(),
            exporter,
            status,
            config,
        }
    }

    /// Fits the store and reloads the preview after the selection changed.
    fn sync_selection(&mut self, ctx: &egui::Context) {
        let current = self.selected_meme.as_ref().map(|m| m.id.clone());
        if current == self.prev_selected {
            return;
        }
        let meme = self.selected_meme.as_ref();
        self.store.fit_to(meme.map_or(0, |m| m.box_count));
        self.preview.set_template(meme, ctx);
        if let Some(meme) = meme {
            info!(id = %meme.id, boxes = meme.box_count, "active template changed");
        }
        self.prev_selected = current;
    }

    fn poll_capture(&mut self, ctx: &egui::Context) {
        if let Some(err) = self.preview.take_capture_error() {
            self.status = format!("Export failed: {err}");
        }

        let screenshots: Vec<Arc<egui::ColorImage>> = ctx.input(|i| {
            i.raw
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Screenshot { image, .. } => Some(image.clone()),
                    _ => None,
                })
                .collect()
        });
        for screenshot in screenshots {
            let Some(capture) = self.preview.take_capture() else {
                continue;
            };
            let region = screenshot.region(&capture.rect, Some(ctx.pixels_per_point()));
            self.status = match self.exporter.export(&region, &capture.name) {
                Ok(path) => format!("Saved {}", path.display()),
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "meme export failed");
                    format!("Export failed: {err:#}")
                }
            };
        }
    }
}

impl eframe::App for MemeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let viewport_rect = ctx.input(|i| i.viewport().inner_rect);

        // Track window size for saving on exit
        if let Some(rect) = viewport_rect {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        self.preview.drain(ctx);
        self.poll_capture(ctx);
        self.sync_selection(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(format!(
                        "{} → {}",
                        self.exporter.format().label(),
                        self.exporter.output_dir().display()
                    ));
                });
            });
        });

        egui::SidePanel::right("meme_settings")
            .resizable(true)
            .default_width(SETTINGS_WIDTH)
            .min_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Meme settings");
                ui.add_space(4.0);
                self.panel.show(
                    ui,
                    &self.catalog,
                    &mut self.selected_meme,
                    &mut self.store,
                    &mut self.preview,
                );
            });

        // The panel may have picked a new template this frame.
        self.sync_selection(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.preview.show(ui, self.selected_meme.as_ref(), &self.store);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(path) = self.catalog.source() {
            self.config.catalog_path = Some(path.to_path_buf());
        }
        self.config.save();
    }
}
