use tracing::{debug, info};

use crate::catalog::{Catalog, MemeId, MemeTemplate};
use crate::thumbnail::{ThumbnailCache, draw_thumb};

const THUMB_DISPLAY: f32 = 50.0;
const LIST_MAX_HEIGHT: f32 = 320.0;

/// Searchable template selector. All of its state is ephemeral.
#[derive(Debug, Default)]
pub struct MemePicker {
    search_value: String,
    display_value: String,
    open: bool,
}

impl MemePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn display_value(&self) -> &str {
        &self.display_value
    }

    pub fn search_value(&self) -> &str {
        &self.search_value
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_value = query.into();
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
        if !open {
            self.search_value.clear();
        }
    }

    pub fn button_label(&self) -> &str {
        if self.display_value.is_empty() {
            "Select a meme"
        } else {
            &self.display_value
        }
    }

    /// Chooses `meme`: updates the display value, stores the selection and
    /// closes the picker.
    ///
    /// Choosing the template that is already selected while its name is
    /// displayed clears the display value. Templates are compared by id, so
    /// two templates sharing a name never toggle each other.
    pub fn select(&mut self, meme: &MemeTemplate, selected_meme: &mut Option<MemeTemplate>) {
        let reselect = !self.display_value.is_empty()
            && selected_meme.as_ref().is_some_and(|current| current.id == meme.id);
        self.display_value = if reselect {
            String::new()
        } else {
            meme.name.clone()
        };
        info!(id = %meme.id, name = %meme.name, "meme selected");
        *selected_meme = Some(meme.clone());
        self.set_open(false);
    }

    /// Renders the toggle button and, while open, the popup list below it.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        catalog: &Catalog,
        selected_meme: &mut Option<MemeTemplate>,
        thumbnails: &mut ThumbnailCache,
    ) {
        let button = egui::Button::new(format!("{}  ⏷", self.button_label()))
            .min_size(egui::vec2(ui.available_width(), 0.0));
        let button = ui.add(button);
        if button.clicked() {
            self.set_open(!self.open);
        }
        if !self.open {
            return;
        }
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.set_open(false);
            return;
        }

        let mut chosen: Option<MemeId> = None;
        let popup = egui::Area::new(ui.id().with("meme_picker_popup"))
            .order(egui::Order::Foreground)
            .fixed_pos(button.rect.left_bottom() + egui::vec2(0.0, 2.0))
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(button.rect.width());
                    ui.add(
                        egui::TextEdit::singleline(&mut self.search_value)
                            .hint_text("Search for a meme")
                            .desired_width(f32::INFINITY),
                    );
                    ui.separator();

                    let visible = catalog.filter(&self.search_value);
                    if visible.is_empty() {
                        ui.label(egui::RichText::new("No memes found").weak());
                        return;
                    }

                    let selected_id = selected_meme.as_ref().map(|m| &m.id);
                    egui::ScrollArea::vertical()
                        .id_salt("meme_picker_list")
                        .max_height(LIST_MAX_HEIGHT)
                        .show(ui, |ui| {
                            for meme in visible {
                                thumbnails.request(meme, ui.ctx());
                                let is_selected = selected_id == Some(&meme.id);
                                ui.horizontal(|ui| {
                                    ui.label(if is_selected { "✔" } else { "  " });
                                    draw_thumb(ui, thumbnails.get(&meme.id), THUMB_DISPLAY);
                                    if thumbnails.is_loading(&meme.id) {
                                        ui.spinner();
                                    }
                                    if ui.selectable_label(is_selected, &meme.name).clicked() {
                                        chosen = Some(meme.id.clone());
                                    }
                                });
                            }
                        });
                });
            });

        if let Some(meme) = chosen.as_ref().and_then(|id| catalog.find(id)) {
            self.select(meme, selected_meme);
        } else if !button.clicked() && popup.response.clicked_elsewhere() {
            debug!("meme picker dismissed");
            self.set_open(false);
        }
    }
}
