use tracing::debug;

use crate::catalog::{Catalog, MemeId, MemeTemplate};
use crate::color_input::ColorInput;
use crate::extended::show_extended_settings;
use crate::handlers::{
    handle_generate_meme, handle_outline_color_change, handle_text_change,
    handle_text_color_change,
};
use crate::picker::MemePicker;
use crate::preview::PreviewSurface;
use crate::state::SettingsStore;
use crate::thumbnail::ThumbnailCache;

/// One text-box editor row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxEditor {
    pub index: usize,
    pub placeholder: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    NoMemeSelected,
    MemeSelected(usize),
}

pub fn build_editors(box_count: usize) -> Vec<BoxEditor> {
    (0..box_count)
        .map(|index| BoxEditor {
            index,
            placeholder: format!("Text #{}", index + 1),
        })
        .collect()
}

/// Picker plus one editor per text box of the selected template.
pub struct MemeSettingsPanel {
    picker: MemePicker,
    thumbnails: ThumbnailCache,
    editors: Vec<BoxEditor>,
    /// Template the editor list was built for.
    editors_key: Option<MemeId>,
    rebuilds: usize,
}

impl MemeSettingsPanel {
    pub fn new() -> Self {
        Self {
            picker: MemePicker::new(),
            thumbnails: ThumbnailCache::new(),
            editors: Vec::new(),
            editors_key: None,
            rebuilds: 0,
        }
    }

    pub fn picker(&self) -> &MemePicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut MemePicker {
        &mut self.picker
    }

    pub fn editors(&self) -> &[BoxEditor] {
        &self.editors
    }

    pub fn state(&self) -> PanelState {
        match self.editors_key {
            Some(_) => PanelState::MemeSelected(self.editors.len()),
            None => PanelState::NoMemeSelected,
        }
    }

    /// Rebuilds the editor list when the selected template changed.
    /// Returns `true` if it was rebuilt.
    pub fn sync_editors(&mut self, selected: Option<&MemeTemplate>) -> bool {
        let key = selected.map(|m| m.id.clone());
        if key == self.editors_key {
            return false;
        }
        self.editors = build_editors(selected.map_or(0, |m| m.box_count));
        self.editors_key = key;
        self.rebuilds += 1;
        debug!(editors = self.editors.len(), "rebuilt box editors");
        true
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        catalog: &Catalog,
        selected_meme: &mut Option<MemeTemplate>,
        store: &mut SettingsStore,
        preview: &mut PreviewSurface,
    ) {
        self.thumbnails.poll(ui.ctx());
        self.picker.show(ui, catalog, selected_meme, &mut self.thumbnails);
        self.sync_editors(selected_meme.as_ref());

        ui.add_space(8.0);
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("box_editors")
            .auto_shrink([false, true])
            .max_height((ui.available_height() - 48.0).max(80.0))
            .show(ui, |ui| {
                for editor in &self.editors {
                    show_box_editor(ui, editor, store);
                    ui.add_space(4.0);
                }
            });

        ui.separator();
        let button = egui::Button::new("Download meme ⬇")
            .min_size(egui::vec2(ui.available_width(), 28.0));
        if ui.add(button).clicked() {
            handle_generate_meme(preview);
        }
    }
}

pub fn box_text_id(index: usize) -> egui::Id {
    egui::Id::new(("box_text", index))
}

fn show_box_editor(ui: &mut egui::Ui, editor: &BoxEditor, store: &mut SettingsStore) {
    let i = editor.index;
    ui.horizontal(|ui| {
        let mut text = store.text_at(i).to_owned();
        let response = ui.add(
            egui::TextEdit::singleline(&mut text)
                .id(box_text_id(i))
                .hint_text(editor.placeholder.as_str())
                .desired_width((ui.available_width() - 110.0).max(60.0)),
        );
        if response.changed() {
            handle_text_change(store, &text, i);
        }

        ColorInput {
            index: i,
            handler: handle_text_color_change,
            value: store.color_at(i),
            tooltip: "Change text color",
        }
        .show(ui, store);
        ColorInput {
            index: i,
            handler: handle_outline_color_change,
            value: store.outline_color_at(i),
            tooltip: "Change outline color",
        }
        .show(ui, store);

        show_extended_settings(ui, store, i);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meme(id: &str, name: &str, box_count: usize) -> MemeTemplate {
        MemeTemplate::new(id, name, format!("{name}.png"), box_count)
    }

    fn render(
        panel: &mut MemeSettingsPanel,
        catalog: &Catalog,
        selected: &mut Option<MemeTemplate>,
        store: &mut SettingsStore,
    ) {
        render_frame(
            &egui::Context::default(),
            egui::RawInput::default(),
            panel,
            catalog,
            selected,
            store,
        );
    }

    fn render_frame(
        ctx: &egui::Context,
        input: egui::RawInput,
        panel: &mut MemeSettingsPanel,
        catalog: &Catalog,
        selected: &mut Option<MemeTemplate>,
        store: &mut SettingsStore,
    ) {
        let mut preview = PreviewSurface::new();
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                panel.show(ui, catalog, selected, store, &mut preview);
            });
        });
    }

    #[test]
    fn editors_match_box_count() {
        let mut panel = MemeSettingsPanel::new();
        assert_eq!(panel.state(), PanelState::NoMemeSelected);
        assert!(panel.editors().is_empty());

        for n in [0, 1, 2, 5] {
            let template = meme(&format!("m{n}"), "Any", n);
            panel.sync_editors(Some(&template));
            assert_eq!(panel.editors().len(), n);
            assert_eq!(panel.state(), PanelState::MemeSelected(n));
        }

        panel.sync_editors(None);
        assert_eq!(panel.state(), PanelState::NoMemeSelected);
        assert!(panel.editors().is_empty());
    }

    #[test]
    fn editors_are_dense_with_numbered_placeholders() {
        let editors = build_editors(3);
        let indices: Vec<_> = editors.iter().map(|e| e.index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(editors[2].placeholder, "Text #3");
    }

    #[test]
    fn editor_list_is_memoized_on_selection() {
        let mut panel = MemeSettingsPanel::new();
        let mut store = SettingsStore::new();
        let drake = meme("1", "Drake", 2);

        assert!(panel.sync_editors(Some(&drake)));
        handle_text_change(&mut store, "edit", 0);
        assert!(!panel.sync_editors(Some(&drake)));
        assert_eq!(panel.rebuilds, 1);
    }

    #[test]
    fn switching_three_boxes_to_one() {
        let memes = vec![meme("1", "Three", 3), meme("2", "One", 1)];
        let mut panel = MemeSettingsPanel::new();
        let mut store = SettingsStore::new();
        let mut selected = None;

        panel.picker_mut().select(&memes[0], &mut selected);
        store.fit_to(3);
        for i in 0..3 {
            handle_text_change(&mut store, &format!("box {i}"), i);
        }
        panel.sync_editors(selected.as_ref());
        assert_eq!(panel.editors().len(), 3);

        panel.picker_mut().select(&memes[1], &mut selected);
        store.fit_to(1);
        panel.sync_editors(selected.as_ref());

        assert_eq!(panel.editors().len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.text_at(0), "box 0");
        assert!(store.get(1).is_none());
    }

    #[test]
    fn drake_and_doge_scenario() {
        let memes = vec![meme("1", "Drake", 2), meme("2", "Doge", 1)];
        let catalog = Catalog::new(memes.clone());
        let mut panel = MemeSettingsPanel::new();
        let mut store = SettingsStore::new();
        let mut selected = None;

        render(&mut panel, &catalog, &mut selected, &mut store);
        assert_eq!(panel.state(), PanelState::NoMemeSelected);

        panel.picker_mut().select(&memes[0], &mut selected);
        store.fit_to(2);
        render(&mut panel, &catalog, &mut selected, &mut store);
        assert_eq!(panel.editors().len(), 2);

        handle_text_change(&mut store, "Top text", 0);
        assert_eq!(store.meme_settings().settings[0].text, "Top text");
        assert_eq!(store.text_at(1), "");

        panel.picker_mut().select(&memes[1], &mut selected);
        store.fit_to(1);
        render(&mut panel, &catalog, &mut selected, &mut store);
        assert_eq!(panel.editors().len(), 1);
        assert!(!panel.picker().is_open());
    }

    #[test]
    fn rendering_with_empty_catalog_shows_no_editors() {
        let mut panel = MemeSettingsPanel::new();
        let mut store = SettingsStore::new();
        let mut selected = None;
        panel.picker_mut().set_open(true);

        render(&mut panel, &Catalog::default(), &mut selected, &mut store);

        assert!(panel.picker().is_open());
        assert!(panel.editors().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn typing_in_second_editor_writes_only_that_box() {
        let drake = meme("1", "Drake", 2);
        let catalog = Catalog::new(vec![drake.clone()]);
        let mut panel = MemeSettingsPanel::new();
        let mut store = SettingsStore::new();
        let mut selected = None;
        panel.picker_mut().select(&drake, &mut selected);
        store.fit_to(2);
        handle_text_change(&mut store, "Bottom", 0);

        let ctx = egui::Context::default();
        render_frame(&ctx, Default::default(), &mut panel, &catalog, &mut selected, &mut store);
        ctx.memory_mut(|m| m.request_focus(box_text_id(1)));
        let typing = egui::RawInput {
            events: vec![egui::Event::Text("Top".into())],
            ..Default::default()
        };
        render_frame(&ctx, typing, &mut panel, &catalog, &mut selected, &mut store);

        assert_eq!(store.text_at(1), "Top");
        assert_eq!(store.text_at(0), "Bottom");
        assert_eq!(store.len(), 2);
    }
}
