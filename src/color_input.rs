use crate::handlers::ColorHandler;
use crate::state::{MemeColor, SettingsStore};

/// A color swatch bound to one box index and one color handler.
pub struct ColorInput<'a> {
    pub index: usize,
    pub handler: ColorHandler,
    pub value: MemeColor,
    pub tooltip: &'a str,
}

impl ColorInput<'_> {
    pub fn show(self, ui: &mut egui::Ui, store: &mut SettingsStore) -> egui::Response {
        let mut rgb = self.value.to_array();
        let response = ui.color_edit_button_srgb(&mut rgb).on_hover_text(self.tooltip);
        if response.changed() {
            self.apply(store, MemeColor::from(rgb));
        }
        response
    }

    fn apply(&self, store: &mut SettingsStore, color: MemeColor) {
        if color != self.value {
            (self.handler)(store, color, self.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{handle_outline_color_change, handle_text_color_change};

    #[test]
    fn apply_routes_through_bound_handler() {
        let mut store = SettingsStore::new();
        let input = ColorInput {
            index: 1,
            handler: handle_outline_color_change,
            value: store.outline_color_at(1),
            tooltip: "Change outline color",
        };
        input.apply(&mut store, MemeColor::rgb(0, 0, 255));
        assert_eq!(store.outline_color_at(1), MemeColor::rgb(0, 0, 255));
        assert_eq!(store.color_at(1), MemeColor::WHITE);
    }

    #[test]
    fn unchanged_color_is_not_written() {
        let mut store = SettingsStore::new();
        let input = ColorInput {
            index: 0,
            handler: handle_text_color_change,
            value: MemeColor::WHITE,
            tooltip: "Change text color",
        };
        input.apply(&mut store, MemeColor::WHITE);
        assert_eq!(store.revision(), 0);
    }
}
