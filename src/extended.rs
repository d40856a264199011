use crate::handlers::handle_extended_change;
use crate::state::{ExtendedOptions, SettingsStore, TextAlign};

/// Settings button opening the secondary options for box `index`.
pub fn show_extended_settings(ui: &mut egui::Ui, store: &mut SettingsStore, index: usize) {
    let response = ui.menu_button("⚙", |ui| {
        ui.set_min_width(220.0);
        ui.label(egui::RichText::new(format!("Text #{}", index + 1)).strong());
        ui.separator();

        let mut options = store.extended_at(index);
        if edit_options(ui, &mut options, index) {
            handle_extended_change(store, options, index);
        }
    });
    response.response.on_hover_text("More text settings");
}

fn edit_options(ui: &mut egui::Ui, options: &mut ExtendedOptions, index: usize) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Size");
        changed |= ui
            .add(
                egui::Slider::new(&mut options.font_size, 0.03_f32..=0.25_f32)
                    .fixed_decimals(2)
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
    });

    ui.horizontal(|ui| {
        ui.label("Outline");
        changed |= ui
            .add(
                egui::Slider::new(&mut options.outline_width, 0.0_f32..=6.0_f32)
                    .suffix(" pt")
                    .fixed_decimals(1)
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
    });

    changed |= ui.checkbox(&mut options.all_caps, "All caps").changed();

    egui::ComboBox::from_id_salt(("box_align", index))
        .selected_text(options.align.label())
        .show_ui(ui, |ui| {
            for align in TextAlign::ALL {
                changed |= ui
                    .selectable_value(&mut options.align, align, align.label())
                    .changed();
            }
        });

    if *options != ExtendedOptions::default() {
        ui.add_space(4.0);
        if ui.small_button("Reset").clicked() {
            *options = ExtendedOptions::default();
            changed = true;
        }
    }

    changed
}
