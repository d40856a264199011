//! Functions that mutate the shared settings store.
//!
//! The panel never writes to the store directly; every edit event is routed
//! through one of these with the box index it targets.

use tracing::{info, warn};

use crate::preview::PreviewSurface;
use crate::state::{ExtendedOptions, MemeColor, SettingsStore};

/// Signature shared by the two color handlers.
pub type ColorHandler = fn(&mut SettingsStore, MemeColor, usize);

pub fn handle_text_change(store: &mut SettingsStore, text: &str, index: usize) {
    store.update(index, |b| b.text = text.to_owned());
}

pub fn handle_text_color_change(store: &mut SettingsStore, color: MemeColor, index: usize) {
    store.update(index, |b| b.color = color);
}

pub fn handle_outline_color_change(store: &mut SettingsStore, color: MemeColor, index: usize) {
    store.update(index, |b| b.outline_color = color);
}

pub fn handle_extended_change(store: &mut SettingsStore, options: ExtendedOptions, index: usize) {
    store.update(index, |b| b.extended = options);
}

/// Starts exporting the preview. Errors are recorded on the preview for the
/// application to report; the caller gets nothing back.
pub fn handle_generate_meme(preview: &mut PreviewSurface) {
    match preview.request_capture() {
        Ok(()) => info!("meme export requested"),
        Err(err) => {
            warn!(error = %err, "meme export refused");
            preview.record_capture_error(format!("{err:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_change_touches_only_its_index() {
        let mut store = SettingsStore::new();
        store.fit_to(3);
        handle_text_change(&mut store, "left", 0);
        handle_text_change(&mut store, "right", 2);
        let before = store.meme_settings().clone();

        handle_text_change(&mut store, "middle", 1);

        assert_eq!(store.text_at(1), "middle");
        assert_eq!(store.get(0), before.settings.get(0));
        assert_eq!(store.get(2), before.settings.get(2));
    }

    #[test]
    fn color_handlers_write_their_own_field() {
        let mut store = SettingsStore::new();
        let red = MemeColor::rgb(255, 0, 0);
        handle_text_color_change(&mut store, red, 0);
        assert_eq!(store.color_at(0), red);
        assert_eq!(store.outline_color_at(0), MemeColor::BLACK);

        handle_outline_color_change(&mut store, MemeColor::WHITE, 0);
        assert_eq!(store.outline_color_at(0), MemeColor::WHITE);
        assert_eq!(store.color_at(0), red);
    }

    #[test]
    fn handlers_materialize_missing_indices() {
        let mut store = SettingsStore::new();
        let options = ExtendedOptions {
            all_caps: false,
            ..Default::default()
        };
        handle_extended_change(&mut store, options.clone(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.extended_at(1), options);
        assert_eq!(store.extended_at(0), ExtendedOptions::default());
    }

    #[test]
    fn every_edit_bumps_revision() {
        let mut store = SettingsStore::new();
        handle_text_change(&mut store, "a", 0);
        handle_text_change(&mut store, "ab", 0);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn generate_without_preview_records_error() {
        let mut preview = PreviewSurface::new();
        handle_generate_meme(&mut preview);
        assert!(preview.take_capture().is_none());
        assert!(preview.take_capture_error().is_some());
    }
}
