use std::sync::mpsc;

use anyhow::Context as _;
use tracing::{debug, warn};

use crate::catalog::{MemeId, MemeTemplate};
use crate::state::{BoxSettings, SettingsStore, TextAlign};

/// Downscale loaded templates to this longest-edge size for the preview.
const PREVIEW_MAX: u32 = 1920;
const TEXT_MARGIN: f32 = 0.03;

enum BgResult {
    Loaded {
        id: MemeId,
        rgba: Vec<u8>,
        width: usize,
        height: usize,
    },
    LoadFailed {
        id: MemeId,
        error: String,
    },
}

/// A capture waiting for the next viewport screenshot.
#[derive(Debug, Clone)]
pub struct PendingCapture {
    pub rect: egui::Rect,
    pub name: String,
}

/// The painted template with its text overlays. Export captures this area.
pub struct PreviewSurface {
    current: Option<MemeId>,
    current_name: String,
    texture: Option<egui::TextureHandle>,
    loading: bool,
    load_error: Option<String>,
    /// Screen rect of the last painted template, in points.
    painted_rect: Option<egui::Rect>,
    ctx: Option<egui::Context>,
    pending_capture: Option<PendingCapture>,
    capture_error: Option<String>,
    tx: mpsc::SyncSender<BgResult>,
    rx: mpsc::Receiver<BgResult>,
}

impl PreviewSurface {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(8);
        Self {
            current: None,
            current_name: String::new(),
            texture: None,
            loading: false,
            load_error: None,
            painted_rect: None,
            ctx: None,
            pending_capture: None,
            capture_error: None,
            tx,
            rx,
        }
    }

    pub fn set_template(&mut self, meme: Option<&MemeTemplate>, ctx: &egui::Context) {
        if self.current.as_ref() == meme.map(|m| &m.id) {
            return;
        }
        self.current = meme.map(|m| m.id.clone());
        self.current_name = meme.map(|m| m.name.clone()).unwrap_or_default();
        self.texture = None;
        self.painted_rect = None;
        self.load_error = None;
        self.loading = meme.is_some();

        let Some(meme) = meme else { return };
        let id = meme.id.clone();
        let source = meme.image_source();
        let tx = self.tx.clone();
        let ctx2 = ctx.clone();
        std::thread::spawn(move || {
            match crate::thumbnail::open_source(&source) {
                Ok(img) => {
                    let img = if img.width() > PREVIEW_MAX || img.height() > PREVIEW_MAX {
                        img.thumbnail(PREVIEW_MAX, PREVIEW_MAX)
                    } else {
                        img
                    };
                    let rgba = img.to_rgba8();
                    let width = rgba.width() as usize;
                    let height = rgba.height() as usize;
                    let _ = tx.send(BgResult::Loaded {
                        id,
                        rgba: rgba.into_raw(),
                        width,
                        height,
                    });
                }
                Err(err) => {
                    let _ = tx.send(BgResult::LoadFailed {
                        id,
                        error: format!("{err:#}"),
                    });
                }
            }
            ctx2.request_repaint();
        });
    }

    pub fn drain(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BgResult::Loaded {
                    id,
                    rgba,
                    width,
                    height,
                } => {
                    if self.current.as_ref() == Some(&id) {
                        let img = egui::ColorImage::from_rgba_unmultiplied([width, height], &rgba);
                        self.texture =
                            Some(ctx.load_texture("preview_tex", img, egui::TextureOptions::LINEAR));
                        self.loading = false;
                        debug!(%id, width, height, "template loaded");
                    }
                }
                BgResult::LoadFailed { id, error } => {
                    if self.current.as_ref() == Some(&id) {
                        warn!(%id, %error, "template failed to load");
                        self.loading = false;
                        self.load_error = Some(error);
                    }
                }
            }
        }
    }

    /// Asks the viewport for a screenshot of the painted preview.
    pub fn request_capture(&mut self) -> anyhow::Result<()> {
        let rect = self
            .painted_rect
            .context("preview is not ready; select a meme with a loaded image")?;
        let ctx = self.ctx.as_ref().context("preview has not been shown yet")?;
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
        self.pending_capture = Some(PendingCapture {
            rect,
            name: self.current_name.clone(),
        });
        Ok(())
    }

    pub fn take_capture(&mut self) -> Option<PendingCapture> {
        self.pending_capture.take()
    }

    pub fn record_capture_error(&mut self, error: String) {
        self.capture_error = Some(error);
    }

    pub fn take_capture_error(&mut self) -> Option<String> {
        self.capture_error.take()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, meme: Option<&MemeTemplate>, store: &SettingsStore) {
        self.ctx = Some(ui.ctx().clone());

        let Some(meme) = meme else {
            self.painted_rect = None;
            ui.centered_and_justified(|ui| {
                ui.label("Select a meme to start");
            });
            return;
        };

        let avail = ui.available_size();
        if self.loading {
            self.painted_rect = None;
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        }
        let Some(ref tex) = self.texture else {
            self.painted_rect = None;
            ui.vertical_centered(|ui| {
                ui.label("⚠ Template image unavailable");
                if let Some(ref err) = self.load_error {
                    ui.label(egui::RichText::new(err).weak());
                }
            });
            return;
        };

        let display = fit_size(tex.size_vec2(), avail);
        let (img_rect, _) = ui.allocate_exact_size(display, egui::Sense::hover());
        let img_rect = egui::Rect::from_center_size(
            egui::pos2(ui.max_rect().center().x, img_rect.center().y),
            display,
        );
        let painter = ui.painter_at(img_rect);
        painter.image(
            tex.id(),
            img_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let defaults = BoxSettings::default();
        for index in 0..meme.box_count {
            let settings = store.get(index).unwrap_or(&defaults);
            paint_box_text(&painter, img_rect, settings, index, meme.box_count);
        }
        self.painted_rect = Some(img_rect);
    }
}

fn paint_box_text(
    painter: &egui::Painter,
    img_rect: egui::Rect,
    settings: &BoxSettings,
    index: usize,
    count: usize,
) {
    let text = display_text(settings);
    if text.trim().is_empty() {
        return;
    }
    let ext = &settings.extended;
    let font = egui::FontId::proportional((img_rect.height() * ext.font_size).max(6.0));
    let margin = img_rect.width() * TEXT_MARGIN;
    let wrap_width = (img_rect.width() - 2.0 * margin).max(1.0);

    let fill = painter.layout(text.clone(), font.clone(), settings.color.to_color32(), wrap_width);
    let size = fill.size();

    let x = match ext.align {
        TextAlign::Left => img_rect.left() + margin,
        TextAlign::Center => img_rect.center().x - size.x * 0.5,
        TextAlign::Right => img_rect.right() - margin - size.x,
    };
    let (fraction, valign) = box_anchor(index, count);
    let anchor_y = img_rect.top() + img_rect.height() * fraction;
    let y = match valign {
        egui::Align::Min => anchor_y + margin,
        egui::Align::Center => anchor_y - size.y * 0.5,
        egui::Align::Max => anchor_y - margin - size.y,
    };
    let pos = egui::pos2(x, y);

    if ext.outline_width > 0.0 {
        let outline = painter.layout(text, font, settings.outline_color.to_color32(), wrap_width);
        let w = ext.outline_width;
        for (dx, dy) in OUTLINE_OFFSETS {
            painter.galley(
                pos + egui::vec2(dx * w, dy * w),
                outline.clone(),
                settings.outline_color.to_color32(),
            );
        }
    }
    painter.galley(pos, fill, settings.color.to_color32());
}

const OUTLINE_OFFSETS: [(f32, f32); 8] = [
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 1.0),
    (0.0, 1.0),
    (1.0, 1.0),
];

/// Vertical anchor for box `index` of `count`: the first box hugs the top,
/// the last of several hugs the bottom, the rest sit at their band center.
pub fn box_anchor(index: usize, count: usize) -> (f32, egui::Align) {
    if index == 0 {
        (0.0, egui::Align::Min)
    } else if index + 1 == count {
        (1.0, egui::Align::Max)
    } else {
        ((index as f32 + 0.5) / count as f32, egui::Align::Center)
    }
}

pub fn display_text(settings: &BoxSettings) -> String {
    if settings.extended.all_caps {
        settings.text.to_uppercase()
    } else {
        settings.text.clone()
    }
}

/// Scales `size` to fit inside `avail`, preserving aspect ratio.
pub fn fit_size(size: egui::Vec2, avail: egui::Vec2) -> egui::Vec2 {
    if size.x <= 0.0 || size.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (avail.x / size.x).min(avail.y / size.y).max(0.0);
    size * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ExtendedOptions;

    #[test]
    fn box_anchor_pins_first_and_last_boxes() {
        assert_eq!(box_anchor(0, 1), (0.0, egui::Align::Min));
        assert_eq!(box_anchor(0, 2), (0.0, egui::Align::Min));
        assert_eq!(box_anchor(1, 2), (1.0, egui::Align::Max));
        assert_eq!(box_anchor(1, 4), (0.375, egui::Align::Center));
        assert_eq!(box_anchor(3, 4), (1.0, egui::Align::Max));
    }

    #[test]
    fn display_text_respects_all_caps() {
        let mut settings = BoxSettings {
            text: "Top text".into(),
            ..Default::default()
        };
        assert_eq!(display_text(&settings), "TOP TEXT");
        settings.extended = ExtendedOptions {
            all_caps: false,
            ..Default::default()
        };
        assert_eq!(display_text(&settings), "Top text");
    }

    #[test]
    fn fit_size_preserves_aspect() {
        let fitted = fit_size(egui::vec2(1200.0, 600.0), egui::vec2(600.0, 600.0));
        assert_eq!(fitted, egui::vec2(600.0, 300.0));
        let fitted = fit_size(egui::vec2(300.0, 600.0), egui::vec2(600.0, 300.0));
        assert_eq!(fitted, egui::vec2(150.0, 300.0));
        assert_eq!(fit_size(egui::Vec2::ZERO, egui::vec2(1.0, 1.0)), egui::Vec2::ZERO);
    }

    #[test]
    fn capture_before_paint_is_refused() {
        let mut preview = PreviewSurface::new();
        let err = preview.request_capture().unwrap_err();
        assert!(err.to_string().contains("not ready"));
        assert!(preview.take_capture().is_none());
    }
}
