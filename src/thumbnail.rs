use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, bail};
use image::DynamicImage;

use crate::catalog::{ImageSource, MemeId, MemeTemplate};

/// Pixel size thumbnails are decoded at.
pub const THUMB_SIZE: u32 = 100;

static SUPPORTED_IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif"];

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    exts.iter().any(|known| ext.eq_ignore_ascii_case(known))
}

/// Returns `true` if the path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    has_extension(path, SUPPORTED_IMAGE_EXTS)
}

/// Opens a template image. Remote images are not fetched.
pub fn open_source(source: &ImageSource) -> anyhow::Result<DynamicImage> {
    match source {
        ImageSource::Remote(url) => bail!("remote image {url} is not available offline"),
        ImageSource::Local(path) => {
            if !is_supported_image(path) {
                bail!("unsupported image type: {}", path.display());
            }
            image::open(path).with_context(|| format!("failed to open {}", path.display()))
        }
    }
}

fn generate_thumb(source: &ImageSource) -> Option<(Vec<u8>, usize, usize)> {
    let img = open_source(source).ok()?;
    let rgba = img.thumbnail(THUMB_SIZE, THUMB_SIZE).to_rgba8();
    let w = rgba.width() as usize;
    let h = rgba.height() as usize;
    Some((rgba.into_raw(), w, h))
}

enum ThumbState {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

struct ThumbResult {
    id: MemeId,
    rgba: Option<(Vec<u8>, usize, usize)>,
}

/// Lazily decoded picker thumbnails keyed by template id.
pub struct ThumbnailCache {
    thumbnails: HashMap<MemeId, ThumbState>,
    tx: mpsc::SyncSender<ThumbResult>,
    rx: mpsc::Receiver<ThumbResult>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(64);
        Self {
            thumbnails: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Queues a background decode for `meme` unless one is known already.
    pub fn request(&mut self, meme: &MemeTemplate, ctx: &egui::Context) {
        if self.thumbnails.contains_key(&meme.id) {
            return;
        }
        let source = meme.image_source();
        if matches!(source, ImageSource::Remote(_)) {
            self.thumbnails.insert(meme.id.clone(), ThumbState::Failed);
            return;
        }
        self.thumbnails.insert(meme.id.clone(), ThumbState::Loading);
        let tx = self.tx.clone();
        let ctx2 = ctx.clone();
        let id = meme.id.clone();
        std::thread::spawn(move || {
            let rgba = generate_thumb(&source);
            let _ = tx.send(ThumbResult { id, rgba });
            ctx2.request_repaint();
        });
    }

    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok(ThumbResult { id, rgba }) = self.rx.try_recv() {
            let state = match rgba {
                Some((data, w, h)) => {
                    let img = egui::ColorImage::from_rgba_unmultiplied([w, h], &data);
                    let tex = ctx.load_texture(
                        format!("thumb_{id}"),
                        img,
                        egui::TextureOptions::LINEAR,
                    );
                    ThumbState::Ready(tex)
                }
                None => ThumbState::Failed,
            };
            self.thumbnails.insert(id, state);
        }
    }

    pub fn get(&self, id: &MemeId) -> Option<(egui::TextureId, egui::Vec2)> {
        match self.thumbnails.get(id) {
            Some(ThumbState::Ready(tex)) => Some((tex.id(), tex.size_vec2())),
            _ => None,
        }
    }

    pub fn is_loading(&self, id: &MemeId) -> bool {
        matches!(self.thumbnails.get(id), Some(ThumbState::Loading))
    }
}

/// Paints a square thumbnail cell, falling back to a placeholder.
pub fn draw_thumb(ui: &mut egui::Ui, thumb: Option<(egui::TextureId, egui::Vec2)>, size: f32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
    let painter = ui.painter();
    match thumb {
        Some((tex_id, tex_size)) => {
            let scale = (size / tex_size.x).min(size / tex_size.y);
            let display = tex_size * scale;
            let offset = (egui::vec2(size, size) - display) * 0.5;
            let draw_rect = egui::Rect::from_min_size(rect.min + offset, display);
            painter.image(
                tex_id,
                draw_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.rect_filled(rect, 6.0, egui::Color32::from_gray(40));
        }
    }
}
