use std::path::{Path, PathBuf};

use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{
    CompressionType as PngCompressionType, FilterType as PngFilterType, PngEncoder,
};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, RgbaImage};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpg,
    Webp,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpg => "JPG",
            ExportFormat::Webp => "WebP",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpg),
            "webp" => Some(ExportFormat::Webp),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub jpg_quality: u8,
    pub png_compression: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            jpg_quality: 90,
            png_compression: 6,
        }
    }
}

/// Writes captured previews to the export directory.
pub struct MemeExporter {
    output_dir: PathBuf,
    options: ExportOptions,
}

impl MemeExporter {
    pub fn new(output_dir: PathBuf, options: ExportOptions) -> Self {
        Self {
            output_dir,
            options,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> ExportFormat {
        self.options.format
    }

    /// Exports a captured screen region under a name derived from `name`.
    pub fn export(&self, capture: &egui::ColorImage, name: &str) -> anyhow::Result<PathBuf> {
        self.export_rgba(color_image_to_rgba(capture)?, name)
    }

    pub fn export_rgba(&self, rgba: RgbaImage, name: &str) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("failed to create export dir {}", self.output_dir.display())
        })?;
        let stem = file_stem_for(name);
        let output_path = build_output_path(&stem, &self.output_dir, self.options.format);
        write_image(DynamicImage::ImageRgba8(rgba), &output_path, self.options)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        info!(path = %output_path.display(), "meme exported");
        Ok(output_path)
    }
}

fn color_image_to_rgba(capture: &egui::ColorImage) -> anyhow::Result<RgbaImage> {
    let [w, h] = capture.size;
    if w == 0 || h == 0 {
        anyhow::bail!("captured preview is empty");
    }
    let raw: Vec<u8> = capture
        .pixels
        .iter()
        .flat_map(|c| c.to_srgba_unmultiplied())
        .collect();
    RgbaImage::from_raw(w as u32, h as u32, raw).context("capture size does not match pixel data")
}

/// Lowercase, dash-separated file stem for a template name.
pub fn file_stem_for(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            stem.extend(c.to_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_end_matches('-');
    if stem.is_empty() {
        "meme".to_string()
    } else {
        stem.to_string()
    }
}

fn build_output_path(stem: &str, output_dir: &Path, format: ExportFormat) -> PathBuf {
    let base = output_dir.join(format!("{}.{}", stem, format.extension()));
    if !base.exists() {
        return base;
    }
    for n in 2..10000 {
        let candidate = output_dir.join(format!("{}-{}.{}", stem, n, format.extension()));
        if !candidate.exists() {
            return candidate;
        }
    }
    output_dir.join(format!("{}-final.{}", stem, format.extension()))
}

fn write_image(
    image: DynamicImage,
    output_path: &Path,
    options: ExportOptions,
) -> anyhow::Result<()> {
    let file = std::fs::File::create(output_path)?;
    let writer = std::io::BufWriter::new(file);
    match options.format {
        ExportFormat::Jpg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(writer, options.jpg_quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)?;
        }
        ExportFormat::Png => {
            let compression = PngCompressionType::Level(options.png_compression.min(9));
            let encoder =
                PngEncoder::new_with_quality(writer, compression, PngFilterType::Adaptive);
            image.write_with_encoder(encoder)?;
        }
        ExportFormat::Webp => {
            let encoder = WebPEncoder::new_lossless(writer);
            image.write_with_encoder(encoder)?;
        }
    }
    Ok(())
}

pub fn default_export_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Memes")
}

pub fn expand_home_prefix(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
