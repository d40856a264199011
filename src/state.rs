use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Opaque RGB color used for box text and outlines.
pub struct MemeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl MemeColor {
    pub const WHITE: MemeColor = MemeColor::rgb(255, 255, 255);
    pub const BLACK: MemeColor = MemeColor::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb` or `#rrggbb`; the leading `#` is optional.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let mut nibbles = hex.chars().filter_map(|c| c.to_digit(16));
                let mut next = || nibbles.next().map(|n| (n * 17) as u8);
                Some(Self::rgb(next()?, next()?, next()?))
            }
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgb(self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for MemeColor {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}

impl fmt::Display for MemeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for MemeColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MemeColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MemeColor::from_hex(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {raw}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    pub const ALL: [TextAlign; 3] = [TextAlign::Left, TextAlign::Center, TextAlign::Right];

    pub fn label(self) -> &'static str {
        match self {
            TextAlign::Left => "Left",
            TextAlign::Center => "Center",
            TextAlign::Right => "Right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Secondary per-box options shown behind the settings button.
pub struct ExtendedOptions {
    /// Font size as a fraction of the preview height.
    pub font_size: f32,
    /// Outline thickness in points.
    pub outline_width: f32,
    pub all_caps: bool,
    pub align: TextAlign,
}

impl Default for ExtendedOptions {
    fn default() -> Self {
        Self {
            font_size: 0.09,
            outline_width: 2.0,
            all_caps: true,
            align: TextAlign::Center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Text and styling for one text box of the selected template.
pub struct BoxSettings {
    pub text: String,
    pub color: MemeColor,
    pub outline_color: MemeColor,
    pub extended: ExtendedOptions,
}

impl Default for BoxSettings {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: MemeColor::WHITE,
            outline_color: MemeColor::BLACK,
            extended: ExtendedOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemeSettings {
    pub settings: Vec<BoxSettings>,
}

/// Session-scoped settings shared by the panel and the preview.
///
/// Owned by the application root. Reads go through the accessors below,
/// writes go through the functions in `handlers`.
#[derive(Debug, Default)]
pub struct SettingsStore {
    meme_settings: MemeSettings,
    revision: u64,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meme_settings(&self) -> &MemeSettings {
        &self.meme_settings
    }

    pub fn len(&self) -> usize {
        self.meme_settings.settings.len()
    }

    /// Bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, index: usize) -> Option<&BoxSettings> {
        self.meme_settings.settings.get(index)
    }

    pub fn text_at(&self, index: usize) -> &str {
        self.get(index).map(|b| b.text.as_str()).unwrap_or("")
    }

    pub fn color_at(&self, index: usize) -> MemeColor {
        self.get(index).map(|b| b.color).unwrap_or(MemeColor::WHITE)
    }

    pub fn outline_color_at(&self, index: usize) -> MemeColor {
        self.get(index)
            .map(|b| b.outline_color)
            .unwrap_or(MemeColor::BLACK)
    }

    pub fn extended_at(&self, index: usize) -> ExtendedOptions {
        self.get(index)
            .map(|b| b.extended.clone())
            .unwrap_or_default()
    }

    /// Applies `f` to the box at `index`, materializing default boxes up to
    /// it when the store is shorter.
    pub(crate) fn update(&mut self, index: usize, f: impl FnOnce(&mut BoxSettings)) {
        let settings = &mut self.meme_settings.settings;
        if settings.len() <= index {
            settings.resize_with(index + 1, BoxSettings::default);
        }
        f(&mut settings[index]);
        self.revision += 1;
    }

    /// Resizes to exactly `box_count` entries. Existing entries below the
    /// new count are kept, the rest are dropped.
    pub fn fit_to(&mut self, box_count: usize) {
        let settings = &mut self.meme_settings.settings;
        if settings.len() == box_count {
            return;
        }
        debug!(from = settings.len(), to = box_count, "resizing meme settings");
        settings.resize_with(box_count, BoxSettings::default);
        self.revision += 1;
    }
}
