use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
/// Template identifier. Catalogs use both string and numeric ids.
pub struct MemeId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for MemeId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => MemeId(s),
            RawId::Number(n) => MemeId(n.to_string()),
        }
    }
}

impl From<MemeId> for String {
    fn from(id: MemeId) -> Self {
        id.0
    }
}

impl MemeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A selectable base image plus the number of editable text boxes.
pub struct MemeTemplate {
    pub id: MemeId,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub box_count: usize,
}

/// Where a template image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(PathBuf),
    Remote(String),
}

impl MemeTemplate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        box_count: usize,
    ) -> Self {
        Self {
            id: MemeId::new(id),
            name: name.into(),
            url: url.into(),
            width: None,
            height: None,
            box_count,
        }
    }

    pub fn image_source(&self) -> ImageSource {
        let url = self.url.trim();
        if let Some(path) = url.strip_prefix("file://") {
            return ImageSource::Local(PathBuf::from(path));
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return ImageSource::Remote(url.to_string());
        }
        ImageSource::Local(PathBuf::from(url))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<MemeTemplate>),
    Envelope {
        #[serde(default = "default_success")]
        success: bool,
        #[serde(default)]
        data: Option<CatalogData>,
        #[serde(default)]
        error_message: Option<String>,
    },
}

#[derive(Deserialize)]
struct CatalogData {
    memes: Vec<MemeTemplate>,
}

fn default_success() -> bool {
    true
}

/// Parses catalog JSON, either a bare array or the imgflip `get_memes`
/// envelope.
pub fn parse_catalog(json: &str) -> anyhow::Result<Vec<MemeTemplate>> {
    let file: CatalogFile = serde_json::from_str(json).context("invalid catalog JSON")?;
    match file {
        CatalogFile::List(memes) => Ok(memes),
        CatalogFile::Envelope {
            success: false,
            error_message,
            ..
        } => bail!(
            "catalog reports failure: {}",
            error_message.unwrap_or_else(|| "no error message".to_string())
        ),
        CatalogFile::Envelope { data: Some(data), .. } => Ok(data.memes),
        CatalogFile::Envelope { data: None, .. } => bail!("catalog has no `data.memes` list"),
    }
}

/// Case-insensitive substring match; an empty query matches everything.
pub fn matches_query(name: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

/// Upper bound on text boxes per template. imgflip templates stay well below it.
pub const MAX_BOX_COUNT: usize = 20;

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    memes: Vec<MemeTemplate>,
    source: Option<PathBuf>,
}

impl Catalog {
    /// Builds an in-memory catalog, clamping implausible box counts.
    pub fn new(mut memes: Vec<MemeTemplate>) -> Self {
        for meme in &mut memes {
            if meme.box_count > MAX_BOX_COUNT {
                warn!(
                    id = %meme.id,
                    box_count = meme.box_count,
                    max = MAX_BOX_COUNT,
                    "clamping template box count"
                );
                meme.box_count = MAX_BOX_COUNT;
            }
        }
        Self {
            memes,
            source: None,
        }
    }

    /// Loads a catalog file. Relative image paths resolve against the
    /// catalog's directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let mut memes =
            parse_catalog(&json).with_context(|| format!("failed to parse {}", path.display()))?;
        let base = path.parent().unwrap_or(Path::new("."));
        for meme in &mut memes {
            if let ImageSource::Local(image_path) = meme.image_source() {
                if image_path.is_relative() {
                    meme.url = base.join(image_path).display().to_string();
                }
            }
        }
        info!(count = memes.len(), path = %path.display(), "loaded meme catalog");
        Ok(Self {
            source: Some(path.to_path_buf()),
            ..Self::new(memes)
        })
    }

    /// Templates whose name matches `query`, in catalog order.
    pub fn filter(&self, query: &str) -> Vec<&MemeTemplate> {
        self.memes
            .iter()
            .filter(|m| matches_query(&m.name, query))
            .collect()
    }

    pub fn find(&self, id: &MemeId) -> Option<&MemeTemplate> {
        self.memes.iter().find(|m| &m.id == id)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.memes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMGFLIP_SAMPLE: &str = r#"{
        "success": true,
        "data": {
            "memes": [
                {"id": "181913649", "name": "Drake Hotline Bling", "url": "https://i.imgflip.com/30b1gx.jpg", "width": 1200, "height": 1200, "box_count": 2, "captions": 1},
                {"id": "8072285", "name": "Doge", "url": "doge.jpg", "width": 620, "height": 620, "box_count": 5}
            ]
        }
    }"#;

    #[test]
    fn parses_imgflip_envelope() {
        let memes = parse_catalog(IMGFLIP_SAMPLE).unwrap();
        assert_eq!(memes.len(), 2);
        assert_eq!(memes[0].id, MemeId::new("181913649"));
        assert_eq!(memes[0].box_count, 2);
        assert_eq!(memes[1].width, Some(620));
    }

    #[test]
    fn parses_bare_array_with_numeric_ids() {
        let memes = parse_catalog(
            r#"[{"id": 1, "name": "Drake", "url": "drake.png", "box_count": 2},
                {"id": 2, "name": "Doge", "url": "doge.png"}]"#,
        )
        .unwrap();
        assert_eq!(memes[0].id.to_string(), "1");
        assert_eq!(memes[1].box_count, 0);
    }

    #[test]
    fn failed_envelope_is_an_error() {
        let err = parse_catalog(r#"{"success": false, "error_message": "rate limited"}"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("rate limited"));
    }

    #[test]
    fn image_source_distinguishes_remote_and_local() {
        let remote = MemeTemplate::new("1", "a", "https://example.com/a.jpg", 1);
        assert!(matches!(remote.image_source(), ImageSource::Remote(_)));
        let file = MemeTemplate::new("2", "b", "file:///tmp/b.png", 1);
        assert_eq!(
            file.image_source(),
            ImageSource::Local(PathBuf::from("/tmp/b.png"))
        );
    }

    #[test]
    fn query_matching_is_case_insensitive_substring() {
        assert!(matches_query("Drake Hotline Bling", "hotline"));
        assert!(matches_query("Doge", "DOG"));
        assert!(matches_query("Doge", "  "));
        assert!(!matches_query("Doge", "cat"));
    }

    #[test]
    fn load_resolves_relative_paths_against_catalog_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memes.json");
        std::fs::write(&path, IMGFLIP_SAMPLE).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        let memes = catalog.filter("");
        assert_eq!(catalog.len(), 2);
        assert_eq!(memes[0].url, "https://i.imgflip.com/30b1gx.jpg");
        assert_eq!(
            memes[1].image_source(),
            ImageSource::Local(dir.path().join("doge.jpg"))
        );
    }

    #[test]
    fn filter_keeps_catalog_order() {
        let catalog = Catalog::new(vec![
            MemeTemplate::new("3", "Doge", "doge.png", 1),
            MemeTemplate::new("1", "Drake", "drake.png", 2),
            MemeTemplate::new("2", "Cat", "cat.png", 2),
            MemeTemplate::new("4", "Dog Fight", "fight.png", 2),
        ]);
        let ids: Vec<_> = catalog.filter("DO").iter().map(|m| m.id.to_string()).collect();
        assert_eq!(ids, ["3", "4"]);
        assert_eq!(catalog.filter("").len(), 4);
        assert!(catalog.filter("nothing").is_empty());
    }

    #[test]
    fn find_by_id() {
        let catalog = Catalog::new(vec![
            MemeTemplate::new("1", "Drake", "drake.png", 2),
            MemeTemplate::new("2", "Drake", "drake2.png", 3),
        ]);
        assert_eq!(catalog.find(&MemeId::new("2")).map(|m| m.box_count), Some(3));
        assert!(catalog.find(&MemeId::new("99")).is_none());
        assert!(Catalog::default().find(&MemeId::new("1")).is_none());
    }

    #[test]
    fn oversized_box_counts_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memes.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "name": "Broken", "url": "b.png", "box_count": 4000000000},
                {"id": 2, "name": "Fine", "url": "f.png", "box_count": 3}]"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        let counts: Vec<_> = catalog.filter("").iter().map(|m| m.box_count).collect();
        assert_eq!(counts, [MAX_BOX_COUNT, 3]);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/memes.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read catalog"));
    }
}
