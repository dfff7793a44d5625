//! Content selection: one random image from the photo folder plus one random
//! caption. Selection is memoryless; repeats are allowed.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rand::{seq::SliceRandom, Rng};

use crate::{errors::Error, Result};

/// Extensions (lowercase, without the dot) that count as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const DEFAULT_CAPTIONS: &[&str] = &[
    "Зараз ти отримаєш те, що варто почути. Поміркуй, чому саме це з’явилось сьогодні 🌿",
    "Подумай, що саме ця картинка хоче тобі підказати сьогодні 🌬️",
    "Прийми це послання з довірою. Відчуй, де воно відгукується в тобі ✨",
];

/// One image + caption pair ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentItem {
    pub path: PathBuf,
    pub caption: String,
}

#[derive(Clone, Debug)]
pub struct ContentSelector {
    folder: PathBuf,
    captions: Vec<String>,
}

impl ContentSelector {
    /// Fails when the caption pool is empty; the image pool is checked per request.
    pub fn new(folder: impl Into<PathBuf>, captions: Vec<String>) -> Result<Self> {
        if captions.iter().all(|c| c.trim().is_empty()) {
            return Err(Error::Config("caption pool is empty".to_string()));
        }
        Ok(Self {
            folder: folder.into(),
            captions,
        })
    }

    pub fn with_default_captions(folder: impl Into<PathBuf>) -> Result<Self> {
        Self::new(
            folder,
            DEFAULT_CAPTIONS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Current image pool. A missing or unreadable folder is an empty pool.
    pub fn pool(&self) -> Vec<PathBuf> {
        scan_image_pool(&self.folder)
    }

    /// Enumerate the pool and pick one image + caption.
    pub fn select(&self) -> Result<ContentItem> {
        self.select_with(&mut rand::thread_rng())
    }

    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ContentItem> {
        let pool = self.pool();
        let path = pick_item(&pool, rng)
            .ok_or_else(|| Error::NoContentAvailable {
                folder: self.folder.clone(),
            })?
            .clone();
        let caption = pick_caption(&self.captions, rng).to_string();
        Ok(ContentItem { path, caption })
    }
}

/// Uniform choice; `None` on an empty pool.
pub fn pick_item<'a, R: Rng + ?Sized>(pool: &'a [PathBuf], rng: &mut R) -> Option<&'a PathBuf> {
    pool.choose(rng)
}

/// Uniform choice over the caption pool; an empty pool yields "".
pub fn pick_caption<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> &'a str {
    pool.choose(rng).map(String::as_str).unwrap_or("")
}

/// List image files directly inside `dir`, sorted by file name.
pub fn scan_image_pool(dir: &Path) -> Vec<PathBuf> {
    let Ok(rd) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut out: Vec<PathBuf> = rd
        .flatten()
        .filter(|ent| ent.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .map(|ent| ent.path())
        .filter(|p| has_image_extension(p))
        .collect();
    out.sort();
    out
}

pub fn has_image_extension(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}
