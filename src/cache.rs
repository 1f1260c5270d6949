//! Flat-file cache folder for thumbnails and descriptions.
//!
//! Every show gets two files named after its title: `<key>.jpg` with the
//! raw thumbnail bytes and `<key>.json` with the synopsis. The key is a
//! readable prefix of the sanitized title followed by a short md5 of the
//! full title, so titles that sanitize alike still get their own entry.
//! A show counts as cached only when both files exist.

use crate::error::{AppError, Result};
use crate::types::{ShowDetails, NO_DESCRIPTION};
use log::debug;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXT: &str = "jpg";
const META_EXT: &str = "json";
/// Byte budget for the readable part of a key. Most filesystems cap a
/// name at 255 bytes, and the hash suffix and extension need the rest.
const MAX_PREFIX_BYTES: usize = 200;
/// Hex digits of the title digest kept in the key.
const HASH_HEX_LEN: usize = 12;

/// Name of the fallback cache folder when no platform cache dir exists.
const LOCAL_CACHE_DIR: &str = "Ani-Cache";

#[derive(Debug, Serialize, Deserialize)]
struct CachedMeta {
    #[serde(default = "default_synopsis")]
    synopsis: String,
}

fn default_synopsis() -> String {
    NO_DESCRIPTION.to_string()
}

/// Image and description cache keyed by show title.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    /// Open (and create if needed) a cache folder.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Cache(format!("Cannot create cache folder {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    /// Default cache folder: `<platform cache dir>/ani-gui`, else `./Ani-Cache`.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|d| d.join("ani-gui"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CACHE_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Turn a show title into a safe file stem.
    ///
    /// ```
    /// use ani_gui::cache::ThumbnailCache;
    ///
    /// let key = ThumbnailCache::key_for("Re:Zero");
    /// assert!(key.starts_with("Re_Zero-"));
    /// assert_ne!(key, ThumbnailCache::key_for("Re/Zero"));
    /// ```
    pub fn key_for(title: &str) -> String {
        let sanitized: String = title
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        let prefix = trim_key(truncate_bytes(&sanitized, MAX_PREFIX_BYTES));
        let prefix = if prefix.is_empty() { "_" } else { prefix };
        format!("{}-{}", prefix, title_digest(title))
    }

    pub fn image_path(&self, title: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", Self::key_for(title), IMAGE_EXT))
    }

    pub fn meta_path(&self, title: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", Self::key_for(title), META_EXT))
    }

    /// Load cached details, or `None` unless both files are present.
    pub fn load(&self, title: &str) -> Result<Option<ShowDetails>> {
        let image_path = self.image_path(title);
        let meta_path = self.meta_path(title);

        if !image_path.is_file() || !meta_path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&meta_path)?;
        let meta: CachedMeta = serde_json::from_str(&content).map_err(|e| {
            AppError::Cache(format!("Corrupt cache entry {}: {}", meta_path.display(), e))
        })?;

        debug!("Cache hit for '{}'", title);
        Ok(Some(ShowDetails {
            synopsis: meta.synopsis,
            thumbnail: Some(image_path),
        }))
    }

    pub fn store_synopsis(&self, title: &str, synopsis: &str) -> Result<()> {
        let meta = CachedMeta {
            synopsis: synopsis.to_string(),
        };
        fs::write(self.meta_path(title), serde_json::to_string(&meta)?)?;
        Ok(())
    }

    /// Write thumbnail bytes and return the image path.
    pub fn store_image(&self, title: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.image_path(title);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Number of fully cached shows.
    pub fn entries(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(META_EXT)
                && path.with_extension(IMAGE_EXT).is_file()
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Delete every cached image and description. Returns the number of files removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if path.is_file() && matches!(ext, Some(IMAGE_EXT) | Some(META_EXT)) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!("Removed {} files from {}", removed, self.dir.display());
        Ok(removed)
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip surrounding whitespace and trailing dots until neither is left.
fn trim_key(s: &str) -> &str {
    s.trim()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

fn title_digest(title: &str) -> String {
    let hex: String = Md5::digest(title.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    hex[..HASH_HEX_LEN].to_string()
}
