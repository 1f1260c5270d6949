//! Decoded thumbnails drawn inside the result cards.
//!
//! Cached images are decoded once per search and kept as ratatui-image
//! protocols, which resize and encode themselves for the card they are
//! drawn in. Terminals without a graphics protocol get unicode half
//! blocks.

use crate::error::{AppError, Result};
use crate::types::ShowDetails;
use image::ImageReader;
use log::{debug, warn};
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;
use std::collections::HashMap;
use std::path::Path;

/// Cell size in pixels assumed when the terminal can't be asked.
const FALLBACK_FONT_SIZE: (u16, u16) = (8, 16);

/// Thumbnails keyed by show id.
pub struct Thumbnails {
    picker: Picker,
    images: HashMap<String, StatefulProtocol>,
}

impl Thumbnails {
    /// Thumbnails drawn with half blocks, which work in any terminal.
    pub fn halfblocks() -> Self {
        Self::with_picker(Picker::from_fontsize(FALLBACK_FONT_SIZE))
    }

    /// Pick the best graphics protocol the terminal answers for.
    ///
    /// Call after entering raw mode and before the event loop starts
    /// reading input.
    pub fn detect() -> Self {
        match Picker::from_query_stdio() {
            Ok(picker) => Self::with_picker(picker),
            Err(e) => {
                warn!("Terminal image query failed, using half blocks: {}", e);
                Self::halfblocks()
            }
        }
    }

    fn with_picker(picker: Picker) -> Self {
        Self {
            picker,
            images: HashMap::new(),
        }
    }

    /// Decode the image at `path` as the thumbnail of show `id`.
    pub fn load(&mut self, id: &str, path: &Path) -> Result<()> {
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| {
                AppError::Cache(format!("Cannot read thumbnail {}: {}", path.display(), e))
            })?
            .decode()
            .map_err(|e| {
                AppError::Cache(format!("Cannot decode thumbnail {}: {}", path.display(), e))
            })?;

        let protocol = self.picker.new_resize_protocol(image);
        self.images.insert(id.to_string(), protocol);
        Ok(())
    }

    /// Decode every cached thumbnail in `details`. Broken files are skipped.
    pub fn load_all(&mut self, details: &HashMap<String, ShowDetails>) -> usize {
        for (id, show_details) in details {
            let Some(path) = &show_details.thumbnail else {
                continue;
            };
            if let Err(e) = self.load(id, path) {
                warn!("{}", e);
            }
        }
        debug!("Decoded {} thumbnail(s)", self.images.len());
        self.images.len()
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut StatefulProtocol> {
        self.images.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.images.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}
