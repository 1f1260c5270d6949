//! Watch history tracking for ani-gui.
//!
//! This module provides functionality for saving and loading watch history,
//! allowing users to resume a show from the sidebar. Records keep the search
//! query and result index so ani-cli can be pointed at the same show again.

use crate::error::Result;
use crate::types::{Episode, Mode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A record of watching progress for a single show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRecord {
    /// Unique identifier for the show.
    pub show_id: String,
    /// Display name of the show.
    pub show_name: String,
    /// Search query the show was found with.
    pub query: String,
    /// 1-based position of the show in that query's results.
    pub index: usize,
    /// Last launched episode number.
    pub episode: String,
    /// Translation mode used (sub/dub).
    pub mode: Mode,
    /// Unix timestamp of when this was last launched.
    pub timestamp: u64,
}

impl WatchRecord {
    /// Position of the episode to resume with: the one after the recorded
    /// episode, else the recorded one, else the first.
    pub fn resume_position(&self, episodes: &[Episode]) -> usize {
        let current = episodes.iter().position(|e| e.number == self.episode);
        match current {
            Some(i) if i + 1 < episodes.len() => i + 1,
            Some(i) => i,
            None => 0,
        }
    }
}

/// Watch history containing all watch records.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WatchHistory {
    /// Map of show_id to watch record.
    pub records: HashMap<String, WatchRecord>,
}

/// Details of a launch to record.
#[derive(Debug, Clone, Copy)]
pub struct Launched<'a> {
    pub show_id: &'a str,
    pub show_name: &'a str,
    pub query: &'a str,
    pub index: usize,
    pub episode: &'a str,
    pub mode: Mode,
}

impl WatchHistory {
    /// Create a new empty watch history.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Get the path to the history file.
    ///
    /// Returns ~/.local/share/ani-gui/history.json on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_history_path() -> std::result::Result<PathBuf, io::Error> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not find data directory"))?
            .join("ani-gui");

        Ok(data_dir.join("history.json"))
    }

    /// Load watch history from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_history_path()?)
    }

    /// Load watch history from `path`.
    ///
    /// Returns an empty history if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let history: WatchHistory = serde_json::from_str(&content)?;
        Ok(history)
    }

    /// Save watch history to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_history_path()?)
    }

    /// Save watch history to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Update or add a watch record.
    pub fn update(&mut self, launched: Launched<'_>) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let record = WatchRecord {
            show_id: launched.show_id.to_string(),
            show_name: launched.show_name.to_string(),
            query: launched.query.to_string(),
            index: launched.index,
            episode: launched.episode.to_string(),
            mode: launched.mode,
            timestamp,
        };

        self.records.insert(launched.show_id.to_string(), record);
    }

    /// Get the most recently watched shows, newest first.
    pub fn get_recent(&self, limit: usize) -> Vec<&WatchRecord> {
        let mut records: Vec<&WatchRecord> = self.records.values().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        records
    }

    /// Get the watch record for a specific show.
    pub fn get_record(&self, show_id: &str) -> Option<&WatchRecord> {
        self.records.get(show_id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn launched<'a>(show_id: &'a str, episode: &'a str) -> Launched<'a> {
        Launched {
            show_id,
            show_name: "Test Show",
            query: "test",
            index: 2,
            episode,
            mode: Mode::Sub,
        }
    }

    fn record(show_id: &str, timestamp: u64) -> WatchRecord {
        WatchRecord {
            show_id: show_id.to_string(),
            show_name: format!("Show {}", show_id),
            query: "q".to_string(),
            index: 1,
            episode: "1".to_string(),
            mode: Mode::Sub,
            timestamp,
        }
    }

    fn episodes(numbers: &[&str]) -> Vec<Episode> {
        numbers
            .iter()
            .map(|n| Episode {
                id: format!("s-{}", n),
                number: n.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_new_history_is_empty() {
        assert!(WatchHistory::new().is_empty());
    }

    #[test]
    fn test_update_overwrites_existing() {
        let mut history = WatchHistory::new();
        history.update(launched("show1", "5"));
        history.update(launched("show1", "10"));

        assert_eq!(history.records.len(), 1);
        let record = history.get_record("show1").unwrap();
        assert_eq!(record.episode, "10");
        assert_eq!(record.index, 2);
        assert_eq!(record.query, "test");
    }

    #[test]
    fn test_get_recent_returns_sorted() {
        let mut history = WatchHistory::new();
        for (id, ts) in [("show1", 1000), ("show2", 2000), ("show3", 3000)] {
            history.records.insert(id.to_string(), record(id, ts));
        }

        let recent = history.get_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].show_id, "show3");
        assert_eq!(recent[1].show_id, "show2");
    }

    #[test]
    fn test_save_and_load_from_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("history.json");

        let mut history = WatchHistory::new();
        history.update(Launched {
            mode: Mode::Dub,
            ..launched("show1", "12.5")
        });
        history.save_to(&path).unwrap();

        let loaded = WatchHistory::load_from(&path).unwrap();
        let record = loaded.get_record("show1").unwrap();
        assert_eq!(record.episode, "12.5");
        assert_eq!(record.mode, Mode::Dub);
    }

    #[test]
    fn test_load_from_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let loaded = WatchHistory::load_from(&tmp.path().join("none.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_resume_position_next_episode() {
        let mut rec = record("s", 0);
        rec.episode = "2".to_string();
        assert_eq!(rec.resume_position(&episodes(&["1", "2", "3"])), 2);
    }

    #[test]
    fn test_resume_position_last_episode_stays() {
        let mut rec = record("s", 0);
        rec.episode = "3".to_string();
        assert_eq!(rec.resume_position(&episodes(&["1", "2", "3"])), 2);
    }

    #[test]
    fn test_resume_position_unknown_episode_starts_at_first() {
        let mut rec = record("s", 0);
        rec.episode = "99".to_string();
        assert_eq!(rec.resume_position(&episodes(&["1", "2"])), 0);
    }
}
