//! Type definitions for the ani-gui application.
//!
//! This module contains the core data structures used throughout the application
//! for representing shows, episodes, cached details and ani-cli settings.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Description shown when no synopsis could be found or loaded.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Translation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Sub,
    Dub,
}

impl Mode {
    /// The value used by the AllAnime API and stored in history.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sub => "sub",
            Mode::Dub => "dub",
        }
    }

    /// Switch between sub and dub.
    pub fn toggle(self) -> Self {
        match self {
            Mode::Sub => Mode::Dub,
            Mode::Dub => Mode::Sub,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sub" => Ok(Mode::Sub),
            "dub" => Ok(Mode::Dub),
            other => Err(AppError::InvalidInput(format!(
                "Invalid mode '{}'. Use 'sub' or 'dub'.",
                other
            ))),
        }
    }
}

/// Video quality passed to `ani-cli -q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "worst")]
    Worst,
}

impl Quality {
    /// All qualities in menu order.
    pub const ALL: [Quality; 6] = [
        Quality::Best,
        Quality::P1080,
        Quality::P720,
        Quality::P480,
        Quality::P360,
        Quality::Worst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::Worst => "worst",
        }
    }

    /// Next quality in menu order, wrapping around.
    pub fn cycle(self) -> Self {
        let pos = Self::ALL.iter().position(|q| *q == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = AppError;

    /// Accepts the menu names as well as bare resolutions ("720").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.trim_end_matches('p');
        match normalized {
            "best" => Ok(Quality::Best),
            "1080" => Ok(Quality::P1080),
            "720" => Ok(Quality::P720),
            "480" => Ok(Quality::P480),
            "360" => Ok(Quality::P360),
            "worst" => Ok(Quality::Worst),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid quality '{}'. Use best, 1080p, 720p, 480p, 360p or worst.",
                s.trim()
            ))),
        }
    }
}

/// Raw show data as returned from the AllAnime API.
///
/// This struct is used for deserialization and then converted to [`Show`]
/// with the appropriate episode count for the selected mode (sub/dub).
#[derive(Debug, Deserialize)]
pub struct RawShow {
    /// Unique identifier for the show.
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name of the show.
    pub name: String,

    /// Map of translation type to episode count (e.g., "sub" -> 24, "dub" -> 12).
    #[serde(rename = "availableEpisodes", default)]
    pub available_episodes: HashMap<String, i64>,
}

/// A search result with episode count for a specific translation mode.
#[derive(Clone, Debug, PartialEq)]
pub struct Show {
    /// Unique identifier for the show.
    pub id: String,

    /// Display name of the show.
    pub name: String,

    /// 1-based position in the search results. ani-cli selects by it (`-S`).
    pub index: usize,

    /// Number of available episodes for the selected translation mode.
    pub available_episodes: i64,
}

impl Show {
    /// Format the show for display on grid cards.
    ///
    /// # Examples
    ///
    /// ```
    /// use ani_gui::types::Show;
    ///
    /// let show = Show {
    ///     id: "abc123".to_string(),
    ///     name: "My Anime".to_string(),
    ///     index: 1,
    ///     available_episodes: 24,
    /// };
    /// assert_eq!(show.to_display(), "My Anime (24 eps)");
    /// ```
    pub fn to_display(&self) -> String {
        format!("{} ({} eps)", self.name, self.available_episodes)
    }
}

/// An episode of a show.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode {
    /// Unique identifier for the episode.
    pub id: String,

    /// Episode number as listed by the API ("1", "12.5").
    pub number: String,
}

impl Episode {
    /// Numeric value used for ordering. Unparseable numbers sort last.
    pub fn sort_key(&self) -> f64 {
        self.number.trim().parse::<f64>().unwrap_or(f64::INFINITY)
    }

    /// Format the episode for display in the episode list.
    ///
    /// ```
    /// use ani_gui::types::Episode;
    ///
    /// let ep = Episode { id: "x-1".to_string(), number: "1".to_string() };
    /// assert_eq!(ep.to_display(), "Episode 1");
    /// ```
    pub fn to_display(&self) -> String {
        format!("Episode {}", self.number)
    }
}

/// Sort episodes numerically in place.
pub fn sort_episodes(episodes: &mut [Episode]) {
    episodes.sort_by(|a, b| {
        a.sort_key()
            .partial_cmp(&b.sort_key())
            .unwrap_or(Ordering::Equal)
    });
}

/// Synopsis and thumbnail for a show, from the cache folder or the web.
#[derive(Clone, Debug, PartialEq)]
pub struct ShowDetails {
    pub synopsis: String,
    /// Path of the cached thumbnail image; `None` renders the placeholder.
    pub thumbnail: Option<PathBuf>,
}

impl ShowDetails {
    /// Details used when nothing could be fetched.
    pub fn fallback() -> Self {
        Self {
            synopsis: NO_DESCRIPTION.to_string(),
            thumbnail: None,
        }
    }

    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail.is_some()
    }
}

impl Default for ShowDetails {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(n: &str) -> Episode {
        Episode {
            id: format!("show-{}", n),
            number: n.to_string(),
        }
    }

    #[test]
    fn test_show_to_display_zero_episodes() {
        let show = Show {
            id: "xyz".to_string(),
            name: "New Show".to_string(),
            index: 3,
            available_episodes: 0,
        };
        assert_eq!(show.to_display(), "New Show (0 eps)");
    }

    #[test]
    fn test_sort_episodes_numeric_not_lexical() {
        let mut episodes = vec![ep("10"), ep("2"), ep("1"), ep("12.5"), ep("12")];
        sort_episodes(&mut episodes);
        let order: Vec<&str> = episodes.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "10", "12", "12.5"]);
    }

    #[test]
    fn test_sort_episodes_unparseable_last() {
        let mut episodes = vec![ep("special"), ep("3"), ep("1")];
        sort_episodes(&mut episodes);
        assert_eq!(episodes.last().unwrap().number, "special");
    }

    #[test]
    fn test_mode_parse_and_toggle() {
        assert_eq!("DUB".parse::<Mode>().unwrap(), Mode::Dub);
        assert!("raw".parse::<Mode>().is_err());
        assert_eq!(Mode::Sub.toggle(), Mode::Dub);
        assert_eq!(Mode::Dub.toggle().as_str(), "sub");
    }

    #[test]
    fn test_quality_parse_accepts_bare_resolution() {
        assert_eq!("720".parse::<Quality>().unwrap(), Quality::P720);
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::P1080);
        assert_eq!("Best".parse::<Quality>().unwrap(), Quality::Best);
        assert!("4k".parse::<Quality>().is_err());
    }

    #[test]
    fn test_quality_cycle_wraps() {
        assert_eq!(Quality::Best.cycle(), Quality::P1080);
        assert_eq!(Quality::Worst.cycle(), Quality::Best);
    }

    #[test]
    fn test_quality_serde_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            quality: Quality,
        }
        let s = toml::to_string(&Wrapper {
            quality: Quality::P480,
        })
        .unwrap();
        assert!(s.contains("quality = \"480p\""));
        let back: Wrapper = toml::from_str("quality = \"worst\"").unwrap();
        assert_eq!(back.quality, Quality::Worst);
    }

    #[test]
    fn test_details_fallback() {
        let details = ShowDetails::default();
        assert_eq!(details.synopsis, NO_DESCRIPTION);
        assert!(!details.has_thumbnail());
    }
}
