//! Configuration file support for ani-gui.
//!
//! This module provides functionality for loading and saving user preferences
//! from a TOML configuration file, including key bindings.

use crate::error::Result;
use crate::metadata::DEFAULT_DELAY_MS;
use crate::types::{Mode, Quality};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// User configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Translation mode: "sub" or "dub"
    #[serde(default)]
    pub mode: Mode,

    /// Quality passed to ani-cli: best, 1080p, 720p, 480p, 360p or worst
    #[serde(default)]
    pub quality: Quality,

    /// Player ani-cli should use (exported as ANI_CLI_PLAYER)
    #[serde(default = "default_player")]
    pub player: String,

    /// ani-cli executable name or path
    #[serde(default = "default_ani_cli")]
    pub ani_cli: String,

    /// Cache folder for thumbnails and descriptions
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Download directory for ani-cli (exported as ANI_CLI_DOWNLOAD_DIR)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Minimum delay between metadata requests in milliseconds
    #[serde(default = "default_metadata_delay_ms")]
    pub metadata_delay_ms: u64,

    /// Key bindings
    #[serde(default)]
    pub keybindings: Keybindings,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_player() -> String {
    "mpv".to_string()
}

fn default_ani_cli() -> String {
    "ani-cli".to_string()
}

fn default_metadata_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            mode: Mode::default(),
            quality: Quality::default(),
            player: default_player(),
            ani_cli: default_ani_cli(),
            cache_dir: None,
            download_dir: None,
            metadata_delay_ms: default_metadata_delay_ms(),
            keybindings: Keybindings::default(),
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/ani-gui/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> std::result::Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("ani-gui");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to `path`, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Create a default config file if one doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn create_default_if_missing() -> Result<PathBuf> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            Self::new().save_to(&path)?;
        }

        Ok(path)
    }
}

/// Configurable key bindings. Each action accepts several keys.
///
/// Keys are written as a single character (`"q"`, `"D"`), a name
/// (`"enter"`, `"esc"`, `"tab"`, `"backspace"`, `"space"`, arrows as
/// `"up"`/`"down"`/`"left"`/`"right"`), optionally prefixed with `ctrl+`
/// or `alt+`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybindings {
    pub quit: Vec<String>,
    pub help: Vec<String>,
    pub search: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub select: Vec<String>,
    pub back: Vec<String>,
    pub toggle_focus: Vec<String>,
    pub filter: Vec<String>,
    pub play: Vec<String>,
    pub download: Vec<String>,
    pub download_range: Vec<String>,
    pub toggle_mode: Vec<String>,
    pub cycle_quality: Vec<String>,
    pub edit_player: Vec<String>,
    pub thumbnail: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            quit: keys(&["q"]),
            help: keys(&["?"]),
            search: keys(&["/"]),
            up: keys(&["k", "up"]),
            down: keys(&["j", "down"]),
            left: keys(&["h", "left"]),
            right: keys(&["l", "right"]),
            select: keys(&["enter"]),
            back: keys(&["backspace", "esc"]),
            toggle_focus: keys(&["tab"]),
            filter: keys(&["f"]),
            play: keys(&["p"]),
            download: keys(&["d"]),
            download_range: keys(&["D"]),
            toggle_mode: keys(&["m"]),
            cycle_quality: keys(&["c"]),
            edit_player: keys(&["P"]),
            thumbnail: keys(&["i"]),
        }
    }
}

impl Keybindings {
    /// Whether `key` matches any of the bindings.
    pub fn matches(&self, binding: &[String], key: &KeyEvent) -> bool {
        binding.iter().any(|spec| key_matches(spec, key))
    }

    /// Display label for the first key of a binding, for help texts.
    pub fn label(&self, binding: &[String]) -> String {
        binding.first().cloned().unwrap_or_default()
    }
}

/// Parse a key spec into a code and the modifiers it requires.
pub fn parse_key(spec: &str) -> Option<(KeyCode, KeyModifiers)> {
    let mut modifiers = KeyModifiers::NONE;
    let mut rest = spec.trim();

    loop {
        let lower = rest.to_lowercase();
        if lower.starts_with("ctrl+") && rest.len() > 5 {
            modifiers |= KeyModifiers::CONTROL;
            rest = &rest[5..];
        } else if lower.starts_with("alt+") && rest.len() > 4 {
            modifiers |= KeyModifiers::ALT;
            rest = &rest[4..];
        } else {
            break;
        }
    }

    let code = match rest.to_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };

    Some((code, modifiers))
}

fn key_matches(spec: &str, key: &KeyEvent) -> bool {
    let Some((code, modifiers)) = parse_key(spec) else {
        return false;
    };
    // Shift is carried by the character itself.
    let relevant = key.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT);
    code == key.code && relevant == modifiers
}
