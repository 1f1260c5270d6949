//! A terminal front-end for ani-cli.
//!
//! ani-gui searches the AllAnime catalogue, looks up a description and
//! thumbnail for every result, caches them in a flat-file cache folder and
//! shows the results as a grid of cards. Playback and downloads are handed
//! to ani-cli with the selection passed as arguments, so no CLI typing is
//! needed.
//!
//! # Features
//!
//! - Search for anime by name and browse results in a grid
//! - Descriptions and thumbnails, fetched once and cached on disk
//! - Play, download or download a range of episodes through ani-cli
//! - Sub/dub, quality and player switchable in-session
//! - Continue recently launched shows from the history sidebar
//!
//! # Usage
//!
//! ```bash
//! # Run with default settings (sub mode)
//! cargo run
//!
//! # Run in dub mode at 720p
//! cargo run -- -m dub -q 720p
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod launcher;
pub mod metadata;
pub mod tui;
pub mod types;
