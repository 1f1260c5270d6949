//! Terminal User Interface for ani-gui using ratatui.
//!
//! This module provides a full-screen TUI with a grid of search results,
//! a description panel, an episode list and a history sidebar. Cards
//! draw their cached thumbnails inline.

mod grid;
mod render;
mod state;
mod thumbnail;
mod types;

pub use grid::{row_count, step, Move, GRID_COLUMNS};
pub use render::draw;
pub use state::{parse_episode_range, App, NOTHING_SELECTED, READY_STATUS};
pub use thumbnail::Thumbnails;
pub use types::{Action, Focus, Screen};

use crossterm::event::{self, Event};
use std::io;
use std::time::Duration;

/// Poll for keyboard events with a timeout.
pub fn poll_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
