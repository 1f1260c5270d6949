//! Application state management and input handling.

use crate::config::Keybindings;
use crate::error::{AppError, Result};
use crate::history::WatchRecord;
use crate::launcher::{LaunchAction, LaunchRequest};
use crate::types::{Episode, Mode, Quality, Show, ShowDetails};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;
use ratatui::widgets::ListState;
use std::collections::HashMap;

use super::grid::{self, Move, GRID_COLUMNS};
use super::thumbnail::Thumbnails;
use super::types::{Action, Focus, Screen};

/// Status bar text shown on startup.
pub const READY_STATUS: &str = "Ready. Enter an anime to search.";

/// Error shown when playback is requested without a selection.
pub const NOTHING_SELECTED: &str = "Anime and episode must be selected.";

/// Application state for the TUI.
pub struct App {
    /// Current screen being displayed
    pub screen: Screen,
    /// Current focus (sidebar or main)
    pub focus: Focus,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Current search query being typed
    pub search_input: String,
    /// Whether search bar is focused
    pub search_focused: bool,
    /// Query the current results belong to; ani-cli re-runs it
    pub last_query: String,
    /// Search results (shows)
    pub shows: Vec<Show>,
    /// Synopsis and thumbnail per show id
    pub details: HashMap<String, ShowDetails>,
    /// Highlighted card in the results grid
    pub grid_selected: usize,
    /// First visible grid row
    pub grid_scroll: usize,
    /// Show whose episodes are listed
    pub selected_show: Option<Show>,
    /// Episodes for the selected show
    pub episodes: Vec<Episode>,
    /// List state for episodes
    pub episode_list_state: ListState,
    /// Episode filter input
    pub episode_filter: String,
    /// Whether episode filter is active
    pub episode_filter_active: bool,
    /// Watch history records for sidebar
    pub history_records: Vec<WatchRecord>,
    /// History list state (for sidebar)
    pub history_list_state: ListState,
    /// Loading message
    pub loading_message: String,
    /// Status bar message
    pub status_message: String,
    /// Error message to display
    pub error_message: Option<String>,
    /// Current mode (sub/dub)
    pub mode: Mode,
    /// Mode the current results were fetched in; their indices belong to it
    pub results_mode: Mode,
    /// Quality passed to ani-cli
    pub quality: Quality,
    /// Player passed to ani-cli
    pub player: String,
    /// Whether the player popup is open
    pub player_input_mode: bool,
    /// Player popup input
    pub player_input: String,
    /// Whether we're in range input mode
    pub range_input_mode: bool,
    /// Range input for downloads
    pub range_input: String,
    /// Whether help modal is shown
    pub show_help: bool,
    /// Custom keybindings
    pub keybindings: Keybindings,
    /// Decoded thumbnails of the current results
    pub thumbnails: Thumbnails,
}

impl App {
    /// Create a new App with default state.
    pub fn new(mode: Mode, quality: Quality, player: String, keybindings: Keybindings) -> Self {
        Self {
            screen: Screen::Startup,
            focus: Focus::Main,
            should_quit: false,
            search_input: String::new(),
            search_focused: false,
            last_query: String::new(),
            shows: Vec::new(),
            details: HashMap::new(),
            grid_selected: 0,
            grid_scroll: 0,
            selected_show: None,
            episodes: Vec::new(),
            episode_list_state: ListState::default(),
            episode_filter: String::new(),
            episode_filter_active: false,
            history_records: Vec::new(),
            history_list_state: ListState::default(),
            loading_message: String::new(),
            status_message: READY_STATUS.to_string(),
            error_message: None,
            mode,
            results_mode: mode,
            quality,
            player,
            player_input_mode: false,
            player_input: String::new(),
            range_input_mode: false,
            range_input: String::new(),
            show_help: false,
            keybindings,
            thumbnails: Thumbnails::halfblocks(),
        }
    }

    /// Set the app to loading state with a message.
    pub fn set_loading(&mut self, message: &str) {
        self.screen = Screen::Loading;
        self.loading_message = message.to_string();
        self.status_message = message.to_string();
    }

    /// Set the status bar message.
    pub fn set_status(&mut self, message: &str) {
        self.status_message = message.to_string();
    }

    /// Set an error message.
    pub fn set_error(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
    }

    /// Clear error message.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Forget the previous search before running `query`.
    pub fn begin_search(&mut self, query: &str) {
        self.last_query = query.to_string();
        self.results_mode = self.mode;
        self.shows.clear();
        self.details.clear();
        self.thumbnails.clear();
        self.grid_selected = 0;
        self.grid_scroll = 0;
        self.selected_show = None;
        self.episodes.clear();
        self.episode_filter.clear();
        self.episode_list_state.select(None);
    }

    /// Set shows with their details and switch to the grid.
    pub fn set_shows(&mut self, shows: Vec<Show>, details: HashMap<String, ShowDetails>) {
        self.shows = shows;
        self.thumbnails.load_all(&details);
        self.details = details;
        self.grid_selected = 0;
        self.grid_scroll = 0;
        self.screen = Screen::ShowGrid;
    }

    /// Record details of a single show, decoding its thumbnail.
    pub fn set_details(&mut self, show_id: &str, details: ShowDetails) {
        if let Some(path) = &details.thumbnail {
            if let Err(e) = self.thumbnails.load(show_id, path) {
                warn!("{}", e);
            }
        }
        self.details.insert(show_id.to_string(), details);
    }

    /// Set episodes of `show` and switch to the episode list.
    pub fn set_episodes(&mut self, show: Show, episodes: Vec<Episode>) {
        self.selected_show = Some(show);
        self.episodes = episodes;
        self.episode_filter.clear();
        self.episode_filter_active = false;
        self.episode_list_state
            .select(if self.episodes.is_empty() { None } else { Some(0) });
        self.screen = Screen::EpisodeList;
    }

    /// Set history records for the sidebar.
    pub fn set_history(&mut self, records: Vec<WatchRecord>) {
        let has_records = !records.is_empty();
        self.history_records = records;
        if has_records && self.history_list_state.selected().is_none() {
            self.history_list_state.select(Some(0));
        }
    }

    /// Show highlighted on the current screen.
    pub fn highlighted_show(&self) -> Option<&Show> {
        match self.screen {
            Screen::ShowGrid => self.shows.get(self.grid_selected),
            _ => self.selected_show.as_ref(),
        }
    }

    /// Details of the highlighted show, if loaded.
    pub fn current_details(&self) -> Option<&ShowDetails> {
        self.highlighted_show()
            .and_then(|show| self.details.get(&show.id))
    }

    /// Get filtered episodes based on current filter.
    pub fn get_filtered_episodes(&self) -> Vec<&Episode> {
        if self.episode_filter.is_empty() {
            self.episodes.iter().collect()
        } else {
            self.episodes
                .iter()
                .filter(|e| e.number.contains(self.episode_filter.trim()))
                .collect()
        }
    }

    /// Index into `episodes` of the highlighted (possibly filtered) entry.
    pub fn selected_episode_index(&self) -> Option<usize> {
        let i = self.episode_list_state.selected()?;
        let filtered = self.get_filtered_episodes();
        let episode = filtered.get(i)?;
        self.episodes.iter().position(|e| e.id == episode.id)
    }

    /// Build the ani-cli request for the selected show.
    pub fn launch_request(&self, episodes: String, action: LaunchAction) -> Result<LaunchRequest> {
        let show = match &self.selected_show {
            Some(show) if !self.last_query.is_empty() && !episodes.is_empty() => show,
            _ => return Err(AppError::InvalidInput(NOTHING_SELECTED.to_string())),
        };

        Ok(LaunchRequest {
            query: self.last_query.clone(),
            index: show.index,
            episodes,
            quality: self.quality,
            mode: self.results_mode,
            action,
            title: show.name.clone(),
        })
    }

    /// Ctrl+C or Ctrl+Q, which quit even while typing.
    fn is_force_quit(key: &KeyEvent) -> bool {
        key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    }

    /// Whether `key` quits while a lookup is in flight and no input is
    /// being typed.
    pub fn is_quit_key(&self, key: &KeyEvent) -> bool {
        Self::is_force_quit(key) || self.keybindings.matches(&self.keybindings.quit, key)
    }

    /// Handle keyboard input and return an action.
    pub fn handle_input(&mut self, key: KeyEvent) -> Action {
        if Self::is_force_quit(&key) {
            self.should_quit = true;
            return Action::Quit;
        }

        // Any key dismisses the error popup
        if self.error_message.is_some() {
            self.clear_error();
            return Action::None;
        }

        // Handle help modal
        if self.show_help {
            if key.code == KeyCode::Esc
                || self.keybindings.matches(&self.keybindings.help, &key)
                || self.keybindings.matches(&self.keybindings.quit, &key)
            {
                self.show_help = false;
            }
            return Action::None;
        }

        // Text inputs take every key
        if self.player_input_mode {
            return self.handle_player_input(key);
        }
        if self.range_input_mode {
            return self.handle_range_input(key);
        }
        if self.search_focused || self.screen == Screen::Search {
            return self.handle_search_bar_input(key);
        }
        if self.episode_filter_active {
            return self.handle_episode_filter_input(key);
        }

        if self.keybindings.matches(&self.keybindings.help, &key) {
            self.show_help = true;
            return Action::None;
        }

        if self
            .keybindings
            .matches(&self.keybindings.toggle_focus, &key)
        {
            self.focus = match self.focus {
                Focus::Sidebar => Focus::Main,
                Focus::Main => Focus::Sidebar,
            };
            if self.focus == Focus::Sidebar
                && self.history_list_state.selected().is_none()
                && !self.history_records.is_empty()
            {
                self.history_list_state.select(Some(0));
            }
            return Action::None;
        }

        // Focus search bar from anywhere
        if self.keybindings.matches(&self.keybindings.search, &key) {
            self.search_focused = true;
            return Action::None;
        }

        if let Some(action) = self.handle_settings_input(&key) {
            return action;
        }

        if self.focus == Focus::Sidebar {
            return self.handle_sidebar_input(key);
        }

        match self.screen {
            Screen::Startup => self.handle_startup_input(key),
            Screen::ShowGrid => self.handle_grid_input(key),
            Screen::EpisodeList => self.handle_episode_list_input(key),
            Screen::Search => Action::None,
            Screen::Loading => {
                if self.keybindings.matches(&self.keybindings.quit, &key) {
                    self.should_quit = true;
                    return Action::Quit;
                }
                Action::None
            }
        }
    }

    fn handle_settings_input(&mut self, key: &KeyEvent) -> Option<Action> {
        if self.keybindings.matches(&self.keybindings.toggle_mode, key) {
            self.mode = self.mode.toggle();
            self.set_status(&format!(
                "Mode set to {}. It applies from the next search.",
                self.mode
            ));
            Some(Action::None)
        } else if self.keybindings.matches(&self.keybindings.cycle_quality, key) {
            self.quality = self.quality.cycle();
            self.set_status(&format!("Quality set to {}.", self.quality));
            Some(Action::None)
        } else if self.keybindings.matches(&self.keybindings.edit_player, key) {
            self.player_input = self.player.clone();
            self.player_input_mode = true;
            Some(Action::None)
        } else {
            None
        }
    }

    fn handle_search_bar_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => {
                let query = self.search_input.trim().to_string();
                if query.is_empty() {
                    self.set_status("Error: Search query cannot be empty.");
                    return Action::None;
                }
                self.search_input.clear();
                self.search_focused = false;
                self.focus = Focus::Main;
                Action::Search(query)
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                Action::None
            }
            KeyCode::Esc => {
                self.search_input.clear();
                self.search_focused = false;
                if self.screen == Screen::Search {
                    self.screen = if self.shows.is_empty() {
                        Screen::Startup
                    } else {
                        Screen::ShowGrid
                    };
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_sidebar_input(&mut self, key: KeyEvent) -> Action {
        if self.keybindings.matches(&self.keybindings.up, &key) {
            let i = self.history_list_state.selected().unwrap_or(0);
            if i > 0 {
                self.history_list_state.select(Some(i - 1));
            }
            Action::None
        } else if self.keybindings.matches(&self.keybindings.down, &key) {
            let i = self.history_list_state.selected().unwrap_or(0);
            if i < self.history_records.len().saturating_sub(1) {
                self.history_list_state.select(Some(i + 1));
            }
            Action::None
        } else if self.keybindings.matches(&self.keybindings.select, &key) {
            match self.history_list_state.selected() {
                Some(i) if i < self.history_records.len() => {
                    self.focus = Focus::Main;
                    Action::ContinueFromHistory(i)
                }
                _ => Action::None,
            }
        } else if self.keybindings.matches(&self.keybindings.quit, &key) {
            self.should_quit = true;
            Action::Quit
        } else {
            Action::None
        }
    }

    fn handle_startup_input(&mut self, key: KeyEvent) -> Action {
        if self.history_records.is_empty() {
            if self.keybindings.matches(&self.keybindings.select, &key) {
                self.screen = Screen::Search;
                return Action::None;
            }
        } else if self.keybindings.matches(&self.keybindings.up, &key)
            || self.keybindings.matches(&self.keybindings.down, &key)
            || self.keybindings.matches(&self.keybindings.select, &key)
        {
            return self.handle_sidebar_input(key);
        }

        if self.keybindings.matches(&self.keybindings.quit, &key) {
            self.should_quit = true;
            Action::Quit
        } else {
            Action::None
        }
    }

    fn grid_move(&mut self, direction: Move) {
        self.grid_selected = grid::step(self.grid_selected, self.shows.len(), GRID_COLUMNS, direction);
    }

    fn handle_grid_input(&mut self, key: KeyEvent) -> Action {
        let kb = &self.keybindings;
        if kb.matches(&kb.up, &key) {
            self.grid_move(Move::Up);
            Action::None
        } else if kb.matches(&kb.down, &key) {
            self.grid_move(Move::Down);
            Action::None
        } else if kb.matches(&kb.left, &key) {
            self.grid_move(Move::Left);
            Action::None
        } else if kb.matches(&kb.right, &key) {
            self.grid_move(Move::Right);
            Action::None
        } else if kb.matches(&kb.select, &key) {
            if self.grid_selected < self.shows.len() {
                Action::SelectShow(self.grid_selected)
            } else {
                Action::None
            }
        } else if kb.matches(&kb.thumbnail, &key) {
            Action::OpenThumbnail
        } else if kb.matches(&kb.quit, &key) {
            self.should_quit = true;
            Action::Quit
        } else {
            Action::None
        }
    }

    fn handle_episode_list_input(&mut self, key: KeyEvent) -> Action {
        let filtered_len = self.get_filtered_episodes().len();
        let kb = &self.keybindings;

        if kb.matches(&kb.up, &key) {
            let i = self.episode_list_state.selected().unwrap_or(0);
            if i > 0 {
                self.episode_list_state.select(Some(i - 1));
            }
            Action::None
        } else if kb.matches(&kb.down, &key) {
            let i = self.episode_list_state.selected().unwrap_or(0);
            if i < filtered_len.saturating_sub(1) {
                self.episode_list_state.select(Some(i + 1));
            }
            Action::None
        } else if kb.matches(&kb.select, &key) || kb.matches(&kb.play, &key) {
            self.episode_action(Action::Play)
        } else if kb.matches(&kb.download, &key) {
            self.episode_action(Action::Download)
        } else if kb.matches(&kb.download_range, &key) {
            if self.episodes.is_empty() {
                self.set_status(&format!("Error: {}", NOTHING_SELECTED));
            } else {
                self.range_input.clear();
                self.range_input_mode = true;
            }
            Action::None
        } else if kb.matches(&kb.filter, &key) {
            self.episode_filter_active = true;
            Action::None
        } else if kb.matches(&kb.thumbnail, &key) {
            Action::OpenThumbnail
        } else if kb.matches(&kb.back, &key) {
            if !self.episode_filter.is_empty() {
                self.episode_filter.clear();
                self.episode_list_state.select(Some(0));
            } else if self.shows.is_empty() {
                self.screen = Screen::Startup;
            } else {
                self.screen = Screen::ShowGrid;
            }
            Action::None
        } else if kb.matches(&kb.quit, &key) {
            self.should_quit = true;
            Action::Quit
        } else {
            Action::None
        }
    }

    fn episode_action(&mut self, action: fn(usize) -> Action) -> Action {
        match self.selected_episode_index() {
            Some(i) => action(i),
            None => {
                self.set_status(&format!("Error: {}", NOTHING_SELECTED));
                Action::None
            }
        }
    }

    fn handle_episode_filter_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.episode_filter_active = false;
                if !self.get_filtered_episodes().is_empty() {
                    self.episode_list_state.select(Some(0));
                }
                Action::None
            }
            KeyCode::Char(c) => {
                self.episode_filter.push(c);
                self.episode_list_state.select(Some(0));
                Action::None
            }
            KeyCode::Backspace => {
                self.episode_filter.pop();
                self.episode_list_state.select(Some(0));
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_range_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => match parse_episode_range(&self.range_input, &self.episodes) {
                Ok((start, end)) => {
                    self.range_input_mode = false;
                    self.range_input.clear();
                    Action::DownloadRange(start, end)
                }
                Err(message) => {
                    self.set_error(&message);
                    Action::None
                }
            },
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' || c == '.' => {
                self.range_input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.range_input.pop();
                Action::None
            }
            KeyCode::Esc => {
                self.range_input_mode = false;
                self.range_input.clear();
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_player_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => {
                self.player_input_mode = false;
                self.player = self.player_input.trim().to_string();
                self.player_input.clear();
                if self.player.is_empty() {
                    self.set_status("Player cleared. ani-cli will use its default.");
                } else {
                    self.set_status(&format!("Player set to {}.", self.player));
                }
                Action::PlayerChanged(self.player.clone())
            }
            KeyCode::Char(c) => {
                self.player_input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.player_input.pop();
                Action::None
            }
            KeyCode::Esc => {
                self.player_input_mode = false;
                self.player_input.clear();
                Action::None
            }
            _ => Action::None,
        }
    }
}

/// Validate a `start-end` range against the available episodes.
///
/// Returns the trimmed bounds as typed, ready for `ani-cli -e start-end`.
pub fn parse_episode_range(
    input: &str,
    episodes: &[Episode],
) -> std::result::Result<(String, String), String> {
    const FORMAT_ERROR: &str = "Invalid range format. Use: start-end (e.g., 1-12)";

    let (start_str, end_str) = input.split_once('-').ok_or(FORMAT_ERROR)?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());
    let (Ok(start), Ok(end)) = (start_str.parse::<f64>(), end_str.parse::<f64>()) else {
        return Err(FORMAT_ERROR.to_string());
    };

    if start > end {
        return Err("Invalid range: start must be <= end".to_string());
    }

    let numbers: Vec<f64> = episodes
        .iter()
        .map(|e| e.sort_key())
        .filter(|n| n.is_finite())
        .collect();
    let min_episode = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max_episode = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if numbers.is_empty() {
        return Err("No episodes available".to_string());
    }
    if start < min_episode {
        return Err(format!("Invalid range: episodes start at {}", min_episode));
    }
    if end > max_episode {
        return Err(format!(
            "Invalid range: episodes only go up to {}",
            max_episode
        ));
    }

    Ok((start_str.to_string(), end_str.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(Mode::Sub, Quality::Best, "mpv".to_string(), Keybindings::default())
    }

    fn show(i: usize) -> Show {
        Show {
            id: format!("id{}", i),
            name: format!("Show {}", i),
            index: i + 1,
            available_episodes: 12,
        }
    }

    fn episodes(numbers: &[&str]) -> Vec<Episode> {
        numbers
            .iter()
            .map(|n| Episode {
                id: format!("id0-{}", n),
                number: n.to_string(),
            })
            .collect()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_input(key(KeyCode::Char(c)));
        }
    }

    fn app_with_episodes() -> App {
        let mut app = app();
        app.begin_search("show");
        app.set_shows((0..5).map(show).collect(), HashMap::new());
        app.set_episodes(show(0), episodes(&["1", "2", "3", "10", "11"]));
        app
    }

    #[test]
    fn test_new_app_status_ready() {
        let app = app();
        assert_eq!(app.screen, Screen::Startup);
        assert_eq!(app.status_message, READY_STATUS);
    }

    #[test]
    fn test_search_bar_enter_returns_query() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('/')));
        assert!(app.search_focused);
        type_text(&mut app, "solo leveling");
        assert_eq!(
            app.handle_input(key(KeyCode::Enter)),
            Action::Search("solo leveling".to_string())
        );
        assert!(!app.search_focused);
        assert!(app.search_input.is_empty());
    }

    #[test]
    fn test_empty_search_reports_error() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('/')));
        type_text(&mut app, "   ");
        assert_eq!(app.handle_input(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.status_message, "Error: Search query cannot be empty.");
    }

    #[test]
    fn test_begin_search_clears_previous_results() {
        let mut app = app_with_episodes();
        app.details.insert("id0".to_string(), ShowDetails::fallback());
        app.begin_search("other");
        assert_eq!(app.last_query, "other");
        assert!(app.shows.is_empty());
        assert!(app.details.is_empty());
        assert!(app.episodes.is_empty());
        assert!(app.selected_show.is_none());
    }

    #[test]
    fn test_grid_navigation_and_select() {
        let mut app = app();
        app.set_shows((0..7).map(show).collect(), HashMap::new());
        app.handle_input(key(KeyCode::Right));
        app.handle_input(key(KeyCode::Down));
        assert_eq!(app.grid_selected, 4);
        assert_eq!(app.handle_input(key(KeyCode::Enter)), Action::SelectShow(4));
        assert_eq!(app.highlighted_show().unwrap().id, "id4");
    }

    #[test]
    fn test_current_details_follow_highlight() {
        let mut app = app();
        let mut details = HashMap::new();
        details.insert(
            "id1".to_string(),
            ShowDetails {
                synopsis: "Second".to_string(),
                thumbnail: None,
            },
        );
        app.set_shows((0..3).map(show).collect(), details);
        assert!(app.current_details().is_none());
        app.handle_input(key(KeyCode::Char('l')));
        assert_eq!(app.current_details().unwrap().synopsis, "Second");
    }

    #[test]
    fn test_play_selected_episode() {
        let mut app = app_with_episodes();
        app.handle_input(key(KeyCode::Down));
        assert_eq!(app.handle_input(key(KeyCode::Enter)), Action::Play(1));
        assert_eq!(app.handle_input(key(KeyCode::Char('d'))), Action::Download(1));
    }

    #[test]
    fn test_filter_maps_back_to_original_index() {
        let mut app = app_with_episodes();
        app.handle_input(key(KeyCode::Char('f')));
        type_text(&mut app, "1");
        app.handle_input(key(KeyCode::Enter));
        // Filtered: 1, 10, 11
        assert_eq!(app.get_filtered_episodes().len(), 3);
        app.handle_input(key(KeyCode::Down));
        assert_eq!(app.handle_input(key(KeyCode::Char('p'))), Action::Play(3));
    }

    #[test]
    fn test_play_without_episodes_reports_error() {
        let mut app = app();
        app.set_episodes(show(0), Vec::new());
        assert_eq!(app.handle_input(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.status_message, format!("Error: {}", NOTHING_SELECTED));
    }

    #[test]
    fn test_launch_request_uses_query_index_and_settings() {
        let mut app = app();
        app.mode = Mode::Dub;
        app.begin_search("show");
        app.set_episodes(show(0), episodes(&["1", "2", "3"]));
        // Toggling after the search does not change the results' mode.
        app.mode = Mode::Sub;
        app.quality = Quality::P480;
        let req = app
            .launch_request("3".to_string(), LaunchAction::Download)
            .unwrap();
        assert_eq!(req.query, "show");
        assert_eq!(req.index, 1);
        assert_eq!(req.mode, Mode::Dub);
        assert_eq!(req.quality, Quality::P480);
        assert_eq!(req.title, "Show 0");
    }

    #[test]
    fn test_launch_request_requires_selection() {
        let app = app();
        let err = app
            .launch_request("1".to_string(), LaunchAction::Play)
            .unwrap_err();
        assert!(err.to_string().contains(NOTHING_SELECTED));
    }

    #[test]
    fn test_range_input_flow() {
        let mut app = app_with_episodes();
        app.handle_input(KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT));
        assert!(app.range_input_mode);
        type_text(&mut app, "2-10");
        assert_eq!(
            app.handle_input(key(KeyCode::Enter)),
            Action::DownloadRange("2".to_string(), "10".to_string())
        );
        assert!(!app.range_input_mode);
    }

    #[test]
    fn test_range_input_rejects_out_of_bounds() {
        let mut app = app_with_episodes();
        app.handle_input(KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT));
        type_text(&mut app, "5-40");
        assert_eq!(app.handle_input(key(KeyCode::Enter)), Action::None);
        assert!(app.range_input_mode);
        assert!(app.error_message.unwrap().contains("only go up to 11"));
    }

    #[test]
    fn test_parse_episode_range_errors() {
        let eps = episodes(&["1", "2", "3"]);
        assert!(parse_episode_range("3", &eps).is_err());
        assert!(parse_episode_range("3-1", &eps).unwrap_err().contains("start must be"));
        assert!(parse_episode_range("0-2", &eps).unwrap_err().contains("start at 1"));
        assert_eq!(
            parse_episode_range(" 1 - 3 ", &eps).unwrap(),
            ("1".to_string(), "3".to_string())
        );
    }

    #[test]
    fn test_settings_keys() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('m')));
        assert_eq!(app.mode, Mode::Dub);
        app.handle_input(key(KeyCode::Char('c')));
        assert_eq!(app.quality, Quality::P1080);
        assert_eq!(app.status_message, "Quality set to 1080p.");
    }

    #[test]
    fn test_player_popup() {
        let mut app = app();
        app.handle_input(KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT));
        assert!(app.player_input_mode);
        assert_eq!(app.player_input, "mpv");
        for _ in 0..3 {
            app.handle_input(key(KeyCode::Backspace));
        }
        type_text(&mut app, "vlc");
        assert_eq!(
            app.handle_input(key(KeyCode::Enter)),
            Action::PlayerChanged("vlc".to_string())
        );
        assert_eq!(app.player, "vlc");
    }

    #[test]
    fn test_back_from_episodes_returns_to_grid() {
        let mut app = app_with_episodes();
        app.handle_input(key(KeyCode::Backspace));
        assert_eq!(app.screen, Screen::ShowGrid);
    }

    #[test]
    fn test_help_modal_swallows_keys() {
        let mut app = app_with_episodes();
        app.handle_input(key(KeyCode::Char('?')));
        assert!(app.show_help);
        assert_eq!(app.handle_input(key(KeyCode::Enter)), Action::None);
        app.handle_input(key(KeyCode::Esc));
        assert!(!app.show_help);
    }

    #[test]
    fn test_quit_keys_while_loading() {
        let mut app = app();
        app.begin_search("frieren");
        app.set_loading("Loading details (1/9)...");
        assert!(app.is_quit_key(&key(KeyCode::Char('q'))));
        assert!(app.is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.is_quit_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(!app.is_quit_key(&key(KeyCode::Char('c'))));
        assert!(!app.is_quit_key(&key(KeyCode::Enter)));
    }

    #[test]
    fn test_quit_key_follows_keybindings() {
        let mut keybindings = Keybindings::default();
        keybindings.quit = vec!["x".to_string()];
        let app = App::new(Mode::Sub, Quality::Best, String::new(), keybindings);
        assert!(app.is_quit_key(&key(KeyCode::Char('x'))));
        assert!(!app.is_quit_key(&key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_set_details_keeps_entry_without_thumbnail() {
        let mut app = app();
        app.set_details("id0", ShowDetails::fallback());
        assert!(app.details.contains_key("id0"));
        assert!(!app.thumbnails.contains("id0"));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        let action = app.handle_input(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(action, Action::Quit);
        assert!(app.should_quit);
    }
}
