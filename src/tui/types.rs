//! TUI type definitions for screens, focus, and actions.

/// The current screen/view of the application.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Startup screen - continue from history or start a search
    Startup,
    /// Search input screen
    Search,
    /// Browsing the search results grid
    ShowGrid,
    /// Browsing episodes of the selected show
    EpisodeList,
    /// Loading/waiting for API response
    Loading,
}

/// Focus state for split-panel views.
#[derive(Debug, Clone, PartialEq)]
pub enum Focus {
    Sidebar,
    Main,
}

/// Actions that can be returned from the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action, continue running
    None,
    /// Quit the application
    Quit,
    /// Perform a search with the given query
    Search(String),
    /// Open a show from the grid by index
    SelectShow(usize),
    /// Play an episode by index
    Play(usize),
    /// Download an episode by index
    Download(usize),
    /// Download an inclusive episode range
    DownloadRange(String, String),
    /// Continue from history
    ContinueFromHistory(usize),
    /// Open the highlighted show's thumbnail in the system image viewer
    OpenThumbnail,
    /// Player changed in the settings popup
    PlayerChanged(String),
}
