//! UI rendering functions for the TUI.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use ratatui_image::StatefulImage;

use super::grid::{self, GRID_COLUMNS};
use super::state::App;
use super::types::{Focus, Screen};
use crate::types::{Mode, NO_DESCRIPTION};

/// Height of one card in the results grid, borders included.
const CARD_HEIGHT: u16 = 10;

/// Fill of the thumbnail area when a show has no image.
const PLACEHOLDER_BG: Color = Color::Rgb(50, 50, 50);

/// Draw the UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search bar
            Constraint::Min(0),    // Content (sidebar + main)
            Constraint::Length(4), // Status + key hints
        ])
        .split(size);

    draw_header(frame, app, chunks[0]);
    draw_search_bar(frame, app, chunks[1]);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30), // Sidebar (fixed width)
            Constraint::Min(0),     // Main content
        ])
        .split(chunks[2]);

    draw_sidebar(frame, app, content_chunks[0]);

    match app.screen {
        Screen::Loading => draw_loading(frame, app, content_chunks[1]),
        Screen::Search => draw_search_help(frame, content_chunks[1]),
        Screen::Startup => draw_startup_main(frame, app, content_chunks[1]),
        Screen::ShowGrid => draw_show_grid_main(frame, app, content_chunks[1]),
        Screen::EpisodeList => draw_episode_list_main(frame, app, content_chunks[1]),
    }

    draw_footer(frame, app, chunks[3]);

    if let Some(error) = &app.error_message {
        draw_error_popup(frame, error);
    }

    if app.range_input_mode {
        draw_input_popup(
            frame,
            "Download Range",
            "Enter range (e.g., 1-12): ",
            &app.range_input,
        );
    }

    if app.player_input_mode {
        draw_input_popup(frame, "Player", "Player for ani-cli: ", &app.player_input);
    }

    if app.show_help {
        draw_help_modal(frame, app);
    }
}

fn highlight_style() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let mode_style = match app.mode {
        Mode::Dub => Style::default().fg(Color::Yellow),
        Mode::Sub => Style::default().fg(Color::Cyan),
    };

    let player = if app.player.is_empty() {
        "ani-cli default"
    } else {
        app.player.as_str()
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "ani-gui",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("[{}]", app.mode), mode_style),
        Span::raw("  "),
        Span::styled(
            format!("[{}]", app.quality),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("player: {}", player),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let typing = app.search_focused || app.screen == Screen::Search;

    let search_text = if app.search_input.is_empty() && !typing {
        if app.last_query.is_empty() {
            "Press '/' to search..."
        } else {
            app.last_query.as_str()
        }
    } else {
        app.search_input.as_str()
    };

    let search = Paragraph::new(search_text)
        .style(if typing {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search")
                .border_style(focus_style(typing)),
        );

    frame.render_widget(search, area);

    if typing {
        let width = app.search_input.chars().count() as u16;
        frame.set_cursor_position((area.x + width + 1, area.y + 1));
    }
}

fn draw_sidebar(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Recent")
        .border_style(focus_style(app.focus == Focus::Sidebar));

    if app.history_records.is_empty() {
        let empty = Paragraph::new("No watch history")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .history_records
        .iter()
        .map(|record| {
            ListItem::new(format!(
                "{} [{}]",
                truncate(&record.show_name, 18),
                record.episode
            ))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.history_list_state);
}

/// Shorten `text` to at most `max` chars, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max.saturating_sub(3)).collect::<String>())
    } else {
        text.to_string()
    }
}

fn draw_search_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new("Type your search query and press Enter\n\nPress Esc to cancel")
        .block(Block::default().borders(Borders::ALL).title("Search"))
        .wrap(Wrap { trim: true });

    frame.render_widget(help, area);
}

fn draw_startup_main(frame: &mut Frame, app: &App, area: Rect) {
    let kb = &app.keybindings;
    let welcome = Paragraph::new(format!(
        "Welcome to ani-gui!\n\n\
        - Press '{}' to search for anime\n\
        - Results are shown as cards with their description\n\
        - Select from Recent history on the left\n\n\
        Keyboard shortcuts:\n\
        - arrows or h/j/k/l: Navigate\n\
        - {}: Play / {}: Download / {}: Download range\n\
        - {}: Toggle sub/dub, {}: Cycle quality, {}: Player\n\
        - {}: Help, {}: Quit",
        kb.label(&kb.search),
        kb.label(&kb.play),
        kb.label(&kb.download),
        kb.label(&kb.download_range),
        kb.label(&kb.toggle_mode),
        kb.label(&kb.cycle_quality),
        kb.label(&kb.edit_player),
        kb.label(&kb.help),
        kb.label(&kb.quit),
    ))
    .block(Block::default().borders(Borders::ALL).title("Welcome"))
    .wrap(Wrap { trim: true });

    frame.render_widget(welcome, area);
}

fn draw_show_grid_main(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Results for '{}' ({})", app.last_query, app.shows.len()));
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let (selected_row, _) = grid::position(app.grid_selected, GRID_COLUMNS);
    app.grid_scroll = grid::scroll_to_fit(selected_row, app.grid_scroll, visible_rows);

    let total_rows = grid::row_count(app.shows.len(), GRID_COLUMNS);
    let last_row = total_rows.min(app.grid_scroll + visible_rows);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(inner);

    for (slot, row) in (app.grid_scroll..last_row).enumerate() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); GRID_COLUMNS])
            .split(row_areas[slot]);

        for (col, cell) in columns.iter().enumerate() {
            let index = row * GRID_COLUMNS + col;
            if index < app.shows.len() {
                draw_card(frame, app, index, *cell);
            }
        }
    }

    draw_description(frame, app, chunks[1]);
}

fn draw_card(frame: &mut Frame, app: &mut App, index: usize, area: Rect) {
    let show = app.shows[index].clone();
    let selected = index == app.grid_selected;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("#{}", show.index))
        .border_style(focus_style(selected && app.focus == Focus::Main));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(0),    // Thumbnail
            Constraint::Length(1), // Episode count
        ])
        .split(inner);

    let title_style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let title = Paragraph::new(Span::styled(
        truncate(&show.name, inner.width as usize),
        title_style,
    ));
    frame.render_widget(title, rows[0]);

    match app.thumbnails.get_mut(&show.id) {
        Some(thumbnail) => {
            frame.render_stateful_widget(StatefulImage::default(), rows[1], thumbnail)
        }
        None => draw_thumbnail_placeholder(frame, rows[1]),
    }

    let episodes = Paragraph::new(Span::styled(
        format!("{} eps", show.available_episodes),
        Style::default().fg(Color::Yellow),
    ));
    frame.render_widget(episodes, rows[2]);
}

fn draw_thumbnail_placeholder(frame: &mut Frame, area: Rect) {
    let placeholder = Paragraph::new("no image")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray).bg(PLACEHOLDER_BG));

    frame.render_widget(placeholder, area);
}

fn draw_description(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .highlighted_show()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "Description".to_string());

    let synopsis = app
        .current_details()
        .map(|d| d.synopsis.as_str())
        .unwrap_or(NO_DESCRIPTION);

    let description = Paragraph::new(synopsis)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });

    frame.render_widget(description, area);
}

fn draw_episode_list_main(frame: &mut Frame, app: &mut App, area: Rect) {
    let show_filter = app.episode_filter_active || !app.episode_filter.is_empty();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if show_filter { 3 } else { 0 }),
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(area);

    if show_filter {
        let filter_style = if app.episode_filter_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let filter_title = if app.episode_filter.is_empty() {
            "Filter (type to search)".to_string()
        } else {
            format!("Filter ({} matches)", app.get_filtered_episodes().len())
        };

        let filter_input = Paragraph::new(app.episode_filter.as_str())
            .style(filter_style)
            .block(Block::default().borders(Borders::ALL).title(filter_title));

        frame.render_widget(filter_input, chunks[0]);

        if app.episode_filter_active {
            frame.set_cursor_position((
                chunks[0].x + app.episode_filter.chars().count() as u16 + 1,
                chunks[0].y + 1,
            ));
        }
    }

    let items: Vec<ListItem> = app
        .get_filtered_episodes()
        .iter()
        .map(|e| ListItem::new(e.to_display()))
        .collect();

    let title = match &app.selected_show {
        Some(show) if !app.episode_filter.is_empty() => format!("{} (filtered)", show.name),
        Some(show) => show.to_display(),
        None => "Episodes".to_string(),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focus_style(app.focus == Focus::Main)),
        )
        .highlight_style(highlight_style())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[1], &mut app.episode_list_state);

    draw_description(frame, app, chunks[2]);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let kb = &app.keybindings;
    let hints = if app.search_focused || app.screen == Screen::Search {
        "[Enter] search  [Esc] cancel".to_string()
    } else {
        match app.screen {
            Screen::ShowGrid => format!(
                "[arrows] move  [Enter] episodes  [{}] thumbnail  [{}] sub/dub  [{}] quality  [{}] help  [{}] quit",
                kb.label(&kb.thumbnail),
                kb.label(&kb.toggle_mode),
                kb.label(&kb.cycle_quality),
                kb.label(&kb.help),
                kb.label(&kb.quit),
            ),
            Screen::EpisodeList => format!(
                "[Enter/{}] play  [{}] download  [{}] range  [{}] filter  [Bksp] back  [{}] help",
                kb.label(&kb.play),
                kb.label(&kb.download),
                kb.label(&kb.download_range),
                kb.label(&kb.filter),
                kb.label(&kb.help),
            ),
            Screen::Loading => format!("[{}] help  [{}] quit", kb.label(&kb.help), kb.label(&kb.quit)),
            _ => format!(
                "[{}] search  [Tab] switch  [Enter] select  [{}] help  [{}] quit",
                kb.label(&kb.search),
                kb.label(&kb.help),
                kb.label(&kb.quit),
            ),
        }
    };

    let status_style = if app.status_message.starts_with("Error")
        || app.status_message.starts_with("Failed")
    {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };

    let footer = Paragraph::new(vec![
        Line::from(Span::styled(app.status_message.as_str(), status_style)),
        Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

fn draw_loading(frame: &mut Frame, app: &App, area: Rect) {
    let loading = Paragraph::new(app.loading_message.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Loading"))
        .wrap(Wrap { trim: true });

    frame.render_widget(loading, area);
}

fn draw_error_popup(frame: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(format!("{}\n\n[Esc] close", error))
        .style(Style::default().fg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, area);
}

fn draw_input_popup(frame: &mut Frame, title: &str, prompt: &str, input: &str) {
    let area = centered_rect(50, 15, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(format!("{}{}", prompt, input))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));

    frame.render_widget(popup, area);

    let offset = (prompt.chars().count() + input.chars().count()) as u16;
    frame.set_cursor_position((area.x + 1 + offset, area.y + 1));
}

fn draw_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let (title, content) = get_help_content(app);

    let help_text = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Help - {}", title))
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help_text, area);
}

fn help_section(heading: &str, rows: &[(String, &str)]) -> String {
    let mut section = format!("{}\n{}\n", heading, "─".repeat(heading.chars().count()));
    for (keys, description) in rows {
        section.push_str(&format!("  {:<12}{}\n", keys, description));
    }
    section.push('\n');
    section
}

fn get_help_content(app: &App) -> (&'static str, String) {
    fn label(binding: &[String]) -> String {
        binding.join(" / ")
    }

    let kb = &app.keybindings;

    let global = help_section(
        "Global Commands",
        &[
            (label(&kb.help), "Show/hide this help"),
            ("Ctrl+C".to_string(), "Force quit"),
            (label(&kb.search), "Focus search bar"),
            (label(&kb.toggle_focus), "Switch panel focus"),
            (label(&kb.toggle_mode), "Toggle sub/dub"),
            (label(&kb.cycle_quality), "Cycle quality"),
            (label(&kb.edit_player), "Set player"),
            (label(&kb.quit), "Quit"),
        ],
    );

    let sidebar = help_section(
        "Sidebar (Recent)",
        &[
            (label(&kb.down), "Move down"),
            (label(&kb.up), "Move up"),
            (label(&kb.select), "Continue show from history"),
        ],
    );

    let search = help_section(
        "Search Bar",
        &[
            ("Enter".to_string(), "Execute search"),
            ("Esc".to_string(), "Cancel search"),
        ],
    );

    let grid = help_section(
        "Results Grid",
        &[
            ("arrows".to_string(), "Move between cards"),
            (label(&kb.select), "Show episodes"),
            (label(&kb.thumbnail), "Open thumbnail in image viewer"),
        ],
    );

    let episodes = help_section(
        "Episodes",
        &[
            (label(&kb.play), "Play with ani-cli"),
            (label(&kb.download), "Download with ani-cli"),
            (label(&kb.download_range), "Download a range (e.g., 1-12)"),
            (label(&kb.filter), "Filter by episode number"),
            (label(&kb.back), "Clear filter / back to results"),
        ],
    );

    let close = format!("Press {} to close", kb.label(&kb.help));

    match app.screen {
        Screen::Startup => ("Startup", format!("{}{}{}{}", global, sidebar, search, close)),
        Screen::Search => ("Search", format!("{}{}{}", global, search, close)),
        Screen::ShowGrid => ("Results", format!("{}{}{}{}", global, grid, sidebar, close)),
        Screen::EpisodeList => ("Episodes", format!("{}{}{}{}", global, episodes, sidebar, close)),
        Screen::Loading => ("Loading", format!("{}{}", global, close)),
    }
}

/// Helper function to create a centered rect.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Keybindings;
    use crate::types::{Quality, Show, ShowDetails};
    use image::{Rgb, RgbImage};
    use ratatui::{backend::TestBackend, Terminal};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn app_with_shows(count: usize) -> App {
        let mut app = App::new(Mode::Sub, Quality::Best, "mpv".to_string(), Keybindings::default());
        app.begin_search("frieren");
        let shows = (0..count)
            .map(|i| Show {
                id: format!("id{}", i),
                name: format!("Show {}", i),
                index: i + 1,
                available_episodes: 28,
            })
            .collect();
        let mut details = HashMap::new();
        details.insert(
            "id0".to_string(),
            ShowDetails {
                synopsis: "An elf mage travels.".to_string(),
                thumbnail: Some(PathBuf::from("/tmp/x.jpg")),
            },
        );
        app.set_shows(shows, details);
        app
    }

    fn render(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long show name", 10), "a very ...");
    }

    #[test]
    fn test_grid_renders_cards_and_description() {
        let mut app = app_with_shows(4);
        let screen = render(&mut app, 120, 60);
        assert!(screen.contains("Show 0"));
        assert!(screen.contains("Show 3"));
        assert!(screen.contains("An elf mage travels."));
        assert!(screen.contains("28 eps"));
    }

    #[test]
    fn test_card_without_thumbnail_shows_placeholder() {
        let mut app = app_with_shows(1);
        assert!(!app.thumbnails.contains("id0"));
        let screen = render(&mut app, 120, 40);
        assert!(screen.contains("no image"));
    }

    #[test]
    fn test_card_draws_cached_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("show.jpg");
        RgbImage::from_pixel(20, 30, Rgb([30, 90, 200]))
            .save(&path)
            .unwrap();

        let mut app = App::new(Mode::Sub, Quality::Best, String::new(), Keybindings::default());
        app.begin_search("frieren");
        let mut details = HashMap::new();
        details.insert(
            "id0".to_string(),
            ShowDetails {
                synopsis: "An elf mage travels.".to_string(),
                thumbnail: Some(path),
            },
        );
        app.set_shows(
            vec![Show {
                id: "id0".to_string(),
                name: "Frieren".to_string(),
                index: 1,
                available_episodes: 28,
            }],
            details,
        );

        assert!(app.thumbnails.contains("id0"));
        let screen = render(&mut app, 120, 40);
        assert!(screen.contains("Frieren"));
        assert!(screen.contains("28 eps"));
        assert!(!screen.contains("no image"));
    }

    #[test]
    fn test_grid_scrolls_to_selection() {
        let mut app = app_with_shows(30);
        app.grid_selected = 29;
        render(&mut app, 120, 30);
        assert!(app.grid_scroll > 0);
    }

    #[test]
    fn test_help_lists_configured_keys() {
        let app = app_with_shows(1);
        let (title, content) = get_help_content(&app);
        assert_eq!(title, "Results");
        assert!(content.contains("Open thumbnail"));
    }

    #[test]
    fn test_centered_rect_inside_parent() {
        let parent = Rect::new(0, 0, 100, 50);
        let rect = centered_rect(50, 20, parent);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 10);
        assert_eq!(rect.x, 25);
    }
}
