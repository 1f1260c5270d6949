//! Main entry point for the ani-gui application.

use ani_gui::api::{fetch_episodes, search_shows};
use ani_gui::cache::ThumbnailCache;
use ani_gui::config::Config;
use ani_gui::error::AppError;
use ani_gui::history::{Launched, WatchHistory, WatchRecord};
use ani_gui::launcher::{AniCli, LaunchAction};
use ani_gui::metadata::MetadataClient;
use ani_gui::tui::{draw, poll_event, Action, App, Screen, Thumbnails};
use ani_gui::types::{Mode, Quality, Show};
use clap::Parser;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info, warn};
use ratatui::prelude::*;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Number of history records shown in the sidebar.
const RECENT_LIMIT: usize = 10;

/// How often input is checked while details load.
const LOADING_TICK: Duration = Duration::from_millis(50);

/// Command-line arguments for the ani-gui application.
#[derive(Parser, Debug)]
#[command(
    name = "ani-gui",
    version,
    about = "A terminal front-end for ani-cli",
    long_about = "Search anime, browse results with their descriptions and thumbnails, \
                  and hand playback and downloads to ani-cli."
)]
struct Args {
    /// Translation mode: "sub" for subtitled, "dub" for dubbed
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Quality passed to ani-cli: best, 1080p, 720p, 480p, 360p or worst
    #[arg(short, long)]
    quality: Option<Quality>,

    /// Player ani-cli should use (overrides config)
    #[arg(short, long)]
    player: Option<String>,

    /// ani-cli executable name or path
    #[arg(long)]
    ani_cli: Option<String>,

    /// Folder for cached thumbnails and descriptions
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Directory ani-cli downloads into
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1)]
    log: u8,

    /// Log file used while the interface is open (default: <cache dir>/ani-gui.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Delete cached thumbnails and descriptions, then exit
    #[arg(long)]
    clear_cache: bool,

    /// Write a default config file if none exists, then exit
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn is_maintenance(&self) -> bool {
        self.clear_cache || self.init_config
    }
}

/// Initialize logging. Interactive sessions log to `log_file` so the
/// terminal UI isn't overwritten.
fn init_logging(level: u8, log_file: Option<PathBuf>) {
    let log_level = match level {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false);

    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
    debug!("Log level set to {:?}", log_level);
}

/// Initialize the terminal for TUI rendering.
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn recent_records(history: &WatchHistory) -> Vec<WatchRecord> {
    history
        .get_recent(RECENT_LIMIT)
        .into_iter()
        .cloned()
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config is read before logging exists; report problems afterwards.
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::new(), Some(e)),
    };

    let cache_dir = args
        .cache_dir
        .clone()
        .or_else(|| config.cache_dir.clone())
        .unwrap_or_else(ThumbnailCache::default_dir);
    let cache = ThumbnailCache::open(&cache_dir)?;

    let log_file = if args.is_maintenance() {
        None
    } else {
        Some(
            args.log_file
                .clone()
                .unwrap_or_else(|| cache.dir().join("ani-gui.log")),
        )
    };
    init_logging(args.log, log_file);

    if let Some(e) = config_error {
        warn!("Failed to load config: {}. Using defaults.", e);
    }

    if args.init_config {
        let path = Config::create_default_if_missing()?;
        println!("Config file: {}", path.display());
        return Ok(());
    }

    if args.clear_cache {
        let removed = cache.clear()?;
        println!(
            "Removed {} cached file(s) from {}",
            removed,
            cache.dir().display()
        );
        return Ok(());
    }

    // Merge config with CLI args
    let mode = args.mode.unwrap_or(config.mode);
    let quality = args.quality.unwrap_or(config.quality);
    let player = args.player.clone().unwrap_or_else(|| config.player.clone());
    let ani_cli_name = args.ani_cli.clone().unwrap_or_else(|| config.ani_cli.clone());
    let download_dir = args.download_dir.clone().or_else(|| config.download_dir.clone());

    let mut anicli = AniCli::new(&ani_cli_name, player.clone()).with_download_dir(download_dir);
    let ani_cli_found = anicli.is_available();
    if ani_cli_found {
        info!("Using ani-cli at {}", anicli.program().display());
    } else {
        warn!("{} not found in PATH", ani_cli_name);
    }

    info!(
        "Cache folder {} ({} shows cached)",
        cache.dir().display(),
        cache.entries().unwrap_or(0)
    );
    let metadata = Arc::new(MetadataClient::new(
        cache,
        Duration::from_millis(config.metadata_delay_ms),
    )?);

    let mut watch_history = WatchHistory::load().unwrap_or_else(|e| {
        warn!("Failed to load watch history: {}", e);
        WatchHistory::new()
    });

    let mut app = App::new(mode, quality, player, config.keybindings.clone());
    app.set_history(recent_records(&watch_history));
    if !ani_cli_found {
        app.set_status(&format!(
            "Error: {} not found. Browsing works, but playback needs ani-cli installed.",
            ani_cli_name
        ));
    }

    let mut terminal = init_terminal()?;
    app.thumbnails = Thumbnails::detect();

    let result = run_app(
        &mut terminal,
        &mut app,
        &mut watch_history,
        &mut anicli,
        &metadata,
    )
    .await;

    restore_terminal()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watch_history: &mut WatchHistory,
    anicli: &mut AniCli,
    metadata: &Arc<MetadataClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for finished in anicli.reap() {
            info!("{}", finished.to_display());
            app.set_status(&finished.to_display());
        }

        terminal.draw(|f| draw(f, app))?;

        let Some(Event::Key(key)) = poll_event(Duration::from_millis(100))? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_input(key) {
            Action::Quit => break,
            Action::None => {}
            Action::Search(query) => {
                run_search(terminal, app, metadata, &query).await?;
            }
            Action::SelectShow(i) => {
                if let Some(show) = app.shows.get(i).cloned() {
                    app.set_loading(&format!("Loading episodes for {}...", show.name));
                    terminal.draw(|f| draw(f, app))?;

                    match fetch_episodes(&show.id, app.results_mode).await {
                        Ok(episodes) => {
                            let status = if episodes.is_empty() {
                                format!(
                                    "No {} episodes available for '{}'.",
                                    app.results_mode, show.name
                                )
                            } else {
                                format!("Select an episode for '{}'.", show.name)
                            };
                            app.set_episodes(show, episodes);
                            app.set_status(&status);
                        }
                        Err(e) => {
                            app.screen = Screen::ShowGrid;
                            app.set_status(&format!("Could not fetch episodes: {}", e));
                        }
                    }
                }
            }
            Action::Play(i) | Action::Download(i) if i >= app.episodes.len() => {}
            Action::Play(i) => {
                let episode = app.episodes[i].number.clone();
                launch(app, anicli, watch_history, episode.clone(), &episode, LaunchAction::Play);
            }
            Action::Download(i) => {
                let episode = app.episodes[i].number.clone();
                launch(app, anicli, watch_history, episode.clone(), &episode, LaunchAction::Download);
            }
            Action::DownloadRange(start, end) => {
                let episodes = format!("{}-{}", start, end);
                launch(app, anicli, watch_history, episodes, &end, LaunchAction::Download);
            }
            Action::ContinueFromHistory(i) => {
                if let Some(record) = app.history_records.get(i).cloned() {
                    continue_from_history(terminal, app, metadata, record).await?;
                }
            }
            Action::OpenThumbnail => {
                match app.current_details().and_then(|d| d.thumbnail.clone()) {
                    Some(path) => match open::that_detached(&path) {
                        Ok(()) => app.set_status(&format!("Opened {}", path.display())),
                        Err(e) => app.set_status(&format!("Could not open thumbnail: {}", e)),
                    },
                    None => app.set_status("No thumbnail cached for this show."),
                }
            }
            Action::PlayerChanged(player) => {
                anicli.set_player(&player);
                info!("Player set to '{}'", anicli.player());
            }
        }

        if app.should_quit {
            break;
        }
    }

    if anicli.running() > 0 {
        info!("Leaving {} ani-cli process(es) running", anicli.running());
    }

    Ok(())
}

/// Search the catalogue, then look up details for every result.
async fn run_search(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    metadata: &Arc<MetadataClient>,
    query: &str,
) -> io::Result<()> {
    app.begin_search(query);
    app.set_loading(&format!("Searching for '{}'...", query));
    terminal.draw(|f| draw(f, app))?;

    let shows = match search_shows(query, app.mode).await {
        Ok(shows) => shows,
        Err(e) => {
            warn!("Search for '{}' failed: {}", query, e);
            app.screen = Screen::Startup;
            app.set_status(&format!("Search failed: {}", e));
            return Ok(());
        }
    };

    if shows.is_empty() {
        app.screen = Screen::Startup;
        app.set_status(&format!("No results found for '{}'.", query));
        return Ok(());
    }

    app.set_loading(&format!("Found {} results. Loading details...", shows.len()));
    terminal.draw(|f| draw(f, app))?;

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let client = Arc::clone(metadata);
    let lookup_shows = shows.clone();
    let mut lookups = tokio::spawn(async move {
        client
            .fetch_all(&lookup_shows, |done, total| {
                let _ = progress_tx.send((done, total));
            })
            .await
    });

    let details = loop {
        tokio::select! {
            joined = &mut lookups => match joined {
                Ok(details) => break details,
                Err(e) => {
                    warn!("Detail lookups stopped: {}", e);
                    break HashMap::new();
                }
            },
            Some((done, total)) = progress_rx.recv() => {
                app.set_loading(&format!("Loading details ({}/{})...", done, total));
                terminal.draw(|f| draw(f, app))?;
            }
            _ = tokio::time::sleep(LOADING_TICK) => {
                if quit_requested(app)? {
                    lookups.abort();
                    info!("Quit while loading details for '{}'", query);
                    app.should_quit = true;
                    return Ok(());
                }
            }
        }
    };

    app.set_shows(shows, details);
    app.set_status("Details loaded. Please select an anime.");
    Ok(())
}

/// Drain pending input without blocking, reporting whether a quit key
/// was pressed.
fn quit_requested(app: &App) -> io::Result<bool> {
    while let Some(event) = poll_event(Duration::ZERO)? {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press && app.is_quit_key(&key) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Hand a request to ani-cli and record it in the watch history.
fn launch(
    app: &mut App,
    anicli: &mut AniCli,
    watch_history: &mut WatchHistory,
    episodes: String,
    last_episode: &str,
    action: LaunchAction,
) {
    let request = match app.launch_request(episodes, action) {
        Ok(request) => request,
        Err(e) => {
            let message = match e {
                AppError::InvalidInput(message) => message,
                other => other.to_string(),
            };
            app.set_status(&format!("Error: {}", message));
            return;
        }
    };

    if let Err(e) = anicli.launch(&request) {
        let message = match e {
            AppError::Launch(message) => message,
            other => other.to_string(),
        };
        warn!("ani-cli launch failed: {}", message);
        app.set_status(&format!("Failed to execute command: {}", message));
        return;
    }

    app.set_status(&request.describe());

    if let Some(show) = &app.selected_show {
        watch_history.update(Launched {
            show_id: &show.id,
            show_name: &show.name,
            query: &request.query,
            index: request.index,
            episode: last_episode,
            mode: request.mode,
        });
        if let Err(e) = watch_history.save() {
            warn!("Failed to save watch history: {}", e);
        }
    }
    app.set_history(recent_records(watch_history));
}

/// Reopen a show from the sidebar with the next episode preselected.
async fn continue_from_history(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    metadata: &Arc<MetadataClient>,
    record: WatchRecord,
) -> io::Result<()> {
    // The stored index refers to results in the recorded mode.
    app.mode = record.mode;
    app.begin_search(&record.query);
    app.set_loading(&format!("Loading {}...", record.show_name));
    terminal.draw(|f| draw(f, app))?;

    let episodes = match fetch_episodes(&record.show_id, record.mode).await {
        Ok(episodes) if !episodes.is_empty() => episodes,
        Ok(_) => {
            app.screen = Screen::Startup;
            app.set_status(&format!("No episodes available for '{}'.", record.show_name));
            return Ok(());
        }
        Err(e) => {
            app.screen = Screen::Startup;
            app.set_status(&format!("Could not load '{}'.", record.show_name));
            app.set_error(&e.to_string());
            return Ok(());
        }
    };

    let details = metadata.fetch_details(&record.show_name).await;
    app.set_details(&record.show_id, details);

    let resume = record.resume_position(&episodes);
    let show = Show {
        id: record.show_id.clone(),
        name: record.show_name.clone(),
        index: record.index,
        available_episodes: episodes.len() as i64,
    };
    app.set_episodes(show, episodes);
    app.episode_list_state.select(Some(resume));
    app.set_status(&format!(
        "Continue '{}' from Episode {}.",
        record.show_name, app.episodes[resume].number
    ));
    Ok(())
}
