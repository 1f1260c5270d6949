//! Integration tests for ani-gui.
//!
//! These tests verify the integration between different modules
//! using fixtures and temporary folders instead of the network.

use ani_gui::api::{parse_episodes_response, parse_search_response};
use ani_gui::cache::ThumbnailCache;
use ani_gui::config::Config;
use ani_gui::history::{Launched, WatchHistory};
use ani_gui::launcher::{AniCli, LaunchAction, PLAYER_ENV};
use ani_gui::metadata::{parse_jikan_search, MetadataClient};
use ani_gui::tui::{parse_episode_range, step, Action, App, Move, Screen, GRID_COLUMNS};
use ani_gui::types::{Episode, Mode, Quality, Show, ShowDetails, NO_DESCRIPTION};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SEARCH_BODY: &str = r#"{
    "data": {"shows": {"edges": [
        {"_id": "f1", "name": "Frieren", "availableEpisodes": {"sub": 28, "dub": 28}},
        {"_id": "f2", "name": "Frieren: Mini", "availableEpisodes": {"sub": 10}}
    ]}}
}"#;

fn press(app: &mut App, code: KeyCode) -> Action {
    app.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Test that shows can be created and displayed correctly.
#[test]
fn test_show_display_integration() {
    let show = Show {
        id: "test-123".to_string(),
        name: "Test Anime".to_string(),
        index: 1,
        available_episodes: 24,
    };

    assert_eq!(show.to_display(), "Test Anime (24 eps)");
}

/// Test that search results keep the order ani-cli's `-S` refers to.
#[test]
fn test_search_results_feed_launch_arguments() {
    let shows = parse_search_response(SEARCH_BODY, Mode::Sub).unwrap();
    let episodes = parse_episodes_response(
        r#"{"data": {"show": {"_id": "f2", "availableEpisodesDetail": {"sub": ["2", "1", "3"]}}}}"#,
        Mode::Sub,
    )
    .unwrap();

    let mut app = App::new(Mode::Sub, Quality::P1080, String::new(), Default::default());
    app.begin_search("frieren");
    app.set_shows(shows, HashMap::new());
    assert_eq!(press(&mut app, KeyCode::Right), Action::None);
    assert_eq!(press(&mut app, KeyCode::Enter), Action::SelectShow(1));

    let show = app.shows[1].clone();
    app.set_episodes(show, episodes);
    assert_eq!(app.screen, Screen::EpisodeList);
    assert_eq!(press(&mut app, KeyCode::Down), Action::None);
    assert_eq!(press(&mut app, KeyCode::Enter), Action::Play(1));

    let request = app
        .launch_request(app.episodes[1].number.clone(), LaunchAction::Play)
        .unwrap();
    assert_eq!(
        request.args(),
        ["-q", "1080p", "-S", "2", "-e", "2", "frieren"]
    );
    assert_eq!(request.describe(), "Playing Ep 2 of 'Frieren: Mini'...");
}

/// Test dub downloads of a range.
#[test]
fn test_dub_range_download_arguments() {
    let episodes: Vec<Episode> = (1..=12)
        .map(|n| Episode {
            id: format!("x-{}", n),
            number: n.to_string(),
        })
        .collect();

    let (start, end) = parse_episode_range("3-7", &episodes).unwrap();
    let mut app = App::new(Mode::Dub, Quality::Best, String::new(), Default::default());
    app.begin_search("frieren");
    app.set_episodes(
        Show {
            id: "f1".to_string(),
            name: "Frieren".to_string(),
            index: 1,
            available_episodes: 12,
        },
        episodes,
    );

    let request = app
        .launch_request(format!("{}-{}", start, end), LaunchAction::Download)
        .unwrap();
    assert_eq!(
        request.args(),
        ["-q", "best", "--dub", "-d", "-S", "1", "-e", "3-7", "frieren"]
    );
}

/// Test that the launcher exports the player to ani-cli.
#[test]
fn test_launcher_command_environment() {
    let cli = AniCli::new("ani-cli", "vlc");
    let app = {
        let mut app = App::new(Mode::Sub, Quality::Best, "vlc".to_string(), Default::default());
        app.begin_search("q");
        app.set_episodes(
            Show {
                id: "a".to_string(),
                name: "A".to_string(),
                index: 3,
                available_episodes: 1,
            },
            vec![Episode {
                id: "a-1".to_string(),
                number: "1".to_string(),
            }],
        );
        app
    };

    let request = app.launch_request("1".to_string(), LaunchAction::Play).unwrap();
    let cmd = cli.command(&request);
    let player = cmd
        .get_envs()
        .find(|(key, _)| *key == PLAYER_ENV)
        .and_then(|(_, value)| value);
    assert_eq!(player, Some(std::ffi::OsStr::new("vlc")));
}

/// Test that cached details are served without touching the network.
#[tokio::test]
async fn test_fetch_all_uses_cache_folder() {
    let tmp = TempDir::new().unwrap();
    let cache = ThumbnailCache::open(tmp.path()).unwrap();
    cache.store_synopsis("Frieren", "After the party's journey.").unwrap();
    cache.store_image("Frieren", b"jpeg").unwrap();
    cache.store_synopsis("Frieren: Mini", "Shorts.").unwrap();
    cache.store_image("Frieren: Mini", b"jpeg").unwrap();

    let client = Arc::new(MetadataClient::new(cache, Duration::from_millis(500)).unwrap());
    let shows = parse_search_response(SEARCH_BODY, Mode::Sub).unwrap();

    let mut calls = Vec::new();
    let details = client
        .fetch_all(&shows, |done, total| calls.push((done, total)))
        .await;

    assert_eq!(details.len(), 2);
    assert_eq!(details["f1"].synopsis, "After the party's journey.");
    assert!(details["f2"].has_thumbnail());
    assert_eq!(calls.last(), Some(&(2, 2)));
    assert_eq!(client.cache().entries().unwrap(), 2);
}

/// Test that clearing the cache folder forgets stored details.
#[test]
fn test_cache_clear_then_load() {
    let tmp = TempDir::new().unwrap();
    let cache = ThumbnailCache::open(tmp.path().join("Ani-Cache")).unwrap();
    cache.store_synopsis("Re:Zero", "Loops.").unwrap();
    cache.store_image("Re:Zero", b"img").unwrap();
    assert!(cache.load("Re:Zero").unwrap().is_some());

    assert_eq!(cache.clear().unwrap(), 2);
    assert!(cache.load("Re:Zero").unwrap().is_none());
}

/// Test Jikan parsing fallback text.
#[test]
fn test_jikan_missing_synopsis_uses_fallback() {
    let body = r#"{"data": [{"synopsis": null, "images": {"jpg": {"image_url": "https://cdn/x.jpg"}}}]}"#;
    let found = parse_jikan_search(body).unwrap().unwrap();
    assert_eq!(found.synopsis, NO_DESCRIPTION);
    assert_eq!(ShowDetails::fallback().synopsis, NO_DESCRIPTION);
}

/// Test that history remembers how to reach the show again.
#[test]
fn test_history_resume_flow() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("history.json");

    let mut history = WatchHistory::new();
    history.update(Launched {
        show_id: "f1",
        show_name: "Frieren",
        query: "frieren",
        index: 1,
        episode: "4",
        mode: Mode::Dub,
    });
    history.save_to(&path).unwrap();

    let loaded = WatchHistory::load_from(&path).unwrap();
    let record = loaded.get_recent(10)[0].clone();
    assert_eq!(record.query, "frieren");

    let episodes: Vec<Episode> = ["3", "4", "5"]
        .iter()
        .map(|n| Episode {
            id: format!("f1-{}", n),
            number: n.to_string(),
        })
        .collect();
    assert_eq!(record.resume_position(&episodes), 2);

    let mut app = App::new(Mode::Sub, Quality::Best, String::new(), Default::default());
    app.set_history(vec![record]);
    assert_eq!(press(&mut app, KeyCode::Enter), Action::ContinueFromHistory(0));
}

/// Test that config keybindings drive the interface.
#[test]
fn test_config_keybindings_apply_to_app() {
    let config: Config = toml::from_str(
        r#"
        quality = "480p"

        [keybindings]
        play = ["space"]
        "#,
    )
    .unwrap();

    let mut app = App::new(config.mode, config.quality, config.player, config.keybindings);
    app.begin_search("q");
    app.set_episodes(
        Show {
            id: "a".to_string(),
            name: "A".to_string(),
            index: 1,
            available_episodes: 1,
        },
        vec![Episode {
            id: "a-1".to_string(),
            number: "1".to_string(),
        }],
    );

    assert_eq!(app.quality, Quality::P480);
    assert_eq!(press(&mut app, KeyCode::Char(' ')), Action::Play(0));
    assert_eq!(press(&mut app, KeyCode::Char('p')), Action::None);
}

/// Test grid navigation across rows.
#[test]
fn test_grid_navigation_integration() {
    let mut selected = 0;
    for direction in [Move::Right, Move::Right, Move::Right, Move::Down] {
        selected = step(selected, 10, GRID_COLUMNS, direction);
    }
    assert_eq!(selected, 6);
    assert_eq!(step(selected, 10, GRID_COLUMNS, Move::Down), 9);
}
