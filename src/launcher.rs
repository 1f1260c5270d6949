//! Launching ani-cli for playback and downloads.
//!
//! ani-cli does the stream extraction and player handling; ani-gui only
//! builds the argument vector that selects a search result and episode
//! non-interactively, then runs it detached from the terminal.

use crate::error::{AppError, Result};
use crate::types::{Mode, Quality};
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Environment variable ani-cli reads its player from.
pub const PLAYER_ENV: &str = "ANI_CLI_PLAYER";

/// Environment variable ani-cli reads its download directory from.
pub const DOWNLOAD_DIR_ENV: &str = "ANI_CLI_DOWNLOAD_DIR";

/// What ani-cli should do with the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchAction {
    Play,
    Download,
}

impl LaunchAction {
    /// Verb for status messages.
    pub fn verb(&self) -> &'static str {
        match self {
            LaunchAction::Play => "Playing",
            LaunchAction::Download => "Downloading",
        }
    }
}

/// A fully specified ani-cli invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    /// The search query the show index refers to.
    pub query: String,
    /// 1-based index of the show within the results for `query`.
    pub index: usize,
    /// Single episode ("3") or inclusive range ("1-12").
    pub episodes: String,
    pub quality: Quality,
    pub mode: Mode,
    pub action: LaunchAction,
    /// Show title, only used for status messages.
    pub title: String,
}

impl LaunchRequest {
    /// Arguments passed to ani-cli, in order.
    ///
    /// ```
    /// use ani_gui::launcher::{LaunchAction, LaunchRequest};
    /// use ani_gui::types::{Mode, Quality};
    ///
    /// let req = LaunchRequest {
    ///     query: "frieren".to_string(),
    ///     index: 2,
    ///     episodes: "5".to_string(),
    ///     quality: Quality::P720,
    ///     mode: Mode::Sub,
    ///     action: LaunchAction::Play,
    ///     title: "Frieren".to_string(),
    /// };
    /// assert_eq!(req.args(), ["-q", "720p", "-S", "2", "-e", "5", "frieren"]);
    /// ```
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-q".to_string(), self.quality.as_str().to_string()];
        if self.mode == Mode::Dub {
            args.push("--dub".to_string());
        }
        if self.action == LaunchAction::Download {
            args.push("-d".to_string());
        }
        args.extend([
            "-S".to_string(),
            self.index.to_string(),
            "-e".to_string(),
            self.episodes.clone(),
            self.query.clone(),
        ]);
        args
    }

    /// Status bar text for this launch.
    pub fn describe(&self) -> String {
        format!(
            "{} Ep {} of '{}'...",
            self.action.verb(),
            self.episodes,
            self.title
        )
    }
}

/// A running ani-cli child.
#[derive(Debug)]
struct RunningProcess {
    label: String,
    child: Child,
}

/// Outcome of a finished ani-cli process.
#[derive(Debug, Clone, PartialEq)]
pub struct Finished {
    pub label: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl Finished {
    pub fn to_display(&self) -> String {
        match (self.success, self.code) {
            (true, _) => format!("{} finished.", self.label),
            (false, Some(code)) => format!("{} exited with status {}.", self.label, code),
            (false, None) => format!("{} was terminated.", self.label),
        }
    }
}

/// Spawns and tracks ani-cli processes.
#[derive(Debug)]
pub struct AniCli {
    program: PathBuf,
    player: String,
    download_dir: Option<PathBuf>,
    running: Vec<RunningProcess>,
}

impl AniCli {
    pub fn new(program: impl Into<PathBuf>, player: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            player: player.into(),
            download_dir: None,
            running: Vec::new(),
        }
    }

    pub fn with_download_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.download_dir = dir;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn set_player(&mut self, player: &str) {
        self.player = player.trim().to_string();
    }

    /// Whether the configured executable can be found.
    pub fn is_available(&self) -> bool {
        find_in_path(&self.program).is_some()
    }

    /// Number of ani-cli processes still running.
    pub fn running(&self) -> usize {
        self.running.len()
    }

    /// Build the command for a request without running it.
    pub fn command(&self, request: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(request.args());

        if !self.player.is_empty() {
            cmd.env(PLAYER_ENV, &self.player);
        }
        if let Some(dir) = &self.download_dir {
            cmd.env(DOWNLOAD_DIR_ENV, dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        detach(&mut cmd);
        cmd
    }

    /// Start ani-cli for `request` without waiting for it.
    pub fn launch(&mut self, request: &LaunchRequest) -> Result<()> {
        let mut cmd = self.command(request);
        debug!(
            "Running {} {}",
            self.program.display(),
            request.args().join(" ")
        );

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::Launch(format!(
                    "{} not found. Please install ani-cli: https://github.com/pystardust/ani-cli",
                    self.program.display()
                ))
            } else {
                AppError::Launch(e.to_string())
            }
        })?;

        info!("Started ani-cli (pid {}) for {}", child.id(), request.describe());
        self.running.push(RunningProcess {
            label: format!("Ep {} of '{}'", request.episodes, request.title),
            child,
        });
        Ok(())
    }

    /// Collect processes that have exited since the last call.
    pub fn reap(&mut self) -> Vec<Finished> {
        let mut finished = Vec::new();

        self.running.retain_mut(|proc| match proc.child.try_wait() {
            Ok(Some(status)) => {
                finished.push(Finished {
                    label: proc.label.clone(),
                    success: status.success(),
                    code: status.code(),
                });
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Lost track of ani-cli for {}: {}", proc.label, e);
                false
            }
        });

        finished
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // Own process group so terminal signals (Ctrl+C) don't reach the player.
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

/// Search for an executable in the system PATH.
///
/// Handles:
/// - Absolute paths (checked directly)
/// - Relative paths with separators (checked directly)
/// - Windows PATHEXT extensions (.exe, .cmd, .bat)
/// - Standard PATH search
pub fn find_in_path<P: AsRef<Path>>(exe_name: P) -> Option<PathBuf> {
    let exe_path = exe_name.as_ref();

    if exe_path.is_absolute()
        || exe_path
            .to_string_lossy()
            .contains(std::path::MAIN_SEPARATOR)
    {
        if exe_path.is_file() {
            return Some(exe_path.to_path_buf());
        }
        #[cfg(windows)]
        {
            for ext in &["exe", "cmd", "bat", "com"] {
                let with_ext = exe_path.with_extension(ext);
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
        return None;
    }

    env::var_os("PATH").and_then(|paths| {
        #[cfg(windows)]
        let extensions: Vec<String> = env::var("PATHEXT")
            .unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string())
            .split(';')
            .map(|s| s.to_lowercase())
            .collect();

        env::split_paths(&paths).find_map(|dir| {
            let full_path = dir.join(exe_path);

            if full_path.is_file() {
                return Some(full_path);
            }

            #[cfg(windows)]
            {
                for ext in &extensions {
                    let with_ext = full_path.with_extension(ext.trim_start_matches('.'));
                    if with_ext.is_file() {
                        return Some(with_ext);
                    }
                }
            }

            None
        })
    })
}
