//! Launch arguments of the front-end.
//!
//! Arguments are either files (ROMs, Lua scripts) or switches written as
//! `-x`, `--x` or `/x`. Fixed switches are matched case-insensitively; any
//! other `key=value` switch goes to the [`SwitchRegistry`]. Bad arguments are
//! collected in [`CommandLine::errors`] and never stop the launch.

use crate::error::{ArgumentError, SwitchError};
use crate::logging::{log, LogCategory, LogLevel};
use crate::settings::Configuration;
use crate::switches::SwitchRegistry;
use std::path::{Component, Path, PathBuf};

/// Extension of recorded movies
pub const MOVIE_EXTENSION: &str = "hmv";

/// Lua scripts with these prefixes drive the external bridge and do not count
/// as user scripts
const BRIDGE_SCRIPT_PREFIXES: &[&str] = &["hemu_live_bridge", "hemu_socket_bridge"];

pub const GENERAL_SWITCHES_HELP: &str = "\
--fullscreen - Start in fullscreen mode
--doNotSaveSettings - Prevent settings from being saved to the disk
--recordMovie=\"filename.hmv\" - Start recording a movie after the specified game is loaded.
--loadLastSession - Resumes the game in the state it was left in when it was last played.
--openDebugger - Open the main debugger window after a ROM loads.
--openStateInspector - Open the State Inspector window after a ROM loads.
--enableWatchHud - Enable the watch HUD overlay.
--openScriptWindow - Open a Script Window for any .lua file passed on the command line.
--headless - Hide the main window (default when non-bridge .lua scripts are passed without UI flags).
--instanceGuid=<guid> - Override the single-instance identifier for this process.
--instanceName=<name> - Derive a stable instance GUID from a name.
--multiInstance - Always use a new instance GUID.
--autoDebug - Enable watch HUD and open Debugger + State Inspector after a ROM loads.
";

/// Folders relative arguments are resolved against
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Working directory the process was started from
    pub original_folder: PathBuf,
    /// Where bare movie file names go
    pub movie_folder: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub no_video: bool,
    pub no_audio: bool,
    pub no_input: bool,
    pub fullscreen: bool,
    pub do_not_save_settings: bool,
    pub load_last_session: bool,
    pub movie_to_record: Option<PathBuf>,
    pub test_runner_timeout: i32,
    pub lua_scripts: Vec<PathBuf>,
    pub files_to_load: Vec<PathBuf>,
    pub open_debugger: bool,
    pub open_state_inspector: bool,
    pub enable_watch_hud: bool,
    pub open_script_window: bool,
    pub headless: bool,
    pub errors: Vec<ArgumentError>,
}

impl Default for CommandLine {
    fn default() -> Self {
        Self {
            no_video: false,
            no_audio: false,
            no_input: false,
            fullscreen: false,
            do_not_save_settings: false,
            load_last_session: false,
            movie_to_record: None,
            test_runner_timeout: 100,
            lua_scripts: Vec::new(),
            files_to_load: Vec::new(),
            open_debugger: false,
            open_state_inspector: false,
            enable_watch_hud: false,
            open_script_window: false,
            headless: false,
            errors: Vec::new(),
        }
    }
}

/// Strip the `--`, `-` or `/` prefix of a switch
pub fn convert_arg(arg: &str) -> &str {
    let arg = arg.trim();
    arg.strip_prefix("--")
        .or_else(|| arg.strip_prefix('-'))
        .or_else(|| arg.strip_prefix('/'))
        .unwrap_or(arg)
}

fn is_switch(arg: &str) -> bool {
    arg.starts_with('-') || arg.starts_with('/')
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Whether `path` names one of the bridge helper scripts
pub fn is_bridge_script(path: &Path) -> bool {
    let Some(stem) = path.file_stem() else {
        return false;
    };
    let stem = stem.to_string_lossy().to_lowercase();
    BRIDGE_SCRIPT_PREFIXES
        .iter()
        .any(|prefix| stem.starts_with(prefix))
}

/// `path` made absolute against `base`, with `.` and `..` folded lexically
pub fn absolute_path(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Value of a `name=value` switch, matching the name case-insensitively
fn switch_value<'a>(switch: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = switch.split_once('=')?;
    key.eq_ignore_ascii_case(name).then_some(value)
}

/// True when the main window should stay hidden, decided before anything
/// else is initialized
pub fn should_hide_main_window<S: AsRef<str>>(args: &[S]) -> bool {
    let mut headless = false;
    let mut has_user_lua = false;
    let mut ui_requested = false;

    for arg in args.iter().map(AsRef::as_ref) {
        if is_switch(arg) {
            match convert_arg(arg).to_ascii_lowercase().as_str() {
                "headless" | "nogui" | "noui" => headless = true,
                "openscriptwindow" | "opendebugger" | "openstateinspector" | "enablewatchhud" => {
                    ui_requested = true
                }
                _ => {}
            }
        } else {
            let path = Path::new(arg);
            if has_extension(path, "lua") && !is_bridge_script(path) {
                has_user_lua = true;
            }
        }
    }

    headless || (has_user_lua && !ui_requested)
}

pub fn is_test_runner<S: AsRef<str>>(args: &[S]) -> bool {
    args.iter()
        .any(|arg| convert_arg(arg.as_ref()).eq_ignore_ascii_case("testrunner"))
}

impl CommandLine {
    /// Parse `args`, applying settings switches to `config` as they come.
    pub fn parse<S: AsRef<str>>(
        args: &[S],
        context: &ParseContext,
        registry: &SwitchRegistry,
        config: &mut Configuration,
    ) -> Self {
        let mut parsed = CommandLine::default();
        let mut has_user_lua = false;

        for arg in args.iter().map(AsRef::as_ref) {
            let abs_path = absolute_path(&context.original_folder, Path::new(arg));

            if abs_path.is_file() {
                if has_extension(&abs_path, "lua") {
                    if !is_bridge_script(&abs_path) {
                        has_user_lua = true;
                    }
                    parsed.lua_scripts.push(abs_path);
                } else {
                    parsed.files_to_load.push(abs_path);
                }
            } else if is_switch(arg) {
                parsed.process_switch(arg, context, registry, config);
            } else {
                parsed.errors.push(ArgumentError::FileNotFound(arg.to_string()));
            }
        }

        if !parsed.headless && has_user_lua && !parsed.open_script_window && !parsed.requests_debug_tools() {
            parsed.headless = true;
        }

        for error in &parsed.errors {
            log(LogCategory::CommandLine, LogLevel::Warn, || format!("[UI] {}", error));
        }
        parsed
    }

    fn process_switch(
        &mut self,
        arg: &str,
        context: &ParseContext,
        registry: &SwitchRegistry,
        config: &mut Configuration,
    ) {
        let switch = convert_arg(arg);
        match switch.to_ascii_lowercase().as_str() {
            "novideo" => self.no_video = true,
            "noaudio" => self.no_audio = true,
            "noinput" => self.no_input = true,
            "fullscreen" => self.fullscreen = true,
            "donotsavesettings" => self.do_not_save_settings = true,
            "loadlastsession" => self.load_last_session = true,
            "opendebugger" => self.open_debugger = true,
            "openstateinspector" => self.open_state_inspector = true,
            "enablewatchhud" => self.enable_watch_hud = true,
            "openscriptwindow" => self.open_script_window = true,
            "headless" | "nogui" | "noui" => self.headless = true,
            "autodebug" => {
                self.open_debugger = true;
                self.open_state_inspector = true;
                self.enable_watch_hud = true;
            }
            // consumed by the single-instance check before parsing
            "multiinstance" | "testrunner" => {}
            lower if lower.starts_with("instanceguid=") || lower.starts_with("instancename=") => {}
            _ => {
                if let Some(movie) = switch_value(switch, "recordmovie") {
                    self.movie_to_record = Some(resolve_movie_path(movie, context));
                } else if let Some(timeout) = switch_value(switch, "timeout") {
                    match timeout.parse() {
                        Ok(timeout) => self.test_runner_timeout = timeout,
                        Err(_) => self.errors.push(ArgumentError::InvalidArgument {
                            arg: arg.to_string(),
                            source: SwitchError::InvalidValue {
                                key: "timeout".to_string(),
                                value: timeout.to_string(),
                            },
                        }),
                    }
                } else if let Err(source) = registry.process_switch(config, switch) {
                    self.errors.push(ArgumentError::InvalidArgument {
                        arg: arg.to_string(),
                        source,
                    });
                }
            }
        }
    }

    pub fn requests_debug_tools(&self) -> bool {
        self.open_debugger || self.open_state_inspector || self.enable_watch_hud
    }

    /// Settings changes implied by the debug flags
    pub fn apply_debug_automation(&self, config: &mut Configuration) {
        if self.enable_watch_hud {
            config.debug.debugger.show_watch_hud = true;
        }
    }
}

/// Bare names go to the movie folder, relative paths to the original
/// folder; the movie extension is appended when missing.
pub fn resolve_movie_path(movie: &str, context: &ParseContext) -> PathBuf {
    let movie = movie.trim_matches('"');
    let path = Path::new(movie);
    let has_folder = path
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());

    let mut resolved = if has_folder {
        absolute_path(&context.original_folder, path)
    } else {
        context.movie_folder.join(path)
    };

    if !has_extension(&resolved, MOVIE_EXTENSION) {
        let mut name = resolved.as_os_str().to_os_string();
        name.push(".");
        name.push(MOVIE_EXTENSION);
        resolved = PathBuf::from(name);
    }
    resolved
}

/// General switches followed by one section per settings group
pub fn available_switches(registry: &SwitchRegistry) -> Vec<(String, String)> {
    let mut sections = vec![("General".to_string(), GENERAL_SWITCHES_HELP.to_string())];
    sections.extend(
        registry
            .help_sections()
            .into_iter()
            .map(|(name, text)| (name.to_string(), text)),
    );
    sections
}
