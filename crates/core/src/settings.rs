//! Persisted front-end settings (`settings.json`).
//!
//! Keys are PascalCase and every section falls back to its defaults, so a
//! partial or older file still loads.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the settings file at the root of a home folder
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Stored as an integer in `ConfigUpgrade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum ConfigUpgradeHint {
    Uninitialized = 0,
    FirstRun = 1,
    SmsInput = 2,
    DefaultKeyMappings = 3,
    NextValue = 4,
}

impl ConfigUpgradeHint {
    /// Latest hint a fully initialized configuration carries
    pub const LATEST: i32 = ConfigUpgradeHint::NextValue as i32 - 1;

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ConfigUpgradeHint::Uninitialized),
            1 => Some(ConfigUpgradeHint::FirstRun),
            2 => Some(ConfigUpgradeHint::SmsInput),
            3 => Some(ConfigUpgradeHint::DefaultKeyMappings),
            4 => Some(ConfigUpgradeHint::NextValue),
            _ => None,
        }
    }
}

/// Up to three simultaneously held keys; all zero means unbound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct KeyCombination {
    pub key1: u16,
    pub key2: u16,
    pub key3: u16,
}

impl KeyCombination {
    pub fn single(key: u16) -> Self {
        Self {
            key1: key,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key1 == 0 && self.key2 == 0 && self.key3 == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShortcutKeyInfo {
    pub shortcut: String,
    pub key_combination: Option<KeyCombination>,
    pub key_combination2: Option<KeyCombination>,
}

impl ShortcutKeyInfo {
    /// True when either combination holds at least one key
    pub fn is_bound(&self) -> bool {
        let bound = |combo: &Option<KeyCombination>| combo.is_some_and(|c| !c.is_empty());
        bound(&self.key_combination) || bound(&self.key_combination2)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecentItem {
    pub path: String,
    pub patch_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecentFiles {
    pub items: Vec<RecentItem>,
}

/// Settings enum addressable by variant name
pub trait SettingsEnum: Copy + 'static {
    const NAMES: &'static [&'static str];

    fn name(self) -> &'static str;

    /// Case-insensitive lookup by variant name
    fn from_name(value: &str) -> Option<Self>;
}

/// Declares a settings enum that serializes by name and exposes its names to
/// the switch registry.
macro_rules! settings_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl SettingsEnum for $name {
            const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            fn from_name(value: &str) -> Option<Self> {
                $(if value.eq_ignore_ascii_case(stringify!($variant)) {
                    return Some($name::$variant);
                })+
                None
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
}

settings_enum!(
    /// UI theme
    Theme { Light, Dark } default Light
);

settings_enum!(
    VideoFilterType {
        None,
        Ntsc,
        HQ2x,
        HQ3x,
        Scale2x,
        Prescale2x,
        Prescale3x,
        Prescale4x,
    } default None
);

settings_enum!(
    VideoAspectRatio {
        NoStretching,
        Auto,
        NTSC,
        PAL,
        Standard,
        Widescreen,
        Custom,
    } default NoStretching
);

settings_enum!(
    AudioSampleRate {
        Rate11025,
        Rate22050,
        Rate32000,
        Rate44100,
        Rate48000,
        Rate96000,
    } default Rate48000
);

settings_enum!(
    Region { Auto, Ntsc, Pal, Dendy } default Auto
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AudioConfig {
    pub enable_audio: bool,
    pub master_volume: u32,
    pub audio_latency: u32,
    pub sample_rate: AudioSampleRate,
    pub mute_sound_in_background: bool,
    pub reduce_sound_in_fast_forward: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enable_audio: true,
            master_volume: 100,
            audio_latency: 60,
            sample_rate: AudioSampleRate::default(),
            mute_sound_in_background: false,
            reduce_sound_in_fast_forward: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VideoConfig {
    pub video_filter: VideoFilterType,
    pub aspect_ratio: VideoAspectRatio,
    pub custom_aspect_ratio: f64,
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub scanline_intensity: u32,
    pub use_bilinear_interpolation: bool,
    pub vertical_sync: bool,
    pub integer_fps_mode: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            video_filter: VideoFilterType::default(),
            aspect_ratio: VideoAspectRatio::default(),
            custom_aspect_ratio: 1.0,
            brightness: 0,
            contrast: 0,
            saturation: 0,
            scanline_intensity: 0,
            use_bilinear_interpolation: false,
            vertical_sync: false,
            integer_fps_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EmulationConfig {
    pub emulation_speed: u32,
    pub turbo_speed: u32,
    pub rewind_speed: u32,
    pub run_ahead_frames: u32,
    pub region: Region,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            emulation_speed: 100,
            turbo_speed: 300,
            rewind_speed: 100,
            run_ahead_frames: 0,
            region: Region::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InputConfig {
    pub controller_deadzone_size: u32,
    pub mouse_sensitivity: u32,
    pub allow_background_input: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            controller_deadzone_size: 2,
            mouse_sensitivity: 1,
            allow_background_input: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DebuggerConfig {
    pub show_watch_hud: bool,
    pub watch_hud_max_entries: i32,
    pub break_on_uninit_read: bool,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            show_watch_hud: false,
            watch_hud_max_entries: 8,
            break_on_uninit_read: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DebugConfig {
    pub debugger: DebuggerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Preferences {
    pub theme: Theme,
    pub shortcut_keys: Vec<ShortcutKeyInfo>,
    pub pause_when_in_background: bool,
    pub show_fps: bool,
    pub separate_save_states_by_patch: bool,

    pub avi_folder: Option<String>,
    pub override_avi_folder: bool,
    pub movie_folder: Option<String>,
    pub override_movie_folder: bool,
    pub save_data_folder: Option<String>,
    pub override_save_data_folder: bool,
    pub save_state_folder: Option<String>,
    pub override_save_state_folder: bool,
    pub screenshot_folder: Option<String>,
    pub override_screenshot_folder: bool,
    pub wave_folder: Option<String>,
    pub override_wave_folder: bool,
}

/// Root of `settings.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Configuration {
    pub config_upgrade: i32,
    /// Bitmask of the default key-mapping presets picked in the setup wizard
    pub default_key_mappings: u32,
    pub recent_files: RecentFiles,
    pub preferences: Preferences,
    pub audio: AudioConfig,
    pub video: VideoConfig,
    pub emulation: EmulationConfig,
    pub input: InputConfig,
    pub debug: DebugConfig,
}

/// Shortcuts bound on a first run, as (shortcut, key code)
const DEFAULT_SHORTCUTS: &[(&str, u16)] = &[
    ("FastForward", 0x09),
    ("Rewind", 0x08),
    ("Pause", 0x1B),
    ("TakeScreenshot", 0x7B),
    ("ToggleFullscreen", 0x7A),
    ("SaveStateToFile", 0x74),
    ("LoadStateFromFile", 0x78),
];

impl Configuration {
    /// Configuration written before the setup wizard has run
    pub fn create_default() -> Self {
        Self {
            config_upgrade: ConfigUpgradeHint::FirstRun as i32,
            ..Default::default()
        }
    }

    /// Load and parse a settings file. A leading UTF-8 BOM is ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_json(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents.trim_start_matches('\u{FEFF}'))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        fs::write(path, contents).map_err(|e| ConfigError::io(path, e))
    }

    pub fn upgrade_hint(&self) -> Option<ConfigUpgradeHint> {
        ConfigUpgradeHint::from_i32(self.config_upgrade)
    }

    pub fn recent_count(&self) -> usize {
        self.recent_files.items.len()
    }

    pub fn bound_shortcut_count(&self) -> usize {
        self.preferences
            .shortcut_keys
            .iter()
            .filter(|info| info.is_bound())
            .count()
    }

    /// Looks like an untouched first-run default: a `FirstRun` hint, or an
    /// `Uninitialized` hint with no recent files and no bound shortcuts.
    pub fn is_fresh(&self) -> bool {
        match self.upgrade_hint() {
            Some(ConfigUpgradeHint::FirstRun) => true,
            Some(ConfigUpgradeHint::Uninitialized) => {
                self.recent_count() == 0 && self.bound_shortcut_count() == 0
            }
            _ => false,
        }
    }

    /// Fill in the default shortcut bindings that are missing
    pub fn initialize_defaults(&mut self) {
        for &(shortcut, key) in DEFAULT_SHORTCUTS {
            let exists = self
                .preferences
                .shortcut_keys
                .iter()
                .any(|info| info.shortcut == shortcut);
            if !exists {
                self.preferences.shortcut_keys.push(ShortcutKeyInfo {
                    shortcut: shortcut.to_string(),
                    key_combination: Some(KeyCombination::single(key)),
                    key_combination2: None,
                });
            }
        }
    }

    /// Fresh defaults, keeping only the chosen default key mappings
    pub fn reset_settings(&self) -> Self {
        let mut config = Self::create_default();
        config.default_key_mappings = self.default_key_mappings;
        config.initialize_defaults();
        config.config_upgrade = ConfigUpgradeHint::LATEST;
        config
    }
}
