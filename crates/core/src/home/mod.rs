//! Resolution of the front-end's home folder.
//!
//! Discovery → selection → (first run) migration, cached for the lifetime of
//! the owning [`ConfigHome`]. Resolution never fails: in the worst case it
//! lands on the default per-user folder.

pub mod discovery;
pub mod migrate;
pub mod platform;
pub mod select;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::ConfigError;
use crate::logging::{log, LogCategory, LogLevel};
use crate::settings::{Configuration, SETTINGS_FILE_NAME};
use discovery::{discover, paths_equal, Discovery};
use migrate::{migrate_predecessor, MigrationOutcome};
use platform::{PlatformFolders, SystemFolders};
use select::{rank_candidates, score_folders, ConfigCandidate};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

/// Why a folder ended up as the home
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HomeSource {
    /// `HEMU_HOME` was set
    Override,
    /// Selected among candidates and it is the portable or default folder
    Selected,
    /// Selected among candidates and it is an older location
    Legacy,
    /// No candidate had a settings file
    Default,
}

/// Full account of one resolution, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub folder: PathBuf,
    pub source: HomeSource,
    pub portable_folder: Option<PathBuf>,
    pub default_folder: Option<PathBuf>,
    pub portable_ignored: bool,
    /// Best first; empty for an override
    pub candidates: Vec<ConfigCandidate>,
    pub migration: Option<MigrationOutcome>,
}

/// Data folders with a user-overridable location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFolder {
    Avi,
    Movies,
    Saves,
    SaveStates,
    Screenshots,
    Wave,
}

impl DataFolder {
    pub fn dir_name(self) -> &'static str {
        match self {
            DataFolder::Avi => "Avi",
            DataFolder::Movies => "Movies",
            DataFolder::Saves => "Saves",
            DataFolder::SaveStates => "SaveStates",
            DataFolder::Screenshots => "Screenshots",
            DataFolder::Wave => "Wave",
        }
    }

    fn user_override(self, config: &Configuration) -> (Option<&str>, bool) {
        let p = &config.preferences;
        let (folder, enabled) = match self {
            DataFolder::Avi => (&p.avi_folder, p.override_avi_folder),
            DataFolder::Movies => (&p.movie_folder, p.override_movie_folder),
            DataFolder::Saves => (&p.save_data_folder, p.override_save_data_folder),
            DataFolder::SaveStates => (&p.save_state_folder, p.override_save_state_folder),
            DataFolder::Screenshots => (&p.screenshot_folder, p.override_screenshot_folder),
            DataFolder::Wave => (&p.wave_folder, p.override_wave_folder),
        };
        (folder.as_deref(), enabled)
    }
}

/// Fixed folders under the home
pub const FIXED_FOLDERS: &[&str] = &[
    "Cheats",
    "GameConfig",
    "Satellaview",
    "Debugger",
    "Firmware",
    "Backups",
    "Tests",
    "HdPacks",
    "RecentGames",
];

/// Use the override when enabled, otherwise the default; create it, and fall
/// back to the default when the override cannot be created.
pub fn get_folder(default: &Path, override_folder: Option<&str>, use_override: bool) -> PathBuf {
    let folder = match override_folder {
        Some(custom) if use_override => PathBuf::from(custom),
        _ => default.to_path_buf(),
    };

    if folder.is_dir() {
        return folder;
    }
    match fs::create_dir_all(&folder) {
        Ok(()) => folder,
        Err(_) => {
            log(LogCategory::Config, LogLevel::Warn, || {
                format!("[UI] Folder could not be created: {}", folder.display())
            });
            default.to_path_buf()
        }
    }
}

fn ensure_dir(folder: &Path) {
    if let Err(e) = fs::create_dir_all(folder) {
        log(LogCategory::Config, LogLevel::Error, || {
            format!("[UI] {}", ConfigError::io(folder, e))
        });
    }
}

fn log_migration(outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::Migrated {
            source,
            report,
            marker_written,
        } => {
            log(LogCategory::Migration, LogLevel::Info, || {
                format!(
                    "[UI] Migrated legacy data from: {} ({} copied, {} kept)",
                    source.display(),
                    report.files_copied,
                    report.files_skipped
                )
            });
            for failure in &report.failures {
                log(LogCategory::Migration, LogLevel::Warn, || {
                    format!("[UI] Migration: {}", failure)
                });
            }
            if !marker_written {
                log(LogCategory::Migration, LogLevel::Warn, || {
                    "[UI] Migration marker could not be written".to_string()
                });
            }
        }
        other => log(LogCategory::Migration, LogLevel::Debug, || {
            format!("[UI] Legacy migration: {:?}", other)
        }),
    }
}

/// Owns the platform lookups and the lazily resolved home folder.
pub struct ConfigHome<P: PlatformFolders = SystemFolders> {
    platform: P,
    cached: RwLock<Option<PathBuf>>,
    init_lock: Mutex<()>,
    save_disabled: AtomicBool,
}

impl ConfigHome<SystemFolders> {
    pub fn system() -> Self {
        Self::new(SystemFolders)
    }
}

impl<P: PlatformFolders> ConfigHome<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            cached: RwLock::new(None),
            init_lock: Mutex::new(()),
            save_disabled: AtomicBool::new(false),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn cached(&self) -> Option<PathBuf> {
        self.cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The home folder, resolved on first use and cached afterwards.
    pub fn home_folder(&self) -> PathBuf {
        if let Some(folder) = self.cached() {
            return folder;
        }

        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(folder) = self.cached() {
            return folder;
        }

        let folder = self.resolve_uncached().folder;
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(folder.clone());
        folder
    }

    /// Forget the cached folder; the next access resolves again.
    pub fn reset(&self) {
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Pin the home folder, as the setup wizard does for a new install
    pub fn set_home_folder(&self, folder: PathBuf) {
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(folder);
    }

    /// Resolve again and cache the result. The report carries the outcome of
    /// the migration this resolution ran.
    pub fn refresh(&self) -> ResolutionReport {
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let report = self.resolve_uncached();
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(report.folder.clone());
        report
    }

    /// Run discovery, selection and migration without touching the cache.
    pub fn resolve_uncached(&self) -> ResolutionReport {
        let scan = match discover(&self.platform) {
            Discovery::Override(folder) => {
                ensure_dir(&folder);
                log(LogCategory::Config, LogLevel::Info, || {
                    format!("[UI] Using HEMU_HOME override: {}", folder.display())
                });
                return ResolutionReport {
                    folder,
                    source: HomeSource::Override,
                    portable_folder: None,
                    default_folder: None,
                    portable_ignored: false,
                    candidates: Vec::new(),
                    migration: None,
                };
            }
            Discovery::Scan(scan) => scan,
        };

        if scan.portable_ignored {
            log(LogCategory::Config, LogLevel::Info, || {
                format!(
                    "[UI] Ignoring portable config inside app bundle: {}",
                    scan.portable_folder.display()
                )
            });
        }

        let candidates = rank_candidates(score_folders(&scan.candidates));
        let (folder, source) = match candidates.first() {
            Some(best) => {
                let standard = paths_equal(&best.folder, &scan.default_folder)
                    || paths_equal(&best.folder, &scan.portable_folder);
                if standard {
                    log(LogCategory::Config, LogLevel::Info, || {
                        format!("[UI] Using config folder: {}", best.folder.display())
                    });
                    (best.folder.clone(), HomeSource::Selected)
                } else {
                    log(LogCategory::Config, LogLevel::Info, || {
                        format!("[UI] Using legacy config folder: {}", best.folder.display())
                    });
                    (best.folder.clone(), HomeSource::Legacy)
                }
            }
            None if scan.portable_usable() => (scan.portable_folder.clone(), HomeSource::Default),
            None => (scan.default_folder.clone(), HomeSource::Default),
        };

        ensure_dir(&folder);
        let migration = migrate_predecessor(
            &self.platform,
            &folder,
            &scan.default_folder,
            &scan.portable_folder,
        );
        log_migration(&migration);

        ResolutionReport {
            folder,
            source,
            portable_folder: Some(scan.portable_folder),
            default_folder: Some(scan.default_folder),
            portable_ignored: scan.portable_ignored,
            candidates,
            migration: Some(migration),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        let home = self.home_folder();
        ensure_dir(&home);
        home.join(SETTINGS_FILE_NAME)
    }

    pub fn default_folder(&self, folder: DataFolder) -> PathBuf {
        self.home_folder().join(folder.dir_name())
    }

    /// Data folder honoring the user's override in `config`
    pub fn data_folder(&self, folder: DataFolder, config: &Configuration) -> PathBuf {
        let (custom, enabled) = folder.user_override(config);
        get_folder(&self.default_folder(folder), custom, enabled)
    }

    /// One of [`FIXED_FOLDERS`], created on demand
    pub fn fixed_folder(&self, name: &str) -> PathBuf {
        get_folder(&self.home_folder().join(name), None, false)
    }

    /// Settings from the home folder, or a first-run default when absent
    pub fn load_config(&self) -> Result<Configuration, ConfigError> {
        let path = self.config_file();
        if path.is_file() {
            Configuration::load(&path)
        } else {
            Ok(Configuration::create_default())
        }
    }

    pub fn disable_save_settings(&self) {
        self.save_disabled.store(true, Ordering::Relaxed);
    }

    pub fn save_disabled(&self) -> bool {
        self.save_disabled.load(Ordering::Relaxed)
    }

    pub fn save_config(&self, config: &Configuration) -> Result<(), ConfigError> {
        if self.save_disabled() {
            return Err(ConfigError::SaveDisabled);
        }
        config.save(&self.config_file())
    }

    /// Replace the settings with defaults and persist them
    pub fn reset_settings(&self, current: &Configuration) -> Result<Configuration, ConfigError> {
        let config = current.reset_settings();
        self.save_config(&config)?;
        Ok(config)
    }
}
