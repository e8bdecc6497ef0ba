//! Enumerates folders that may hold the user's configuration.
//!
//! Nothing here creates directories; a lookup that fails simply yields no
//! candidate.

use super::platform::{OsFamily, PlatformFolders};
use crate::settings::SETTINGS_FILE_NAME;
use std::path::{Path, PathBuf};

/// Folder name of the current product under per-user locations
pub const PRODUCT_FOLDER: &str = "Hemu";

/// Folder name used by the predecessor product
pub const PREDECESSOR_FOLDER: &str = "HemuClassic";

pub const SAVE_STATES_DIR: &str = "SaveStates";
pub const SAVES_DIR: &str = "Saves";

/// Outcome of candidate discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// The override variable is set; no scan was performed
    Override(PathBuf),
    Scan(CandidateScan),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateScan {
    pub portable_folder: PathBuf,
    pub default_folder: PathBuf,
    /// A portable settings file exists but sits inside an app bundle
    pub portable_ignored: bool,
    /// Deduplicated, in priority order
    pub candidates: Vec<PathBuf>,
}

impl CandidateScan {
    pub fn portable_usable(&self) -> bool {
        !self.portable_ignored && has_settings_file(&self.portable_folder)
    }
}

/// Case-insensitive path comparison
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

/// Drop later duplicates under case-insensitive comparison, keeping order
pub fn dedup_paths<I>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut unique: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !unique.iter().any(|existing| paths_equal(existing, &path)) {
            unique.push(path);
        }
    }
    unique
}

pub fn settings_path(folder: &Path) -> PathBuf {
    folder.join(SETTINGS_FILE_NAME)
}

pub fn has_settings_file(folder: &Path) -> bool {
    settings_path(folder).is_file()
}

/// Folder next to the executable
pub fn portable_folder<P: PlatformFolders + ?Sized>(platform: &P) -> PathBuf {
    platform.exe_dir().unwrap_or_else(|| PathBuf::from("./"))
}

fn is_unusable_mac_base(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.trim().is_empty()
        || text == "/"
        || text.starts_with("/var/root")
        || text.starts_with("/private/var/root")
}

/// Default per-user home: documents on Windows, application data elsewhere.
pub fn default_documents_folder<P: PlatformFolders + ?Sized>(platform: &P) -> PathBuf {
    let os = platform.os();
    let mut base = match os {
        OsFamily::Windows => platform.documents_dir(),
        _ => platform.app_data_dir(),
    };

    // Some macOS launchers strip HOME, which sends app data to /var/root.
    if os == OsFamily::MacOs && base.as_deref().map_or(true, is_unusable_mac_base) {
        let profile = platform.home_dir().or_else(|| {
            platform
                .env_var("HOME")
                .filter(|home| !home.trim().is_empty())
                .map(PathBuf::from)
        });
        if let Some(profile) = profile {
            base = Some(profile.join("Library").join("Application Support"));
        }
    }

    let base = base
        .or_else(|| platform.home_dir())
        .unwrap_or_else(|| portable_folder(platform));
    base.join(PRODUCT_FOLDER)
}

/// Whether `folder` lives inside a macOS `.app` bundle
pub fn is_mac_app_bundle_path(os: OsFamily, folder: &Path) -> bool {
    if os != OsFamily::MacOs {
        return false;
    }
    let normalized = folder.to_string_lossy().replace('\\', "/").to_lowercase();
    !normalized.trim().is_empty() && normalized.contains(".app/contents/")
}

fn excluded(candidate: &Path, default_folder: &Path, portable_folder: &Path) -> bool {
    paths_equal(candidate, default_folder) || paths_equal(candidate, portable_folder)
}

/// Older per-user locations of this product that still hold a settings file
pub fn legacy_config_folders<P: PlatformFolders + ?Sized>(
    platform: &P,
    default_folder: &Path,
    portable_folder: &Path,
) -> Vec<PathBuf> {
    let locations = [
        platform.documents_dir().map(|d| d.join(PRODUCT_FOLDER)),
        platform
            .home_dir()
            .map(|h| h.join(".config").join(PRODUCT_FOLDER)),
    ];

    dedup_paths(locations.into_iter().flatten())
        .into_iter()
        .filter(|c| !excluded(c, default_folder, portable_folder))
        .filter(|c| has_settings_file(c))
        .collect()
}

/// Predecessor-product folders with a settings file or save data.
///
/// Looser than [`legacy_config_folders`]: a bare `SaveStates` or `Saves`
/// directory is enough.
pub fn predecessor_folders<P: PlatformFolders + ?Sized>(
    platform: &P,
    default_folder: &Path,
    portable_folder: &Path,
) -> Vec<PathBuf> {
    let locations = [
        platform.documents_dir().map(|d| d.join(PREDECESSOR_FOLDER)),
        platform.app_data_dir().map(|d| d.join(PREDECESSOR_FOLDER)),
        platform
            .home_dir()
            .map(|h| h.join(".config").join(PREDECESSOR_FOLDER)),
    ];

    dedup_paths(locations.into_iter().flatten())
        .into_iter()
        .filter(|c| !excluded(c, default_folder, portable_folder))
        .filter(|c| {
            has_settings_file(c)
                || c.join(SAVE_STATES_DIR).is_dir()
                || c.join(SAVES_DIR).is_dir()
        })
        .collect()
}

/// Run discovery. The override variable short-circuits everything else.
pub fn discover<P: PlatformFolders + ?Sized>(platform: &P) -> Discovery {
    if let Some(folder) = platform.home_override() {
        return Discovery::Override(folder);
    }

    let portable = portable_folder(platform);
    let default = default_documents_folder(platform);
    let portable_in_bundle = is_mac_app_bundle_path(platform.os(), &portable);
    let portable_has_settings = has_settings_file(&portable);

    let mut candidates = Vec::new();
    if portable_has_settings && !portable_in_bundle {
        candidates.push(portable.clone());
    }
    if has_settings_file(&default) {
        candidates.push(default.clone());
    }
    candidates.extend(legacy_config_folders(platform, &default, &portable));

    Discovery::Scan(CandidateScan {
        portable_ignored: portable_has_settings && portable_in_bundle,
        candidates: dedup_paths(candidates),
        portable_folder: portable,
        default_folder: default,
    })
}
