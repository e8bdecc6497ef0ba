//! One-time copy of predecessor-product data into the active home folder.
//!
//! The copy never overwrites: existing destination files win. Each entry is
//! attempted independently and failures are collected in the report. A
//! marker file in the destination stops the migration from running again.

use super::discovery::{has_settings_file, predecessor_folders};
use super::platform::PlatformFolders;
use super::select::select_best_config_folder;
use crate::error::ConfigError;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marker written into the destination once a migration has run
pub const MIGRATION_MARKER: &str = ".migrated-from-hemuclassic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The marker file is already present
    AlreadyMigrated,
    /// The destination is an active install with its own settings
    DestinationHasSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    pub directories_created: usize,
    pub files_copied: usize,
    /// Already present in the destination
    pub files_skipped: usize,
    /// Entries that could not be walked, created or copied
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MigrationOutcome {
    Skipped(SkipReason),
    /// No predecessor folder qualified as a source
    NothingToMigrate,
    Migrated {
        source: PathBuf,
        report: CopyReport,
        marker_written: bool,
    },
}

pub fn marker_path(destination: &Path) -> PathBuf {
    destination.join(MIGRATION_MARKER)
}

/// Preconditions for migrating into `destination`
pub fn check_destination(destination: &Path) -> Result<(), SkipReason> {
    if marker_path(destination).exists() {
        return Err(SkipReason::AlreadyMigrated);
    }
    if has_settings_file(destination) {
        return Err(SkipReason::DestinationHasSettings);
    }
    Ok(())
}

fn copy_file(source: &Path, target: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    fs::copy(source, target).map_err(|e| ConfigError::io(target, e))?;
    Ok(())
}

/// Recursively copy `source` into `destination` without overwriting anything.
pub fn copy_directory(source: &Path, destination: &Path) -> CopyReport {
    let mut report = CopyReport::default();

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.failures.push(e.to_string());
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            if target.is_dir() {
                continue;
            }
            match fs::create_dir_all(&target) {
                Ok(()) => report.directories_created += 1,
                Err(e) => report
                    .failures
                    .push(ConfigError::io(&target, e).to_string()),
            }
        } else if target.exists() {
            report.files_skipped += 1;
        } else {
            match copy_file(entry.path(), &target) {
                Ok(()) => report.files_copied += 1,
                Err(e) => report.failures.push(e.to_string()),
            }
        }
    }

    report
}

fn write_marker(destination: &Path) -> Result<(), ConfigError> {
    let path = marker_path(destination);
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    fs::write(&path, stamp).map_err(|e| ConfigError::io(path, e))
}

/// Migrate the best of `legacy_folders` into `destination`.
pub fn migrate_from(destination: &Path, legacy_folders: &[PathBuf]) -> MigrationOutcome {
    if let Err(reason) = check_destination(destination) {
        return MigrationOutcome::Skipped(reason);
    }

    let Some(source) = select_best_config_folder(legacy_folders) else {
        return MigrationOutcome::NothingToMigrate;
    };

    let report = copy_directory(&source, destination);
    let marker_written = write_marker(destination).is_ok();
    MigrationOutcome::Migrated {
        source,
        report,
        marker_written,
    }
}

/// Look for predecessor-product folders and migrate the best one.
pub fn migrate_predecessor<P: PlatformFolders + ?Sized>(
    platform: &P,
    destination: &Path,
    default_folder: &Path,
    portable_folder: &Path,
) -> MigrationOutcome {
    if let Err(reason) = check_destination(destination) {
        return MigrationOutcome::Skipped(reason);
    }

    let legacy = predecessor_folders(platform, default_folder, portable_folder);
    if legacy.is_empty() {
        return MigrationOutcome::NothingToMigrate;
    }
    migrate_from(destination, &legacy)
}
