//! Scores candidate home folders and picks the one most likely to hold the
//! user's real data.

use super::discovery::{dedup_paths, settings_path, SAVES_DIR, SAVE_STATES_DIR};
use crate::error::ConfigError;
use crate::settings::Configuration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Signals gathered from one candidate folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigCandidate {
    pub folder: PathBuf,
    pub last_write_utc: DateTime<Utc>,
    pub is_valid: bool,
    pub is_fresh: bool,
    pub recent_count: usize,
    pub bound_shortcut_count: usize,
    pub save_state_count: usize,
    pub save_file_count: usize,
}

/// What the settings file says about customization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub is_fresh: bool,
    pub recent_count: usize,
    pub bound_shortcut_count: usize,
}

impl From<&Configuration> for ConfigMetadata {
    fn from(config: &Configuration) -> Self {
        Self {
            is_fresh: config.is_fresh(),
            recent_count: config.recent_count(),
            bound_shortcut_count: config.bound_shortcut_count(),
        }
    }
}

pub fn load_metadata(config_path: &Path) -> Result<ConfigMetadata, ConfigError> {
    Configuration::load(config_path).map(|config| ConfigMetadata::from(&config))
}

/// Recursive file count; errors out on the first unreadable entry.
pub fn try_count_files(folder: &Path) -> Result<usize, walkdir::Error> {
    if !folder.is_dir() {
        return Ok(0);
    }
    WalkDir::new(folder).into_iter().try_fold(0, |count, entry| {
        let entry = entry?;
        Ok(count + usize::from(entry.file_type().is_file()))
    })
}

/// Recursive file count, 0 when the folder is missing or cannot be walked
pub fn count_files(folder: &Path) -> usize {
    try_count_files(folder).unwrap_or(0)
}

impl ConfigCandidate {
    /// Descending priority key; every tier is "has any" then "how many".
    #[allow(clippy::type_complexity)]
    fn rank(
        &self,
    ) -> (
        bool,
        usize,
        bool,
        usize,
        bool,
        usize,
        bool,
        usize,
        bool,
        DateTime<Utc>,
    ) {
        (
            self.save_state_count > 0,
            self.save_state_count,
            self.save_file_count > 0,
            self.save_file_count,
            self.recent_count > 0,
            self.recent_count,
            self.bound_shortcut_count > 0,
            self.bound_shortcut_count,
            !self.is_fresh,
            self.last_write_utc,
        )
    }

    /// Ordering where the better candidate compares as `Less`
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        other.rank().cmp(&self.rank())
    }
}

/// Score a folder. `None` when it has no settings file.
pub fn score_candidate(folder: &Path) -> Option<ConfigCandidate> {
    let config_path = settings_path(folder);
    if !config_path.is_file() {
        return None;
    }
    let modified = fs::metadata(&config_path).ok()?.modified().ok();

    let metadata = load_metadata(&config_path).ok();
    Some(ConfigCandidate {
        folder: folder.to_path_buf(),
        last_write_utc: modified.map(DateTime::<Utc>::from).unwrap_or_default(),
        is_valid: metadata.is_some(),
        is_fresh: metadata.is_some_and(|m| m.is_fresh),
        recent_count: metadata.map_or(0, |m| m.recent_count),
        bound_shortcut_count: metadata.map_or(0, |m| m.bound_shortcut_count),
        save_state_count: count_files(&folder.join(SAVE_STATES_DIR)),
        save_file_count: count_files(&folder.join(SAVES_DIR)),
    })
}

/// Keep only parseable candidates when there are any, then sort best first.
pub fn rank_candidates(candidates: Vec<ConfigCandidate>) -> Vec<ConfigCandidate> {
    let mut selection = if candidates.iter().any(|c| c.is_valid) {
        candidates.into_iter().filter(|c| c.is_valid).collect()
    } else {
        candidates
    };
    selection.sort_by(ConfigCandidate::priority_cmp);
    selection
}

pub fn select_best(candidates: Vec<ConfigCandidate>) -> Option<ConfigCandidate> {
    rank_candidates(candidates).into_iter().next()
}

/// Score every distinct folder that has a settings file
pub fn score_folders(folders: &[PathBuf]) -> Vec<ConfigCandidate> {
    dedup_paths(folders.iter().cloned())
        .iter()
        .filter_map(|folder| score_candidate(folder))
        .collect()
}

/// Best folder among `folders`, or `None` when none has a settings file
pub fn select_best_config_folder(folders: &[PathBuf]) -> Option<PathBuf> {
    select_best(score_folders(folders)).map(|c| c.folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{KeyCombination, RecentItem, ShortcutKeyInfo};
    use chrono::TimeZone;
    use std::time::{Duration, SystemTime};

    fn candidate(name: &str) -> ConfigCandidate {
        ConfigCandidate {
            folder: PathBuf::from(name),
            last_write_utc: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            is_valid: true,
            is_fresh: false,
            recent_count: 0,
            bound_shortcut_count: 0,
            save_state_count: 0,
            save_file_count: 0,
        }
    }

    fn touch(path: &Path, secs_after_epoch: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
            .unwrap();
    }

    fn write_files(dir: &Path, count: usize) {
        fs::create_dir_all(dir).unwrap();
        for i in 0..count {
            fs::write(dir.join(format!("file{}.bin", i)), b"x").unwrap();
        }
    }

    #[test]
    fn test_save_states_beat_newer_recent_activity() {
        let mut a = candidate("A");
        a.save_state_count = 5;
        a.last_write_utc = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();

        let mut b = candidate("B");
        b.recent_count = 3;
        b.last_write_utc = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let best = select_best(vec![b, a]).unwrap();
        assert_eq!(best.folder, PathBuf::from("A"));
    }

    #[test]
    fn test_tiers_in_order() {
        let mut saves = candidate("saves");
        saves.save_file_count = 1;
        let mut recent = candidate("recent");
        recent.recent_count = 50;
        recent.bound_shortcut_count = 50;
        let mut shortcuts = candidate("shortcuts");
        shortcuts.bound_shortcut_count = 2;
        let mut fresh = candidate("fresh");
        fresh.is_fresh = true;
        fresh.last_write_utc = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let plain = candidate("plain");

        let ranked = rank_candidates(vec![
            fresh.clone(),
            plain.clone(),
            shortcuts.clone(),
            recent.clone(),
            saves.clone(),
        ]);
        let order: Vec<_> = ranked.iter().map(|c| c.folder.clone()).collect();
        assert_eq!(
            order,
            vec![
                saves.folder,
                recent.folder,
                shortcuts.folder,
                plain.folder,
                fresh.folder
            ]
        );
    }

    #[test]
    fn test_more_save_states_wins_within_tier() {
        let mut few = candidate("few");
        few.save_state_count = 2;
        few.save_file_count = 40;
        let mut many = candidate("many");
        many.save_state_count = 3;

        assert_eq!(select_best(vec![few, many]).unwrap().folder, PathBuf::from("many"));
    }

    #[test]
    fn test_equal_signals_prefer_newest() {
        let mut old = candidate("old");
        old.recent_count = 1;
        let mut new = candidate("new");
        new.recent_count = 1;
        new.last_write_utc = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(select_best(vec![old, new]).unwrap().folder, PathBuf::from("new"));
    }

    #[test]
    fn test_invalid_candidates_only_when_nothing_parses() {
        let mut broken = candidate("broken");
        broken.is_valid = false;
        broken.save_state_count = 100;
        let valid = candidate("valid");

        assert_eq!(
            select_best(vec![broken.clone(), valid]).unwrap().folder,
            PathBuf::from("valid")
        );
        assert_eq!(select_best(vec![broken]).unwrap().folder, PathBuf::from("broken"));
    }

    #[test]
    fn test_empty_selection_is_none() {
        assert!(select_best(Vec::new()).is_none());
        assert!(select_best_config_folder(&[]).is_none());
    }

    #[test]
    fn test_count_files_recurses_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir.path().join("SaveStates"), 2);
        write_files(&dir.path().join("SaveStates").join("Snes"), 3);

        assert_eq!(count_files(&dir.path().join("SaveStates")), 5);
        assert_eq!(count_files(&dir.path().join("missing")), 0);
    }

    #[test]
    fn test_score_candidate_reads_signals() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Hemu");

        let mut config = Configuration::default();
        config.recent_files.items.push(RecentItem {
            path: "a.nes".into(),
            patch_path: None,
        });
        config.preferences.shortcut_keys = vec![
            ShortcutKeyInfo {
                shortcut: "Pause".into(),
                key_combination: Some(KeyCombination::single(0x13)),
                key_combination2: None,
            },
            ShortcutKeyInfo {
                shortcut: "Reset".into(),
                key_combination: Some(KeyCombination::default()),
                key_combination2: None,
            },
        ];
        config.save(&settings_path(&folder)).unwrap();
        write_files(&folder.join("SaveStates"), 4);
        write_files(&folder.join("Saves"), 1);

        let scored = score_candidate(&folder).expect("settings file exists");
        assert!(scored.is_valid);
        assert!(!scored.is_fresh);
        assert_eq!(scored.recent_count, 1);
        assert_eq!(scored.bound_shortcut_count, 1);
        assert_eq!(scored.save_state_count, 4);
        assert_eq!(scored.save_file_count, 1);
    }

    #[test]
    fn test_score_candidate_marks_unparseable_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(settings_path(dir.path()), "garbage").unwrap();

        let scored = score_candidate(dir.path()).unwrap();
        assert!(!scored.is_valid);
        assert!(!scored.is_fresh);
        assert!(score_candidate(&dir.path().join("nothing")).is_none());
    }

    #[test]
    fn test_settings_directory_is_not_a_candidate() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(settings_path(dir.path())).unwrap();
        write_files(&dir.path().join("SaveStates"), 3);

        assert!(score_candidate(dir.path()).is_none());
        assert!(select_best_config_folder(&[dir.path().to_path_buf()]).is_none());
    }

    #[test]
    fn test_select_folder_by_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let older = dir.path().join("older");
        let newer = dir.path().join("newer");
        for folder in [&older, &newer] {
            Configuration::create_default()
                .save(&settings_path(folder))
                .unwrap();
        }
        touch(&settings_path(&older), 1_000_000);
        touch(&settings_path(&newer), 2_000_000);

        let folders = vec![older.clone(), newer.clone()];
        assert_eq!(select_best_config_folder(&folders), Some(newer.clone()));
        // same inputs, same answer
        assert_eq!(select_best_config_folder(&folders), Some(newer));
    }

    #[test]
    fn test_duplicate_folders_scored_once() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Hemu");
        Configuration::create_default()
            .save(&settings_path(&folder))
            .unwrap();

        let scored = score_folders(&[folder.clone(), folder.clone()]);
        assert_eq!(scored.len(), 1);
    }
}
