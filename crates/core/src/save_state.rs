use crate::error::ConfigError;
use crate::logging::{log, LogCategory, LogLevel};
use std::fs;
use std::path::{Path, PathBuf};

/// Save state file extension
pub const SAVE_STATE_EXTENSION: &str = "hss";

/// Recent game snapshot extension
pub const RECENT_GAME_EXTENSION: &str = "rgd";

pub const LABEL_EXTENSION: &str = "label";

/// Slot count used when the core does not report one
pub const DEFAULT_MAX_SLOTS: u32 = 20;

/// ROM currently loaded, as far as file naming is concerned
#[derive(Debug, Clone, Default)]
pub struct LoadedGame {
    pub rom_path: PathBuf,
    pub patch_path: Option<PathBuf>,
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty())
}

impl LoadedGame {
    pub fn new(rom_path: impl Into<PathBuf>, patch_path: Option<PathBuf>) -> Self {
        Self {
            rom_path: rom_path.into(),
            patch_path,
        }
    }

    /// ROM file name without extension, "rom" when there is none
    pub fn rom_name(&self) -> String {
        file_stem(&self.rom_path).unwrap_or_else(|| "rom".to_string())
    }

    /// `<rom>` or `<rom>_<patch>` when states are kept apart per patch
    pub fn base_name(&self, separate_by_patch: bool) -> String {
        let rom_name = self.rom_name();
        if !separate_by_patch {
            return rom_name;
        }

        match self.patch_path.as_deref().and_then(file_stem) {
            Some(patch) if !patch.eq_ignore_ascii_case(&rom_name) => {
                format!("{}_{}", rom_name, patch)
            }
            _ => rom_name,
        }
    }

    /// `<folder>/<base>_<slot>.hss`
    pub fn slot_path(&self, folder: &Path, slot: u32, separate_by_patch: bool) -> PathBuf {
        folder.join(format!(
            "{}_{}.{}",
            self.base_name(separate_by_patch),
            slot,
            SAVE_STATE_EXTENSION
        ))
    }

    /// Recent-game file for this game. A patched game falls back to the
    /// unpatched file until a patch-specific one exists.
    pub fn recent_game_path(&self, folder: &Path, separate_by_patch: bool) -> PathBuf {
        let primary = folder.join(format!(
            "{}.{}",
            self.base_name(separate_by_patch),
            RECENT_GAME_EXTENSION
        ));
        if !separate_by_patch || self.patch_path.is_none() || primary.is_file() {
            return primary;
        }
        folder.join(format!("{}.{}", self.rom_name(), RECENT_GAME_EXTENSION))
    }
}

/// Slot count reported by the core, or [`DEFAULT_MAX_SLOTS`] for zero
pub fn max_slots(reported: u32) -> u32 {
    if reported > 0 {
        reported
    } else {
        DEFAULT_MAX_SLOTS
    }
}

/// Auto-save slot, one past the last manual slot
pub fn auto_slot(reported: u32) -> u32 {
    max_slots(reported).saturating_add(1)
}

pub fn label_path(state_path: &Path) -> PathBuf {
    let mut name = state_path.as_os_str().to_os_string();
    name.push(".");
    name.push(LABEL_EXTENSION);
    PathBuf::from(name)
}

/// User label of a save state. Missing, blank and unreadable labels read as `None`.
pub fn read_label(state_path: &Path) -> Option<String> {
    let path = label_path(state_path);
    match fs::read_to_string(&path) {
        Ok(text) => {
            let label = text.trim();
            (!label.is_empty()).then(|| label.to_string())
        }
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log(LogCategory::Config, LogLevel::Debug, || {
                    format!("Could not read label {}: {}", path.display(), e)
                });
            }
            None
        }
    }
}

/// Store a trimmed label next to the state; a blank label removes the file.
pub fn write_label(state_path: &Path, label: Option<&str>) -> Result<(), ConfigError> {
    let path = label_path(state_path);
    let label = label.map(str::trim).unwrap_or_default();

    if label.is_empty() {
        return match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::io(path, e)),
        };
    }
    fs::write(&path, label).map_err(|e| ConfigError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        let plain = LoadedGame::new("/roms/Zelda.sfc", None);
        assert_eq!(plain.base_name(true), "Zelda");

        let patched = LoadedGame::new("/roms/Zelda.sfc", Some("/patches/Randomizer.bps".into()));
        assert_eq!(patched.base_name(false), "Zelda");
        assert_eq!(patched.base_name(true), "Zelda_Randomizer");

        let same_name = LoadedGame::new("/roms/Zelda.sfc", Some("/patches/zelda.ips".into()));
        assert_eq!(same_name.base_name(true), "Zelda");

        let unnamed = LoadedGame::new("", None);
        assert_eq!(unnamed.base_name(true), "rom");
    }

    #[test]
    fn test_slot_path() {
        let game = LoadedGame::new("/roms/Metroid.nes", Some("/p/Hack.ips".into()));
        let folder = Path::new("/home/SaveStates");
        assert_eq!(
            game.slot_path(folder, 3, true),
            folder.join("Metroid_Hack_3.hss")
        );
        assert_eq!(game.slot_path(folder, 21, false), folder.join("Metroid_21.hss"));
    }

    #[test]
    fn test_recent_game_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let game = LoadedGame::new("/roms/Metroid.nes", Some("/p/Hack.ips".into()));

        assert_eq!(
            game.recent_game_path(dir.path(), true),
            dir.path().join("Metroid.rgd")
        );

        fs::write(dir.path().join("Metroid_Hack.rgd"), b"state").unwrap();
        assert_eq!(
            game.recent_game_path(dir.path(), true),
            dir.path().join("Metroid_Hack.rgd")
        );
        assert_eq!(
            game.recent_game_path(dir.path(), false),
            dir.path().join("Metroid.rgd")
        );
    }

    #[test]
    fn test_slots() {
        assert_eq!(max_slots(0), 20);
        assert_eq!(max_slots(10), 10);
        assert_eq!(auto_slot(0), 21);
        assert_eq!(auto_slot(10), 11);
        assert_eq!(auto_slot(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_labels() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("Metroid_1.hss");
        assert_eq!(label_path(&state), dir.path().join("Metroid_1.hss.label"));

        assert_eq!(read_label(&state), None);

        write_label(&state, Some("  before boss \n")).unwrap();
        assert_eq!(read_label(&state).as_deref(), Some("before boss"));

        write_label(&state, Some("   ")).unwrap();
        assert!(!label_path(&state).exists());
        assert_eq!(read_label(&state), None);

        // clearing twice is fine
        write_label(&state, None).unwrap();
    }
}
