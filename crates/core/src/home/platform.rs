use std::path::PathBuf;

/// Environment variable that pins the home folder
pub const HOME_OVERRIDE_VAR: &str = "HEMU_HOME";

/// Operating-system family, as far as folder conventions are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
}

impl OsFamily {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }
}

/// Source of the well-known folders the resolver looks at.
///
/// Every lookup may fail; `None` means "not available" and the caller moves on.
pub trait PlatformFolders {
    fn os(&self) -> OsFamily;

    /// Folder containing the running executable
    fn exe_dir(&self) -> Option<PathBuf>;

    /// "My Documents"-style folder
    fn documents_dir(&self) -> Option<PathBuf>;

    /// Roaming application-data / XDG config folder
    fn app_data_dir(&self) -> Option<PathBuf>;

    /// User profile / `$HOME`
    fn home_dir(&self) -> Option<PathBuf>;

    /// Raw value of an environment variable
    fn env_var(&self, name: &str) -> Option<String>;

    /// Non-blank value of the home override variable
    fn home_override(&self) -> Option<PathBuf> {
        self.env_var(HOME_OVERRIDE_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    }
}

/// Folders of the machine the process runs on
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFolders;

fn non_blank(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

impl PlatformFolders for SystemFolders {
    fn os(&self) -> OsFamily {
        OsFamily::current()
    }

    fn exe_dir(&self) -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    fn documents_dir(&self) -> Option<PathBuf> {
        non_blank(dirs::document_dir())
    }

    fn app_data_dir(&self) -> Option<PathBuf> {
        non_blank(dirs::config_dir())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        non_blank(dirs::home_dir())
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
