//! Temp-dir backed [`PlatformFolders`] for unit tests.

use super::platform::{OsFamily, PlatformFolders};
use crate::settings::{Configuration, SETTINGS_FILE_NAME};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeFolders {
    dir: TempDir,
    pub os: OsFamily,
    pub exe: Option<PathBuf>,
    pub documents: Option<PathBuf>,
    pub app_data: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl FakeFolders {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Self {
            os: OsFamily::Linux,
            exe: Some(root.join("exe")),
            documents: Some(root.join("documents")),
            app_data: Some(root.join("appdata")),
            home: Some(root.join("home")),
            env: HashMap::new(),
            dir,
        }
    }

    pub fn with_os(mut self, os: OsFamily) -> Self {
        self.os = os;
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_settings(&self, folder: &Path, json: &str) {
        fs::create_dir_all(folder).unwrap();
        fs::write(folder.join(SETTINGS_FILE_NAME), json).unwrap();
    }

    pub fn write_config(&self, folder: &Path, config: &Configuration) {
        config.save(&folder.join(SETTINGS_FILE_NAME)).unwrap();
    }
}

impl PlatformFolders for FakeFolders {
    fn os(&self) -> OsFamily {
        self.os
    }

    fn exe_dir(&self) -> Option<PathBuf> {
        self.exe.clone()
    }

    fn documents_dir(&self) -> Option<PathBuf> {
        self.documents.clone()
    }

    fn app_data_dir(&self) -> Option<PathBuf> {
        self.app_data.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }
}
