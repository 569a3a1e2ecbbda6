use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("quill")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct QuillConfig {
    pub data_directory: PathBuf,
    pub debug_logging: bool,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            debug_logging: false,
        }
    }
}

impl QuillConfig {
    /// `~/.config/quill/config.json`, when a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("quill").join("config.json"))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.data_directory.join("notes")
    }

    pub fn folders_path(&self) -> PathBuf {
        self.data_directory.join("folders.org")
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_directory.join("tasks.org")
    }

    /// Id counters of the org store.
    pub fn ids_path(&self) -> PathBuf {
        self.data_directory.join("ids.json")
    }

    pub fn widgets_dir(&self) -> PathBuf {
        self.data_directory.join("widgets")
    }

    /// Ensure the data directories and list files exist.
    pub fn ensure_files(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.notes_dir())?;
        std::fs::create_dir_all(self.widgets_dir())?;

        let files = [
            (self.folders_path(), "Folders"),
            (self.tasks_path(), "Tasks"),
        ];
        for (path, title) in &files {
            if !path.exists() {
                std::fs::write(path, format!("#+TITLE: {}\n\n", title))?;
            }
        }

        Ok(())
    }
}
