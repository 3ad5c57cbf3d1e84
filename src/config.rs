use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Display refresh period
    pub tick_interval_ms: u64,
    /// Pause before retrying after a failed detection cycle
    pub detection_retry_ms: u64,
    /// Frame cadence of the simulated camera
    pub frame_interval_ms: u64,
    /// Pause/resume the stopwatch on focus transitions
    pub auto_pause: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            detection_retry_ms: 1000,
            frame_interval_ms: 100,
            auto_pause: true,
        }
    }
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn detection_retry(&self) -> Duration {
        Duration::from_millis(self.detection_retry_ms.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Platform directories for config and state files.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "focuswatch")
}

/// Where the TUI writes its log; stdout belongs to the terminal UI.
/// Prefers the state dir (`~/.local/state/focuswatch` on Linux).
pub fn log_path() -> Option<PathBuf> {
    project_dirs().map(|pd| {
        pd.state_dir()
            .unwrap_or_else(|| pd.data_local_dir())
            .join("focuswatch.log")
    })
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = project_dirs() {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("focuswatch_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
