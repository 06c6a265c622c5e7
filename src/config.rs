use crate::storage::{atomic_rename, DEFAULT_STORAGE_KEY};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub decay_interval_secs: u64,
    pub storage_key: String,
    pub fps_cap: u32,
    pub enable_color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decay_interval_secs: 15,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            fps_cap: 30,
            enable_color: true,
        }
    }
}

impl Settings {
    pub fn decay_period(&self) -> Duration {
        Duration::from_secs(self.decay_interval_secs.max(1))
    }
}

/// Per-run adjustments from the command line. Never written back to disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub decay_interval_secs: Option<u64>,
    pub no_color: bool,
}

impl Overrides {
    /// The settings this run should use, leaving `saved` as it was loaded.
    pub fn apply(&self, saved: &Settings) -> Settings {
        let mut effective = saved.clone();
        if let Some(secs) = self.decay_interval_secs {
            effective.decay_interval_secs = secs;
        }
        if self.no_color {
            effective.enable_color = false;
        }
        effective
    }
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

impl Paths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let data_dir = dir.into();
        Self {
            settings_path: data_dir.join("settings.json"),
            log_path: data_dir.join("octopus.log"),
            data_dir,
        }
    }
}

/// Resolves the data directory, honouring an explicit override.
pub fn project_paths(data_dir: Option<PathBuf>) -> Result<Paths> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => ProjectDirs::from("com", "octopus", "Octopus")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data directory {}", dir.display()))?;
    Ok(Paths::in_dir(dir))
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
    }
    Settings::default()
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
