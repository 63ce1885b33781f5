use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;

const DB_FILE_NAME: &str = "homekeep.sqlite3";
const ENV_DATA_DIR: &str = "HOMEKEEP_DATA_DIR";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("app", "homekeep", "homekeep"));

/// Where the data directory came from, in order of precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirSource {
    Flag,
    Environment,
    Workspace,
    Platform,
    Home,
}

impl fmt::Display for DataDirSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataDirSource::Flag => "--data-dir",
            DataDirSource::Environment => ENV_DATA_DIR,
            DataDirSource::Workspace => "workspace dev dir",
            DataDirSource::Platform => "platform data dir",
            DataDirSource::Home => "home dir",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    db_path: PathBuf,
    source: DataDirSource,
}

impl AppConfig {
    /// Resolve the data directory, create it if needed and place the
    /// database file inside it.
    pub fn discover(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let (data_dir, source) = resolve_data_dir(data_dir_override)?;
        fs::create_dir_all(&data_dir).with_context(|| {
            format!(
                "Failed to create data directory at {} (from {})",
                data_dir.display(),
                source
            )
        })?;
        tracing::debug!(data_dir = %data_dir.display(), %source, "resolved data directory");

        let mut config = Self::from_data_dir(data_dir)?;
        config.source = source;
        Ok(config)
    }

    /// Use an already resolved directory as is.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        let db_path = data_dir.join(DB_FILE_NAME);
        Ok(Self {
            data_dir,
            db_path,
            source: DataDirSource::Flag,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn source(&self) -> DataDirSource {
        self.source
    }
}

fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> Result<(PathBuf, DataDirSource)> {
    if let Some(dir) = data_dir_override {
        return Ok((dir, DataDirSource::Flag));
    }

    if let Some(dir) = env::var_os(ENV_DATA_DIR).filter(|value| !value.is_empty()) {
        return Ok((PathBuf::from(dir), DataDirSource::Environment));
    }

    // Debug builds keep their data next to the workspace, away from real homes.
    if cfg!(debug_assertions) {
        return Ok((workspace_dev_dir(), DataDirSource::Workspace));
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok((project.data_dir().to_path_buf(), DataDirSource::Platform));
    }

    let home = match BaseDirs::new() {
        Some(base) => base.home_dir().to_path_buf(),
        None => env::current_dir()?,
    };
    Ok((home.join(".homekeep"), DataDirSource::Home))
}

/// `<workspace>/target/dev-data`, two levels above this crate's manifest.
fn workspace_dev_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("target")
        .join("dev-data")
}
