// ⚙️ Configuration - where the tracker keeps its data and under which storage key
// Precedence: command-line flag > environment variable > default

use crate::storage::SqliteStorage;
use crate::store::{RecordStore, DEFAULT_STORAGE_KEY};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::env;

pub const APP_NAME: &str = "life-tracker";
pub const DB_FILE: &str = "tracker.db";

/// Storage flags shared by the CLI and the API server
#[derive(Args, Debug, Clone, Default)]
pub struct StorageArgs {
    #[arg(
        long,
        env = "LIFE_TRACKER_HOME",
        help = "Data directory. By default $XDG_STATE_HOME/life-tracker or $HOME/.local/state/life-tracker"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "LIFE_TRACKER_KEY",
        help = "Storage key the record history is kept under [default: tracker_history]"
    )]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_key: String,

    /// Database file name inside `data_dir`
    pub db_file: String,
}

impl Config {
    pub fn resolve(args: &StorageArgs) -> Result<Self> {
        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {data_dir:?}"))?;

        let storage_key = args
            .key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        Ok(Self {
            data_dir,
            storage_key,
            db_file: DB_FILE.to_string(),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Open the persisted store this configuration points at
    pub fn open_store(&self) -> Result<RecordStore<SqliteStorage>> {
        let path = self.db_path();
        let storage = SqliteStorage::open(&path)
            .with_context(|| format!("Failed to open database {path:?}"))?;
        RecordStore::open(storage, self.storage_key.clone()).context("Failed to load records")
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    data_dir_from(
        env::var("XDG_STATE_HOME").ok(),
        env::var("HOME").ok(),
        env::var("APPDATA").ok(),
    )
}

fn data_dir_from(
    xdg_state_home: Option<String>,
    home: Option<String>,
    appdata: Option<String>,
) -> Result<PathBuf> {
    let base = if cfg!(windows) {
        appdata.map(PathBuf::from)
    } else {
        xdg_state_home
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home.map(|h| PathBuf::from(h).join(".local").join("state")))
    };

    base.map(|p| p.join(APP_NAME))
        .ok_or_else(|| anyhow!("Couldn't find XDG_STATE_HOME or HOME; pass --data-dir"))
}
