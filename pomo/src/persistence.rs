use crate::app::App;
use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Persistence;

impl Persistence {
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "pabloagn", "pomo")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        let data_dir = proj_dirs.data_dir();
        fs::create_dir_all(data_dir)?;

        Ok(data_dir.to_path_buf())
    }

    fn state_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("state.json"))
    }

    pub fn update_state_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("update.json"))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("pomo.log"))
    }

    pub fn save(app: &App) -> Result<()> {
        Self::save_to(app, &Self::state_path()?)
    }

    pub fn load() -> Result<Option<App>> {
        Self::load_from(&Self::state_path()?)
    }

    pub fn save_to(app: &App, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(app)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Option<App>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path)?;
        let app: App = serde_json::from_str(&json)?;
        Ok(Some(app))
    }
}
