use std::path::PathBuf;
use std::sync::OnceLock;

static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

pub struct PathManager;

impl PathManager {
    /// Set a custom data directory. Only the first call has an effect.
    pub fn set_data_dir(path: PathBuf) {
        let _ = DATA_DIR_OVERRIDE.set(path);
    }

    pub fn data_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        dirs::data_dir().map(|d| d.join("fedcat"))
    }

    pub fn config_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        dirs::config_dir().map(|d| d.join("fedcat"))
    }

    /// Default catalog database
    pub fn db_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("fedcat.db"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("logs"))
    }

    pub fn ensure_dirs_exist() -> std::io::Result<()> {
        for dir in [Self::data_dir(), Self::config_dir(), Self::logs_dir()]
            .into_iter()
            .flatten()
        {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
