use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const SETTINGS_DIR: &str = ".waypoint";
const SETTINGS_FILE: &str = "setting.json";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Database the board lives in; falls back to `WAYPOINT_DB` or the
    /// home-directory default when absent.
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Settings {
    /// Reads `.waypoint/setting.json` from `std::env::current_dir()`.
    /// Missing or malformed files fall back to defaults; a broken settings
    /// file should never keep the board from opening.
    pub fn load() -> Self {
        std::env::current_dir()
            .ok()
            .map(|cwd| Self::load_from(&cwd))
            .unwrap_or_default()
    }

    fn load_from(dir: &Path) -> Self {
        fs::read_to_string(Self::path_in(dir))
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    /// Returns the path to the settings file relative to a given directory.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_DIR).join(SETTINGS_FILE)
    }

    pub fn exists_in(dir: &Path) -> bool {
        Self::path_in(dir).exists()
    }

    /// Write settings to a specific directory (used by `waypoint init`).
    pub fn save_to(dir: &Path, db_path: Option<&Path>) -> std::io::Result<()> {
        let settings_dir = dir.join(SETTINGS_DIR);
        fs::create_dir_all(&settings_dir)?;

        let settings = Settings {
            db_path: db_path.map(|p| p.display().to_string()),
        };
        let json = serde_json::to_string_pretty(&settings)
            .map_err(std::io::Error::other)?;
        fs::write(settings_dir.join(SETTINGS_FILE), json.as_bytes())
    }
}
