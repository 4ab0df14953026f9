use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "tatsumakeeb";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Best-score file under $HOME/.local/state, falling back to the platform data dir
    pub fn score_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join("score.json"))
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().join("score.json"))
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}
