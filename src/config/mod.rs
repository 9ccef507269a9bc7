use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.yaml";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone)]
pub struct Settings {
    // Server layout
    pub srv_dir: PathBuf,
    pub config_file: PathBuf,

    // Logging
    pub log_level: String,
}

impl Settings {
    pub fn new() -> Self {
        let mut settings = Self::for_srv_dir(Path::new(&get_env("SRV_DIR", ".")));
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            settings.config_file = PathBuf::from(config_file);
        }
        settings.log_level = get_env("LOG_LEVEL", DEFAULT_LOG_LEVEL);
        settings
    }

    /// Default layout rooted at `srv_dir`, ignoring the environment
    pub fn for_srv_dir(srv_dir: &Path) -> Self {
        Settings {
            srv_dir: srv_dir.to_path_buf(),
            config_file: srv_dir.join(CONFIG_FILE_NAME),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Directory holding the server's own key material
    pub fn keys_dir(&self) -> PathBuf {
        self.srv_dir.join("keys")
    }

    /// Directory holding the key material handed to openresty
    pub fn openresty_keys_dir(&self) -> PathBuf {
        self.srv_dir.join("openresty").join("keys")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::new);

pub fn get_settings() -> &'static Settings {
    &SETTINGS
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
