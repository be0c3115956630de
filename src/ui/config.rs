use serde::{Deserialize, Serialize};

use crate::{analysis::consistency::DEFAULT_ROLLING_WINDOW, errors::LapDeltaError, openf1};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub rolling_window: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: openf1::DEFAULT_BASE_URL.to_string(),
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

impl AppConfig {
    pub fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?.join("lapdelta").join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            serde_json::from_reader(file).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<(), LapDeltaError> {
        let config_path = dirs::config_dir()
            .ok_or(LapDeltaError::NoConfigDir)?
            .join("lapdelta")
            .join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LapDeltaError::ConfigIOError { source: e })?;
            }
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| LapDeltaError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| LapDeltaError::ConfigSerializeError { source: e })
    }
}
