use crate::ai::ModelConfig;
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "STUDY_DECK_DATA_DIR";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const MODEL_ENV: &str = "STUDY_DECK_MODEL";

/// Credentials and model settings handed to the AI generator.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub ai: Option<AiConfig>,
}

fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| "C:\\Users\\User".to_string());
        PathBuf::from(home).join(".local\\share\\study-deck")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/home/user".to_string());
        PathBuf::from(home).join(".local/share/study-deck")
    }
}

impl AppConfig {
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            log_file: data_dir.join(crate::logger::DEFAULT_LOG_FILE),
            data_dir,
            ai: None,
        }
    }

    pub fn from_env() -> Self {
        let data_dir = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let ai = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| {
                let mut model = ModelConfig::default();
                if let Ok(name) = std::env::var(MODEL_ENV) {
                    model.model = name;
                }
                AiConfig { api_key, model }
            });

        Self {
            ai,
            ..Self::with_data_dir(data_dir)
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("study-deck.db")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.data_dir.join("pdfs")
    }
}
