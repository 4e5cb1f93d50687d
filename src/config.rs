//! Configuration - environment-driven settings
//!
//! Everything is read from the process environment, after an optional
//! `.env` file has been loaded by `main`. Missing API keys are not an error
//! here; only the adapter that needs a key fails when it is absent.

use std::path::PathBuf;

use anyhow::Result;

// ============================================================================
// Environment Keys
// ============================================================================

pub const ENV_DATA_DIR: &str = "AGRI_DATA_DIR";
pub const ENV_NEWS_CSV: &str = "AGRI_NEWS_CSV";
pub const ENV_INDEX_DIR: &str = "AGRI_INDEX_DIR";
pub const ENV_LABELS: &str = "AGRI_LABELS";
pub const ENV_MODEL_URL: &str = "AGRI_MODEL_URL";
pub const ENV_INFECTED_INDICES: &str = "AGRI_INFECTED_INDICES";
pub const ENV_GROQ_MODEL: &str = "GROQ_MODEL";

/// Embedding key lookup order
const GEMINI_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
const GROQ_KEY_VAR: &str = "GROQ_API_KEY";

/// TensorFlow Serving REST endpoint for the exported Keras model
pub const DEFAULT_MODEL_URL: &str = "http://localhost:8501/v1/models/crop_disease:predict";

/// Default Groq chat model
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

// ============================================================================
// Data Directory
// ============================================================================

/// Data directory (`AGRI_DATA_DIR` or `<local data dir>/krishi-sahayak`)
pub fn get_data_dir() -> PathBuf {
    data_dir_from(non_empty_var(ENV_DATA_DIR))
}

fn data_dir_from(override_dir: Option<String>) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }

    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("krishi-sahayak")
}

// ============================================================================
// AppConfig
// ============================================================================

/// Resolved application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// News feed CSV (`Link,Title,Desc`)
    pub news_csv: PathBuf,
    /// LanceDB directory holding the scheme/agri knowledge index
    pub index_dir: PathBuf,
    /// Label file, one class per line
    pub labels_path: PathBuf,
    pub model_url: String,
    /// Explicit infected class indices; `None` derives them from labels
    pub infected_indices: Option<Vec<usize>>,
    pub groq_model: String,
    /// Embedding key (`GEMINI_API_KEY` > `GOOGLE_API_KEY`)
    pub gemini_api_key: Option<String>,
    /// LLM key (`GROQ_API_KEY`)
    pub groq_api_key: Option<String>,
}

impl AppConfig {
    /// Read settings from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let data_dir = get_data_dir();

        let news_csv = non_empty_var(ENV_NEWS_CSV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("agriculture_news.csv"));

        let index_dir = non_empty_var(ENV_INDEX_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("faiss_index.lance"));

        let labels_path = non_empty_var(ENV_LABELS)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("model").join("labels.txt"));

        let model_url =
            non_empty_var(ENV_MODEL_URL).unwrap_or_else(|| DEFAULT_MODEL_URL.to_string());

        let infected_indices = match non_empty_var(ENV_INFECTED_INDICES) {
            Some(raw) => Some(parse_index_list(&raw)?),
            None => None,
        };

        let groq_model =
            non_empty_var(ENV_GROQ_MODEL).unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string());

        let gemini_api_key = GEMINI_KEY_VARS.iter().find_map(|var| {
            let key = non_empty_var(var)?;
            tracing::debug!("Using embedding key from {}", var);
            Some(key)
        });

        Ok(Self {
            data_dir,
            news_csv,
            index_dir,
            labels_path,
            model_url,
            infected_indices,
            groq_model,
            gemini_api_key,
            groq_api_key: non_empty_var(GROQ_KEY_VAR),
        })
    }

    /// Embedding key, or setup instructions when it is missing
    pub fn require_gemini_key(&self) -> Result<&str> {
        match self.gemini_api_key.as_deref() {
            Some(key) => Ok(key),
            None => anyhow::bail!(
                "Embedding API key is not set.\n\
                 Setup: export GEMINI_API_KEY=your-key"
            ),
        }
    }

    /// LLM key, or setup instructions when it is missing
    pub fn require_groq_key(&self) -> Result<&str> {
        match self.groq_api_key.as_deref() {
            Some(key) => Ok(key),
            None => anyhow::bail!(
                "LLM API key is not set.\n\
                 Setup: export GROQ_API_KEY=your-key"
            ),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma separated index list such as `0,3,5,6`
pub fn parse_index_list(raw: &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| anyhow::anyhow!("Invalid class index '{}': {}", s, e))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_list() {
        assert_eq!(parse_index_list("0,3,5,6").unwrap(), vec![0, 3, 5, 6]);
        assert_eq!(parse_index_list(" 1 , 2 ,").unwrap(), vec![1, 2]);
        assert!(parse_index_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_index_list_invalid() {
        let err = parse_index_list("0,x").unwrap_err();
        assert!(err.to_string().contains("Invalid class index"));
    }

    #[test]
    fn test_data_dir_default_and_override() {
        assert!(data_dir_from(None).ends_with("krishi-sahayak"));
        assert_eq!(
            data_dir_from(Some("/srv/agri".to_string())),
            PathBuf::from("/srv/agri")
        );
    }

    fn keyless() -> AppConfig {
        AppConfig {
            data_dir: PathBuf::from("data"),
            news_csv: PathBuf::from("data/news.csv"),
            index_dir: PathBuf::from("data/index.lance"),
            labels_path: PathBuf::from("data/labels.txt"),
            model_url: DEFAULT_MODEL_URL.to_string(),
            infected_indices: None,
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            gemini_api_key: None,
            groq_api_key: None,
        }
    }

    #[test]
    fn test_missing_keys_give_setup_hints() {
        let config = keyless();
        let err = config.require_gemini_key().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
        let err = config.require_groq_key().unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_present_keys() {
        let config = AppConfig {
            gemini_api_key: Some("g".to_string()),
            groq_api_key: Some("q".to_string()),
            ..keyless()
        };
        assert_eq!(config.require_gemini_key().unwrap(), "g");
        assert_eq!(config.require_groq_key().unwrap(), "q");
    }
}
