use crate::error::{Result, SerpscopeError};

/// Model candidates tried in order by the synthesis stage.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-flash-latest",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash",
    "gemini-2.5-flash",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Search
    pub serper_api_key: String,
    pub search_gl: String,
    pub search_hl: String,
    pub search_num: u32,

    // AI
    pub gemini_api_key: String,
    pub gemini_models: Vec<String>,

    // Notion
    pub notion_token: String,
    /// Checked at the start of every run rather than at startup, so the UI
    /// can still report the problem.
    pub notion_database_id: Option<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if
    /// present). Missing required keys are configuration errors.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                SerpscopeError::Config(format!("{key} environment variable is required"))
            })
        };

        let gemini_api_key = get("GOOGLE_GENERATIVE_AI_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or_else(|| {
                SerpscopeError::Config(
                    "GOOGLE_GENERATIVE_AI_API_KEY or GEMINI_API_KEY environment variable is required"
                        .to_string(),
                )
            })?;

        let gemini_models = match get("GEMINI_MODELS") {
            Some(list) => {
                let models: Vec<String> = list
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if models.is_empty() {
                    return Err(SerpscopeError::Config(
                        "GEMINI_MODELS must list at least one model".to_string(),
                    ));
                }
                models
            }
            None => DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        Ok(Self {
            serper_api_key: required("SERPER_API_KEY")?,
            search_gl: get("SEARCH_GL").unwrap_or_else(|| "jp".to_string()),
            search_hl: get("SEARCH_HL").unwrap_or_else(|| "ja".to_string()),
            search_num: parse_or("SEARCH_NUM", get("SEARCH_NUM"), 10)?,
            gemini_api_key,
            gemini_models,
            notion_token: required("NOTION_TOKEN")?,
            notion_database_id: get("NOTION_DATABASE_ID"),
            web_host: get("WEB_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            web_port: parse_or("WEB_PORT", get("WEB_PORT"), 3000)?,
        })
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(5);
            let head: String = val.chars().take(n).collect();
            format!("{}...({} chars)", head, val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SERPER_API_KEY: {}", preview(&self.serper_api_key));
        tracing::info!("  GEMINI_API_KEY: {}", preview(&self.gemini_api_key));
        tracing::info!("  NOTION_TOKEN: {}", preview(&self.notion_token));
        tracing::info!(
            "  NOTION_DATABASE_ID: {}",
            self.notion_database_id
                .as_deref()
                .map(preview)
                .unwrap_or_else(|| "<not set>".to_string())
        );
        tracing::info!("  GEMINI_MODELS: {}", self.gemini_models.join(","));
        tracing::info!(
            "  search locale: gl={} hl={} num={}",
            self.search_gl,
            self.search_hl,
            self.search_num
        );
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| SerpscopeError::Config(format!("{key} must be a number, got {v:?}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("SERPER_API_KEY", "serper-key"),
        ("GEMINI_API_KEY", "gemini-key"),
        ("NOTION_TOKEN", "secret_notion"),
    ];

    #[test]
    fn defaults_applied() {
        let config = Config::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.search_gl, "jp");
        assert_eq!(config.search_hl, "ja");
        assert_eq!(config.search_num, 10);
        assert_eq!(config.web_host, "127.0.0.1");
        assert_eq!(config.web_port, 3000);
        assert_eq!(config.gemini_models.len(), DEFAULT_GEMINI_MODELS.len());
        assert_eq!(config.gemini_models[0], "gemini-flash-latest");
        assert!(config.notion_database_id.is_none());
    }

    #[test]
    fn google_key_preferred_over_gemini_key() {
        let mut pairs = BASE.to_vec();
        pairs.push(("GOOGLE_GENERATIVE_AI_API_KEY", "google-key"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.gemini_api_key, "google-key");
    }

    #[test]
    fn missing_serper_key_is_config_error() {
        let pairs: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != "SERPER_API_KEY")
            .collect();
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, SerpscopeError::Config(_)));
        assert!(err.to_string().contains("SERPER_API_KEY"));
    }

    #[test]
    fn missing_model_key_is_config_error() {
        let pairs: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != "GEMINI_API_KEY")
            .collect();
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn blank_database_id_counts_as_unset() {
        let mut pairs = BASE.to_vec();
        pairs.push(("NOTION_DATABASE_ID", "   "));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.notion_database_id.is_none());
    }

    #[test]
    fn model_list_override() {
        let mut pairs = BASE.to_vec();
        pairs.push(("GEMINI_MODELS", "a, b ,,c"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.gemini_models, vec!["a", "b", "c"]);
    }

    #[test]
    fn bad_port_is_config_error() {
        let mut pairs = BASE.to_vec();
        pairs.push(("WEB_PORT", "http"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("WEB_PORT"));
    }
}
