use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::pipeline::agent::types::{DEFAULT_ORG_ID, DEFAULT_USER_ID};
use crate::pipeline::safety::crisis::{load_crisis_terms, CrisisTerms};
use crate::pipeline::AgentError;

/// Application-level constants
pub const APP_NAME: &str = "Sukoon";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;
pub const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "sukoon=info,sukoon_lib=info,warn"
}

/// Get the application data directory (~/.sukoon/)
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sukoon"))
}

/// Well-known location of the operator's crisis-term list
pub fn default_crisis_terms_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("crisis_terms.txt"))
}

/// Environment-derived settings, read once at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub org_id: String,
    pub user_id: String,
    pub crisis_terms_path: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub openai_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            org_id: DEFAULT_ORG_ID.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            crisis_terms_path: None,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            openai_timeout_secs: DEFAULT_OPENAI_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            org_id: get("SUKOON_ORG_ID").unwrap_or(defaults.org_id),
            user_id: get("SUKOON_USER_ID").unwrap_or(defaults.user_id),
            crisis_terms_path: get("SUKOON_CRISIS_TERMS").map(PathBuf::from),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            embedding_model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_dim: parse_number("EMBEDDING_DIM", get("EMBEDDING_DIM"))?
                .unwrap_or(defaults.embedding_dim),
            openai_timeout_secs: parse_number("OPENAI_TIMEOUT_SECS", get("OPENAI_TIMEOUT_SECS"))?
                .unwrap_or(defaults.openai_timeout_secs),
        })
    }
}

fn parse_number<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, AgentError> {
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|_| AgentError::Configuration(format!("{key} must be a number, got '{value}'")))
    })
    .transpose()
}

/// Settings plus the loaded crisis-term set.
///
/// A snapshot is never mutated. `reload` builds a fresh one; runs already
/// holding the old `Arc<CrisisTerms>` keep using it.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub settings: Settings,
    crisis_terms: Arc<CrisisTerms>,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, AgentError> {
        Self::load(Settings::from_env()?)
    }

    /// Load the crisis-term resource named by `settings`.
    ///
    /// Without an explicit path, `~/.sukoon/crisis_terms.txt` is used when it
    /// exists; otherwise the built-in defaults.
    pub fn load(settings: Settings) -> Result<Self, AgentError> {
        let path = settings
            .crisis_terms_path
            .clone()
            .or_else(|| default_crisis_terms_path().filter(|p| p.is_file()));
        let crisis_terms = load_crisis_terms(path.as_deref())?;

        Ok(Self {
            settings,
            crisis_terms: Arc::new(crisis_terms),
        })
    }

    pub fn with_crisis_terms(settings: Settings, crisis_terms: CrisisTerms) -> Self {
        Self {
            settings,
            crisis_terms: Arc::new(crisis_terms),
        }
    }

    pub fn crisis_terms(&self) -> &Arc<CrisisTerms> {
        &self.crisis_terms
    }

    /// Re-read the crisis-term resource into a new snapshot.
    pub fn reload(&self) -> Result<Self, AgentError> {
        tracing::info!("Reloading crisis terms");
        Self::load(self.settings.clone())
    }
}
