use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "newsletter_digest";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";
pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
pub const DEFAULT_LLM_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub client_id: String,
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cleaner: CleanerConfig,
    pub csv_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GmailConfig {
    pub api_base: String,
    pub max_results: u32,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GMAIL_API_BASE.to_string(),
            max_results: 25,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub classify_max_tokens: u32,
    pub classify_temperature: f32,
    pub rank_max_tokens: u32,
    pub rank_temperature: f32,
    pub top_n: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_LLM_API_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            classify_max_tokens: 500,
            classify_temperature: 1.0,
            rank_max_tokens: 1500,
            rank_temperature: 1.0,
            top_n: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CleanerConfig {
    /// Extra trailing-boilerplate regexes, matched from the first hit through end of text.
    pub boilerplate_patterns: Vec<String>,
}

impl Config {
    pub fn sample() -> Self {
        Self {
            client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
            user_email: Some("you@example.com".to_string()),
            redirect_uri: Some(DEFAULT_REDIRECT_URI.to_string()),
            gmail: GmailConfig::default(),
            llm: LlmConfig::default(),
            cleaner: CleanerConfig::default(),
            csv_path: Some("emails.csv".to_string()),
        }
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }

    pub fn user_email(&self) -> Result<String> {
        self.user_email
            .clone()
            .ok_or_else(|| anyhow!("user_email not set in config"))
    }

    /// Reads the LLM key from the variable named in `llm.api_key_env`.
    pub fn llm_api_key(&self) -> Result<String> {
        std::env::var(&self.llm.api_key_env)
            .map_err(|_| anyhow!("environment variable {} is not set", self.llm.api_key_env))
    }
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join(APP_DIR))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

/// Loads `credentials.env` from the working directory if there is one.
pub fn load_env_file() {
    match dotenvy::from_filename("credentials.env") {
        Ok(path) => log::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("could not read credentials.env: {e}"),
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        // create a template config for users to edit
        let tom = toml::to_string_pretty(&Config::sample())?;
        fs::write(path, tom)?;
        return Err(anyhow!(
            "Created template config at {}; edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}
