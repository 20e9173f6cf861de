use crate::host::ConfigStore;
use crate::providers::{GEMINI_API_KEY, GEMINI_MODEL, GROQ_API_KEY, GROQ_MODEL, ProviderKind};
use crate::pseudo_terminal::SessionConfig;
use anyhow::{Result, anyhow};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_model: Option<String>,
    #[serde(default)]
    pub terminal: SessionConfig,
}

impl Config {
    /// Load configuration from file, environment variables, or create default
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        let mut config = Self::load_from_path(&path)?;

        // Environment variables override config file
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Applies `GEMINI_API_KEY` and `GROQ_API_KEY` overrides.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = lookup("GROQ_API_KEY") {
            self.groq_api_key = Some(key);
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::get_config_path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".codedawn"))
    }

    /// Set a provider's API key and save config
    pub fn set_api_key(&mut self, provider: ProviderKind, api_key: String) -> Result<()> {
        self.store_api_key(provider, api_key);
        self.save()?;
        info!("{} API key saved to config file", provider);
        Ok(())
    }

    fn store_api_key(&mut self, provider: ProviderKind, api_key: String) {
        match provider {
            ProviderKind::Gemini => self.gemini_api_key = Some(api_key),
            ProviderKind::Groq => self.groq_api_key = Some(api_key),
        }
    }

    /// Human-readable summary of where configuration lives and what is set.
    pub fn describe(&self, path: &Path) -> String {
        let status = |value: &Option<String>| {
            if value.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                "Set"
            } else {
                "Not set"
            }
        };
        let prefix = self
            .terminal
            .command_prefix
            .as_deref()
            .unwrap_or("(none, plain mode)");

        let mut out = String::new();
        out.push_str(&format!("Configuration file: {}\n", path.display()));
        out.push_str(&format!(
            "Status: {}\n",
            if path.exists() { "Found" } else { "Not found (using defaults)" }
        ));
        out.push_str(&format!(
            "Gemini API key ({}): {}\n",
            GEMINI_API_KEY,
            status(&self.gemini_api_key)
        ));
        out.push_str(&format!(
            "Groq API key ({}): {}\n",
            GROQ_API_KEY,
            status(&self.groq_api_key)
        ));
        out.push_str(&format!(
            "Terminal mode: {:?}, command prefix: {}\n",
            self.terminal.mode, prefix
        ));
        out.push_str("\nTo set an API key:\n");
        out.push_str("  dawn --set-gemini-key <your-key>\n");
        out.push_str("  dawn --set-groq-key <your-key>\n");
        out.push_str("\nOr set an environment variable:\n");
        out.push_str("  export GEMINI_API_KEY=<your-key>\n");
        out.push_str("  export GROQ_API_KEY=<your-key>\n");
        out
    }

    pub fn show_config_info() -> Result<()> {
        let path = Self::get_config_path()?;
        let config = Self::load()?;
        println!("{}", config.describe(&path));
        Ok(())
    }
}

impl ConfigStore for Config {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            GEMINI_API_KEY => self.gemini_api_key.clone(),
            GROQ_API_KEY => self.groq_api_key.clone(),
            GEMINI_MODEL => self.gemini_model.clone(),
            GROQ_MODEL => self.groq_model.clone(),
            _ => None,
        }
    }
}
