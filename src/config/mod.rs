use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utm::presets::Preset;
use crate::utm::UtmParam;

pub const DEFAULT_BASE_URL: &str = "https://example.com";

/// Optional colour overrides, as `#RRGGBB` or `#RGB` strings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_selected: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL the form starts with (and resets to)
    #[serde(default = "default_base_url")]
    pub default_base_url: String,

    /// Desktop notification after copying
    #[serde(default = "default_true")]
    pub notifications: bool,

    /// User suggestions appended to the built-in lists
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_sources: Vec<Preset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_mediums: Vec<Preset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_campaigns: Vec<Preset>,

    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_base_url: default_base_url(),
            notifications: true,
            extra_sources: Vec::new(),
            extra_mediums: Vec::new(),
            extra_campaigns: Vec::new(),
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Directory holding config.toml and the TUI log
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("utmkit");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir)
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => return Ok(config),
                    // Keep the broken file for the user to fix; run on defaults
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", path.display(), e);
                        return Ok(AppConfig::default());
                    }
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        if let Err(e) = config.save() {
            tracing::debug!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        if config.default_base_url.trim().is_empty() {
            config.default_base_url = default_base_url();
        }
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// User suggestions configured for `param`
    pub fn extra_presets(&self, param: UtmParam) -> &[Preset] {
        match param {
            UtmParam::Source => &self.extra_sources,
            UtmParam::Medium => &self.extra_mediums,
            UtmParam::Campaign => &self.extra_campaigns,
            UtmParam::Term | UtmParam::Content => &[],
        }
    }
}
