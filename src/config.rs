use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ON_DEMAND_PRICE_URL: &str = "http://a0.awsstatic.com/pricing/1/ec2/linux-od.min.js";
pub const PREVIOUS_GENERATION_PRICE_URL: &str =
    "http://a0.awsstatic.com/pricing/1/ec2/previous-generation/linux-od.min.js";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_accounts")]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// One AWS account to collect instances and reservations from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Label shown in reports (falls back to the profile name)
    pub name: Option<String>,
    /// Shared config profile (uses the default credential chain if not set)
    pub profile: Option<String>,
    /// Region override (uses the profile's region if not set)
    pub region: Option<String>,
}

impl AccountConfig {
    pub fn account_id(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.profile.clone())
            .unwrap_or_else(|| "default".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub on_demand_url: String,
    pub previous_generation_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per EC2 or pricing request, including the first
    pub max_attempts: u32,
}

fn default_accounts() -> Vec<AccountConfig> {
    vec![AccountConfig::default()]
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            on_demand_url: ON_DEMAND_PRICE_URL.to_string(),
            previous_generation_url: PREVIOUS_GENERATION_PRICE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            pricing: PricingConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .reservectl.toml in current dir, then ~/.config/reservectl/config.toml
            let local = PathBuf::from(".reservectl.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("reservectl").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".reservectl.toml"))
            }
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content).with_context(|| {
                let mut err = format!("Failed to parse config: {}", config_path.display());
                err.push_str("\n  Common issues:");
                err.push_str("\n    - Invalid TOML syntax");
                err.push_str("\n    - Incorrect value types");
                err.push_str("\n  Tip: Run 'reservectl init' to create a new config file");
                err
            })?;
            config
                .validate()
                .with_context(|| format!("Invalid config: {}", config_path.display()))?;
            Ok(config)
        } else {
            // Use defaults but warn if user explicitly provided a path
            if path.is_some() {
                eprintln!("WARNING: Config file not found: {}", config_path.display());
                eprintln!(
                    "   Using default configuration. Run 'reservectl init' to create a config file."
                );
            }
            Ok(Config::default())
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::MissingField("accounts".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.pricing.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pricing.timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, url) in [
            ("pricing.on_demand_url", &self.pricing.on_demand_url),
            ("pricing.previous_generation_url", &self.pricing.previous_generation_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{}' is not an http(s) URL", url),
                });
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
