//! Layered settings: defaults, optional TOML file, `WISEUP_*` environment.

use anyhow::{bail, Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Default settings file, overridable through `WISEUP_CONFIG`.
pub const DEFAULT_CONFIG_FILE: &str = "wiseup.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Backend base URL.
    pub api_url: String,
    /// Bearer token of the signed-in user. Absent means anonymous.
    #[serde(default)]
    pub auth_token: Option<String>,
    pub content_limit: usize,
    pub ad_limit: usize,
    /// An ad is slotted in after every `ad_frequency` lessons.
    pub ad_frequency: usize,
    pub interests: Vec<String>,
    pub autoplay: bool,
    pub start_muted: bool,
    pub use_sample_feed: bool,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("WISEUP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("api_url", "http://localhost:5000")?
            .set_default("content_limit", 10_i64)?
            .set_default("ad_limit", 5_i64)?
            .set_default("ad_frequency", 3_i64)?
            .set_default("interests", Vec::<String>::new())?
            .set_default("autoplay", false)?
            .set_default("start_muted", false)?
            .set_default("use_sample_feed", false)?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("WISEUP")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("interests"),
            )
            .build()
            .with_context(|| format!("Failed to read settings from {}", path))?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ad_frequency == 0 {
            bail!("ad_frequency must be at least 1");
        }
        url::Url::parse(&self.api_url)
            .with_context(|| format!("api_url is not a valid URL: {}", self.api_url))?;
        Ok(())
    }
}
