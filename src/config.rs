use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use url::Url;

/// Runtime settings. Loaded from an optional TOML file, then overridden by
/// `CURATION_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    /// Database URL; a SQLite file in the user data dir when unset.
    pub database_url: Option<String>,

    pub studio_base_url: String,
    pub studio_access_token: Option<String>,

    pub xpert_api_url: String,
    pub xpert_client_id: String,
    /// Default system message for chat completions
    pub xpert_system_message: String,
    pub chat_connect_timeout_secs: u64,
    pub chat_read_timeout_secs: u64,

    /// Placeholders: `{count}`, `{transcript}`
    pub summarize_transcript_prompt: String,
    pub video_title_system_message: String,
    /// Placeholders: `{transcript_summary}`, `{max_length}`
    pub video_title_user_message: String,

    pub transcript_fetch_timeout_secs: u64,
    /// Transcripts are cut to this many characters before summarizing
    pub max_transcript_length: usize,
    /// Advisory summary length passed to the prompt
    pub summary_max_length: usize,
    pub title_max_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            studio_base_url: "http://localhost:18010".to_string(),
            studio_access_token: None,
            xpert_api_url: "http://localhost:18090/v2/chat".to_string(),
            xpert_client_id: "enterprise-catalog".to_string(),
            xpert_system_message: "You are an assistant that helps curate learning content.".to_string(),
            chat_connect_timeout_secs: 5,
            chat_read_timeout_secs: 20,
            summarize_transcript_prompt: "Summarize the following video transcript in at most {count} characters. \
                Reply with plain text only.\n\nTranscript:\n{transcript}"
                .to_string(),
            video_title_system_message: "You are an expert video title generator.".to_string(),
            video_title_user_message: "Write a title of at most {max_length} characters for a video with this summary: \
                {transcript_summary}"
                .to_string(),
            transcript_fetch_timeout_secs: 10,
            max_transcript_length: 10_000,
            summary_max_length: 260,
            title_max_length: 60,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default config file if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };
        let mut settings = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("reading config file: {}", p.display()))?;
                Self::from_toml(&raw).with_context(|| format!("parsing config file: {}", p.display()))?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `CURATION_*` overrides using `lookup` (the process environment in `load`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CURATION_DATABASE_URL") { self.database_url = Some(v); }
        if let Some(v) = lookup("CURATION_STUDIO_BASE_URL") { self.studio_base_url = v; }
        if let Some(v) = lookup("CURATION_STUDIO_ACCESS_TOKEN") { self.studio_access_token = Some(v); }
        if let Some(v) = lookup("CURATION_XPERT_API_URL") { self.xpert_api_url = v; }
        if let Some(v) = lookup("CURATION_XPERT_CLIENT_ID") { self.xpert_client_id = v; }
        if let Some(v) = lookup("CURATION_XPERT_SYSTEM_MESSAGE") { self.xpert_system_message = v; }
        if let Some(v) = lookup("CURATION_CHAT_CONNECT_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.chat_connect_timeout_secs = v;
        }
        if let Some(v) = lookup("CURATION_CHAT_READ_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.chat_read_timeout_secs = v;
        }
        if let Some(v) = lookup("CURATION_TRANSCRIPT_FETCH_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.transcript_fetch_timeout_secs = v;
        }
        if let Some(v) = lookup("CURATION_MAX_TRANSCRIPT_LENGTH").and_then(|s| s.parse().ok()) {
            self.max_transcript_length = v;
        }
        if let Some(v) = lookup("CURATION_SUMMARY_MAX_LENGTH").and_then(|s| s.parse().ok()) {
            self.summary_max_length = v;
        }
        if let Some(v) = lookup("CURATION_TITLE_MAX_LENGTH").and_then(|s| s.parse().ok()) {
            self.title_max_length = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.studio_base_url)
            .with_context(|| format!("invalid studio_base_url: {}", self.studio_base_url))?;
        Url::parse(&self.xpert_api_url)
            .with_context(|| format!("invalid xpert_api_url: {}", self.xpert_api_url))?;
        Ok(())
    }

    pub fn transcript_fetch_timeout(&self) -> Duration { Duration::from_secs(self.transcript_fetch_timeout_secs) }
    pub fn chat_connect_timeout(&self) -> Duration { Duration::from_secs(self.chat_connect_timeout_secs) }
    pub fn chat_read_timeout(&self) -> Duration { Duration::from_secs(self.chat_read_timeout_secs) }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "curation", "curation").map(|p| p.config_dir().join("config.toml"))
}

/// Substitute `{name}` placeholders in a prompt template.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in values {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
