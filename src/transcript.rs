use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Where transcripts come from.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// With time markings the body is returned untouched; without, the JSON
    /// `text` segments are joined with single spaces.
    async fn fetch_transcript(&self, transcript_url: &str, include_time_markings: bool) -> Result<String>;
}

/// Plain HTTP transcript fetcher. One attempt per call, bounded by the timeout.
pub struct TranscriptFetcher {
    http: reqwest::Client,
}

impl TranscriptFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("curation/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl TranscriptSource for TranscriptFetcher {
    async fn fetch_transcript(&self, transcript_url: &str, include_time_markings: bool) -> Result<String> {
        tracing::debug!(url = %transcript_url, include_time_markings, "fetching transcript");
        let body = self
            .http
            .get(transcript_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        if include_time_markings {
            Ok(body)
        } else {
            plain_text(&body).with_context(|| format!("decoding transcript from {transcript_url}"))
        }
    }
}

#[derive(Deserialize)]
struct TranscriptSegments {
    #[serde(default)]
    text: Vec<String>,
}

/// Join the `text` segments of a JSON transcript; no `text` yields "".
pub fn plain_text(body: &str) -> Result<String> {
    let segments: TranscriptSegments = serde_json::from_str(body)?;
    Ok(segments.text.join(" "))
}

/// Cut a transcript to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_join_with_spaces() {
        assert_eq!(plain_text(r#"{"text": ["Hello", "world"], "start": [0, 1200]}"#).unwrap(), "Hello world");
    }

    #[test]
    fn missing_text_is_empty() {
        assert_eq!(plain_text(r#"{"start": []}"#).unwrap(), "");
    }

    #[test]
    fn non_json_body_fails() {
        assert!(plain_text("1\n00:00:00,000 --> 00:00:01,000\nHello").is_err());
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
