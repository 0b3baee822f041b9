//! Course-run videos: ingestion from the studio service and transcript
//! summaries through the chat service.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::ai::{chat_completions, ChatApi, ChatMessage, ResponseFormat};
use crate::config::{render_template, Settings};
use crate::dao;
use crate::error::CatalogError;
use crate::mapping::video_insert_from_upload;
use crate::studio::StudioApi;
use crate::transcript::{truncate_chars, TranscriptSource};
use crate::types::{ContentType, Metadata};

/// Language code → transcript URL.
pub type TranscriptUrls = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub edx_video_id: String,
    pub client_video_id: String,
    pub json_metadata: Metadata,
    /// Id of the course run this video belongs to
    pub parent_content_metadata: Option<String>,
    pub created: i64,
    pub modified: i64,
}

impl Video {
    pub fn transcript_urls(&self) -> TranscriptUrls {
        self.json_metadata
            .object_field("transcript_urls")
            .map(|urls| {
                urls.iter()
                    .filter_map(|(lang, url)| url.as_str().map(|u| (lang.clone(), u.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn transcript_url(&self, language: &str) -> Result<String, CatalogError> {
        transcript_url_for(&self.transcript_urls(), language).map(str::to_string)
    }
}

fn transcript_url_for<'a>(urls: &'a TranscriptUrls, language: &str) -> Result<&'a str, CatalogError> {
    urls.get(language)
        .map(String::as_str)
        .ok_or_else(|| CatalogError::TranscriptUrlMissing(language.to_string()))
}

// --- ingestion ---

/// Fetch the studio video listing of a course run and upsert every video,
/// linked to the run's content record. Returns the number of videos stored.
pub async fn fetch_course_video_metadata(
    pool: &AnyPool,
    studio: &dyn StudioApi,
    course_run_key: &str,
) -> Result<usize> {
    let listing = studio.get_course_videos(course_run_key).await?;
    if listing.previous_uploads.is_empty() {
        tracing::debug!(course_run = %course_run_key, "studio returned no videos");
        return Ok(0);
    }

    let parent = dao::get_content_metadata(pool, course_run_key, ContentType::CourseRun)
        .await?
        .ok_or_else(|| CatalogError::ContentNotFound {
            content_key: course_run_key.to_string(),
            content_type: ContentType::CourseRun,
        })?;

    // No enclosing transaction: videos stored before a failure stay stored.
    let mut stored = 0;
    for entry in &listing.previous_uploads {
        let insert = video_insert_from_upload(entry, &parent.id)?;
        dao::upsert_video(pool, &insert).await?;
        stored += 1;
    }
    tracing::info!(course_run = %course_run_key, videos = stored, "stored course videos");
    Ok(stored)
}

/// Ingest videos for each course key through the course's first known run.
/// Courses without a run, and keys with no course record, are skipped.
pub async fn fetch_videos(pool: &AnyPool, studio: &dyn StudioApi, course_keys: &[String]) -> Result<usize> {
    let courses = dao::list_content_metadata(pool, course_keys, ContentType::Course).await?;
    let mut total = 0;
    for course in courses {
        let first_run = dao::list_child_records(pool, &course.content_key)
            .await?
            .into_iter()
            .find(|c| c.content_type == ContentType::CourseRun);
        match first_run {
            Some(run) => total += fetch_course_video_metadata(pool, studio, &run.content_key).await?,
            None => tracing::debug!(course = %course.content_key, "no course run known; skipping"),
        }
    }
    Ok(total)
}

// --- summaries ---

/// Produces transcript summaries and video titles.
pub struct Summarizer {
    transcripts: Arc<dyn TranscriptSource>,
    chat: Arc<dyn ChatApi>,
    settings: Settings,
}

impl Summarizer {
    pub fn new(transcripts: Arc<dyn TranscriptSource>, chat: Arc<dyn ChatApi>, settings: Settings) -> Self {
        Self { transcripts, chat, settings }
    }

    /// Ask the chat service for a plain-text summary of `transcript`.
    /// `max_length` is only a hint inside the prompt.
    pub async fn get_transcript_summary(&self, transcript: &str, max_length: usize) -> Result<String> {
        let prompt = render_template(
            &self.settings.summarize_transcript_prompt,
            &[("count", max_length.to_string().as_str()), ("transcript", transcript)],
        );
        let messages = [ChatMessage::system(prompt)];
        let reply = chat_completions(
            self.chat.as_ref(),
            &messages,
            ResponseFormat::Text,
            &self.settings.xpert_system_message,
        )
        .await?;
        Ok(reply.into_text())
    }

    /// Summarize the transcript published for `language`.
    pub async fn generate_transcript_summary(&self, transcript_urls: &TranscriptUrls, language: &str) -> Result<String> {
        let url = transcript_url_for(transcript_urls, language)?;
        let transcript = self.transcripts.fetch_transcript(url, false).await?;
        let transcript = truncate_chars(&transcript, self.settings.max_transcript_length);
        self.get_transcript_summary(transcript, self.settings.summary_max_length).await
    }

    pub async fn generate_video_summary(&self, video: &Video, language: &str) -> Result<String> {
        self.generate_transcript_summary(&video.transcript_urls(), language).await
    }

    /// Title from the English transcript summary. Fails before calling the
    /// chat service when no summary could be produced.
    pub async fn generate_video_title(&self, transcript_urls: &TranscriptUrls) -> Result<String> {
        let summary = self.generate_transcript_summary(transcript_urls, "en").await?;
        if summary.trim().is_empty() {
            return Err(CatalogError::TranscriptSummaryMissing.into());
        }
        let user_message = render_template(
            &self.settings.video_title_user_message,
            &[
                ("max_length", self.settings.title_max_length.to_string().as_str()),
                ("transcript_summary", summary.as_str()),
            ],
        );
        let title = self
            .chat
            .chat_completion(&self.settings.video_title_system_message, &[ChatMessage::user(user_message)])
            .await?;
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn video(metadata: Value) -> Video {
        Video {
            edx_video_id: "vid".into(),
            client_video_id: "intro.mp4".into(),
            json_metadata: Metadata::try_from(metadata).unwrap(),
            parent_content_metadata: None,
            created: 0,
            modified: 0,
        }
    }

    #[test]
    fn transcript_url_lookup_by_language() {
        let v = video(json!({"transcript_urls": {"en": "http://t/en.sjson", "fr": "http://t/fr.sjson"}}));
        assert_eq!(v.transcript_url("fr").unwrap(), "http://t/fr.sjson");
        assert!(matches!(v.transcript_url("de"), Err(CatalogError::TranscriptUrlMissing(ref l)) if l == "de"));
    }

    #[test]
    fn video_without_transcripts_has_no_urls() {
        assert!(video(json!({"status": "Ready"})).transcript_urls().is_empty());
    }
}
