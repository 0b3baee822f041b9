pub mod ai;
pub mod config;
pub mod curation;
pub mod dao;
pub mod db;
pub mod error;
pub mod mapping;
pub mod studio;
pub mod transcript;
pub mod types;
pub mod video;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::ai::{ChatApi, ChatMessage, ChatReply, ResponseFormat, Role};
    pub use crate::config::Settings;
    pub use crate::curation::{EnterpriseCurationConfig, HighlightSet, HighlightSetView, HighlightedContent, HighlightedContentView};
    pub use crate::error::CatalogError;
    pub use crate::studio::{CourseVideos, StudioApi};
    pub use crate::transcript::TranscriptSource;
    pub use crate::types::{AuthoringOrganization, ContentMetadata, ContentMetadataInsert, ContentType, Metadata};
    pub use crate::video::{TranscriptUrls, Video};
    pub use crate::Curation;
}

use anyhow::Result;
use std::sync::Arc;

use crate::ai::{ChatApi, XpertClient};
use crate::config::Settings;
use crate::curation::{EnterpriseCurationConfig, HighlightSet, HighlightSetView};
use crate::db::Database;
use crate::error::CatalogError;
use crate::studio::{StudioApi, StudioClient};
use crate::transcript::{TranscriptFetcher, TranscriptSource};
use crate::types::{ContentMetadata, ContentMetadataInsert, ContentType};
use crate::video::{Summarizer, TranscriptUrls, Video};

/// Main entry: owns the store and the clients for the remote services.
pub struct Curation {
    db: Database,
    studio: Arc<dyn StudioApi>,
    summarizer: Summarizer,
}

impl Curation {
    /// Connect to the configured database and build HTTP clients from `settings`.
    pub async fn connect(settings: Settings, run_migrations: bool) -> Result<Self> {
        let studio = StudioClient::new(&settings.studio_base_url, settings.studio_access_token.clone())?;
        let chat = XpertClient::new(
            &settings.xpert_api_url,
            &settings.xpert_client_id,
            settings.chat_connect_timeout(),
            settings.chat_read_timeout(),
        )?;
        let transcripts = TranscriptFetcher::new(settings.transcript_fetch_timeout())?;
        Self::with_clients(settings, run_migrations, Arc::new(studio), Arc::new(chat), Arc::new(transcripts)).await
    }

    /// Like `connect`, with caller-supplied service clients.
    pub async fn with_clients(
        settings: Settings,
        run_migrations: bool,
        studio: Arc<dyn StudioApi>,
        chat: Arc<dyn ChatApi>,
        transcripts: Arc<dyn TranscriptSource>,
    ) -> Result<Self> {
        let db = Database::connect(settings.database_url.as_deref()).await?;
        if run_migrations { db.run_migrations().await?; }
        let summarizer = Summarizer::new(transcripts, chat, settings);
        Ok(Self { db, studio, summarizer })
    }

    pub async fn run_migrations(&self) -> Result<()> { self.db.run_migrations().await }

    pub fn database(&self) -> &Database { &self.db }

    // --- content metadata ---

    pub async fn upsert_content(&self, content: &ContentMetadataInsert) -> Result<String> {
        dao::upsert_content_metadata(self.db.pool(), content).await
    }

    /// Upsert a batch of records; parents should precede their children.
    pub async fn load_content(&self, records: &[ContentMetadataInsert]) -> Result<usize> {
        for record in records {
            self.upsert_content(record).await?;
        }
        tracing::info!(records = records.len(), "content metadata loaded");
        Ok(records.len())
    }

    pub async fn get_content(&self, content_key: &str, content_type: ContentType) -> Result<ContentMetadata> {
        dao::get_content_metadata(self.db.pool(), content_key, content_type)
            .await?
            .ok_or_else(|| CatalogError::ContentNotFound { content_key: content_key.to_string(), content_type }.into())
    }

    /// Delete a record; its highlights and videos go with it.
    pub async fn delete_content(&self, content_key: &str, content_type: ContentType) -> Result<()> {
        let content = self.get_content(content_key, content_type).await?;
        dao::delete_content_metadata(self.db.pool(), &content.id).await?;
        tracing::info!(content_key = %content_key, content_type = %content_type, "deleted content metadata");
        Ok(())
    }

    pub async fn list_content(&self, content_keys: &[String], content_type: ContentType) -> Result<Vec<ContentMetadata>> {
        dao::list_content_metadata(self.db.pool(), content_keys, content_type).await
    }

    pub async fn child_records(&self, parent_key: &str) -> Result<Vec<ContentMetadata>> {
        dao::list_child_records(self.db.pool(), parent_key).await
    }

    // --- curation ---

    pub async fn get_or_create_curation(&self, enterprise_uuid: &str, title: &str) -> Result<EnterpriseCurationConfig> {
        curation::get_or_create_curation(self.db.pool(), enterprise_uuid, title).await
    }

    pub async fn get_curation(&self, enterprise_uuid: &str) -> Result<EnterpriseCurationConfig> {
        curation::require_curation(self.db.pool(), enterprise_uuid).await
    }

    pub async fn set_highlight_feature_active(&self, enterprise_uuid: &str, active: bool) -> Result<()> {
        let config = curation::require_curation(self.db.pool(), enterprise_uuid).await?;
        dao::set_highlight_feature_active(self.db.pool(), &config.uuid, active).await?;
        Ok(())
    }

    pub async fn create_highlight_set(&self, enterprise_uuid: &str, title: &str, is_published: bool) -> Result<HighlightSet> {
        curation::create_highlight_set(self.db.pool(), enterprise_uuid, title, is_published).await
    }

    pub async fn add_highlighted_content(&self, set_uuid: &str, content_keys: &[String]) -> Result<Vec<String>> {
        curation::add_content(self.db.pool(), set_uuid, content_keys).await
    }

    pub async fn remove_highlighted_content(&self, set_uuid: &str, content_key: &str) -> Result<u64> {
        curation::remove_content(self.db.pool(), set_uuid, content_key).await
    }

    pub async fn publish_highlight_set(&self, set_uuid: &str, published: bool) -> Result<()> {
        if dao::set_highlight_set_published(self.db.pool(), set_uuid, published).await? == 0 {
            return Err(CatalogError::HighlightSetNotFound(set_uuid.to_string()).into());
        }
        Ok(())
    }

    /// Delete a set and, through the cascade, its highlighted content.
    pub async fn delete_highlight_set(&self, set_uuid: &str) -> Result<()> {
        if dao::delete_highlight_set(self.db.pool(), set_uuid).await? == 0 {
            return Err(CatalogError::HighlightSetNotFound(set_uuid.to_string()).into());
        }
        tracing::info!(set = %set_uuid, "deleted highlight set");
        Ok(())
    }

    pub async fn highlight_set_card_image_url(&self, set_uuid: &str) -> Result<Option<String>> {
        curation::require_highlight_set(self.db.pool(), set_uuid).await?;
        curation::highlight_set_card_image_url(self.db.pool(), set_uuid).await
    }

    pub async fn highlight_set(&self, set_uuid: &str) -> Result<HighlightSetView> {
        curation::highlight_set_view(self.db.pool(), set_uuid).await
    }

    pub async fn highlight_sets(&self, enterprise_uuid: &str) -> Result<Vec<HighlightSetView>> {
        curation::list_highlight_set_views(self.db.pool(), enterprise_uuid).await
    }

    // --- videos ---

    pub async fn fetch_course_video_metadata(&self, course_run_key: &str) -> Result<usize> {
        video::fetch_course_video_metadata(self.db.pool(), self.studio.as_ref(), course_run_key).await
    }

    pub async fn fetch_videos(&self, course_keys: &[String]) -> Result<usize> {
        video::fetch_videos(self.db.pool(), self.studio.as_ref(), course_keys).await
    }

    pub async fn get_video(&self, edx_video_id: &str) -> Result<Video> {
        dao::get_video(self.db.pool(), edx_video_id)
            .await?
            .ok_or_else(|| CatalogError::VideoNotFound(edx_video_id.to_string()).into())
    }

    /// Videos stored for a course run.
    pub async fn course_run_videos(&self, course_run_key: &str) -> Result<Vec<Video>> {
        let run = self.get_content(course_run_key, ContentType::CourseRun).await?;
        dao::list_videos_for_parent(self.db.pool(), &run.id).await
    }

    pub async fn generate_video_summary(&self, edx_video_id: &str, language: &str) -> Result<String> {
        let video = self.get_video(edx_video_id).await?;
        self.summarizer.generate_video_summary(&video, language).await
    }

    pub async fn generate_transcript_summary(&self, transcript_urls: &TranscriptUrls, language: &str) -> Result<String> {
        self.summarizer.generate_transcript_summary(transcript_urls, language).await
    }

    pub async fn generate_video_title(&self, transcript_urls: &TranscriptUrls) -> Result<String> {
        self.summarizer.generate_video_title(transcript_urls).await
    }

    pub fn summarizer(&self) -> &Summarizer { &self.summarizer }
}
