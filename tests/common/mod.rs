#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use curation::ai::{ChatApi, ChatMessage};
use curation::config::Settings;
use curation::studio::{CourseVideos, StudioApi};
use curation::transcript::TranscriptSource;
use curation::types::{ContentMetadataInsert, ContentType, Metadata};
use curation::Curation;

#[derive(Default)]
pub struct FakeStudio {
    pub uploads: HashMap<String, Vec<Value>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeStudio {
    pub fn with(course_run_key: &str, uploads: Vec<Value>) -> Self {
        let mut s = Self::default();
        s.uploads.insert(course_run_key.to_string(), uploads);
        s
    }
}

#[async_trait]
impl StudioApi for FakeStudio {
    async fn get_course_videos(&self, course_run_key: &str) -> Result<CourseVideos> {
        self.calls.lock().unwrap().push(course_run_key.to_string());
        Ok(CourseVideos { previous_uploads: self.uploads.get(course_run_key).cloned().unwrap_or_default() })
    }
}

/// Replies are handed out in order; running out is an error.
#[derive(Default)]
pub struct FakeChat {
    pub replies: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl FakeChat {
    pub fn replying(replies: &[&str]) -> Self {
        Self { replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()), calls: Mutex::default() }
    }
}

#[async_trait]
impl ChatApi for FakeChat {
    async fn chat_completion(&self, system_message: &str, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push((system_message.to_string(), messages.to_vec()));
        self.replies.lock().unwrap().pop_front().ok_or_else(|| anyhow!("no canned reply left"))
    }
}

#[derive(Default)]
pub struct FakeTranscripts {
    pub bodies: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTranscripts {
    pub fn with(url: &str, text: &str) -> Self {
        let mut t = Self::default();
        t.bodies.insert(url.to_string(), text.to_string());
        t
    }
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch_transcript(&self, transcript_url: &str, _include_time_markings: bool) -> Result<String> {
        self.calls.lock().unwrap().push(transcript_url.to_string());
        self.bodies.get(transcript_url).cloned().ok_or_else(|| anyhow!("404 for {transcript_url}"))
    }
}

pub struct TestApp {
    pub app: Curation,
    pub studio: Arc<FakeStudio>,
    pub chat: Arc<FakeChat>,
    pub transcripts: Arc<FakeTranscripts>,
    _dir: TempDir,
}

pub fn settings_for(dir: &TempDir) -> Settings {
    let path = dir.path().join("curation.db");
    Settings { database_url: Some(format!("sqlite://{}?mode=rwc", path.display())), ..Settings::default() }
}

pub async fn test_app_with(studio: FakeStudio, chat: FakeChat, transcripts: FakeTranscripts) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let studio = Arc::new(studio);
    let chat = Arc::new(chat);
    let transcripts = Arc::new(transcripts);
    let app = Curation::with_clients(settings_for(&dir), true, studio.clone(), chat.clone(), transcripts.clone())
        .await
        .unwrap();
    TestApp { app, studio, chat, transcripts, _dir: dir }
}

pub async fn test_app() -> TestApp {
    test_app_with(FakeStudio::default(), FakeChat::default(), FakeTranscripts::default()).await
}

pub fn record(key: &str, content_type: ContentType, parent: Option<&str>, metadata: Value) -> ContentMetadataInsert {
    ContentMetadataInsert {
        content_key: key.to_string(),
        content_type,
        parent_content_key: parent.map(str::to_string),
        json_metadata: Metadata::try_from(metadata).unwrap(),
    }
}
