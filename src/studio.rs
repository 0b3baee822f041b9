use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Video listing returned by the studio service for one course run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseVideos {
    #[serde(default)]
    pub previous_uploads: Vec<Value>,
}

/// Content studio service.
#[async_trait]
pub trait StudioApi: Send + Sync {
    async fn get_course_videos(&self, course_run_key: &str) -> Result<CourseVideos>;
}

pub struct StudioClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl StudioClient {
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url).with_context(|| format!("invalid studio url: {base_url}"))?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().user_agent("curation/0.1").build()?;
        Ok(Self { http, base_url, access_token })
    }

    pub fn videos_url(&self, course_run_key: &str) -> Result<Url> {
        let mut url = self.base_url.join("api/contentstore/v1/videos/")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("studio url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .push(course_run_key);
        Ok(url)
    }
}

#[async_trait]
impl StudioApi for StudioClient {
    async fn get_course_videos(&self, course_run_key: &str) -> Result<CourseVideos> {
        let url = self.videos_url(course_run_key)?;
        tracing::debug!(%url, course_run = %course_run_key, "fetching course videos");
        let mut req = self.http.get(url);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?.error_for_status()?;
        let videos = resp
            .json::<CourseVideos>()
            .await
            .with_context(|| format!("decoding studio video listing for {course_run_key}"))?;
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn videos_url_escapes_course_run_key() {
        let client = StudioClient::new("https://studio.example.com/base", None).unwrap();
        let url = client.videos_url("course-v1:edX+DemoX+2T2024").unwrap();
        assert_eq!(url.path(), "/base/api/contentstore/v1/videos/course-v1:edX+DemoX+2T2024");
    }

    #[test]
    fn listing_without_uploads_is_empty() {
        let v: CourseVideos = serde_json::from_str("{}").unwrap();
        assert!(v.previous_uploads.is_empty());
    }
}
