use anyhow::{Context, Result};
use serde_json::Value;

use crate::curation::{EnterpriseCurationConfig, HighlightSet, HighlightedContent};
use crate::dao::VideoInsert;
use crate::error::CatalogError;
use crate::types::{ContentMetadata, ContentType, Metadata};
use crate::video::Video;

// Row shapes as selected by the dao queries.
pub(crate) type ContentRow = (String, String, String, String, String, i64, i64);
pub(crate) type CurationRow = (String, String, String, i64, i64, i64);
pub(crate) type HighlightSetRow = (String, String, String, i64, i64, i64);
pub(crate) type HighlightedContentRow = (String, String, i64, i64, String, String, String, String, String, i64, i64);
pub(crate) type VideoRow = (String, String, String, String, i64, i64);

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn parse_metadata(raw: &str) -> Result<Metadata> {
    let value: Value = serde_json::from_str(raw).context("decoding stored json_metadata")?;
    Ok(Metadata::try_from(value)?)
}

pub(crate) fn content_from_row(row: ContentRow) -> Result<ContentMetadata> {
    let (id, content_key, content_type, parent_content_key, json_metadata, created, modified) = row;
    Ok(ContentMetadata {
        id,
        content_key,
        content_type: content_type.parse::<ContentType>()?,
        parent_content_key: non_empty(parent_content_key),
        json_metadata: parse_metadata(&json_metadata)?,
        created,
        modified,
    })
}

pub(crate) fn curation_from_row(row: CurationRow) -> EnterpriseCurationConfig {
    let (uuid, title, enterprise_uuid, active, created, modified) = row;
    EnterpriseCurationConfig {
        uuid,
        title,
        enterprise_uuid,
        is_highlight_feature_active: active != 0,
        created,
        modified,
    }
}

pub(crate) fn highlight_set_from_row(row: HighlightSetRow) -> HighlightSet {
    let (uuid, title, enterprise_curation, published, created, modified) = row;
    HighlightSet { uuid, title, enterprise_curation, is_published: published != 0, created, modified }
}

pub(crate) fn highlighted_content_from_row(row: HighlightedContentRow) -> Result<HighlightedContent> {
    let (uuid, set_uuid, created, modified, cm_id, key, ctype, parent, meta, cm_created, cm_modified) = row;
    // LEFT JOIN: an empty id means the content reference is gone
    let content_metadata = if cm_id.is_empty() {
        None
    } else {
        Some(content_from_row((cm_id, key, ctype, parent, meta, cm_created, cm_modified))?)
    };
    Ok(HighlightedContent {
        uuid,
        catalog_highlight_set: non_empty(set_uuid),
        content_metadata,
        created,
        modified,
    })
}

pub(crate) fn video_from_row(row: VideoRow) -> Result<Video> {
    let (edx_video_id, client_video_id, json_metadata, parent, created, modified) = row;
    Ok(Video {
        edx_video_id,
        client_video_id,
        json_metadata: parse_metadata(&json_metadata)?,
        parent_content_metadata: non_empty(parent),
        created,
        modified,
    })
}

/// Build a video upsert from one `previous_uploads` entry of the studio listing.
/// The whole entry is kept as the video's metadata.
pub fn video_insert_from_upload(entry: &Value, parent_id: &str) -> Result<VideoInsert, CatalogError> {
    let obj = entry.as_object().ok_or_else(|| CatalogError::malformed("previous_uploads"))?;
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::malformed(key))
    };
    Ok(VideoInsert {
        edx_video_id: field("edx_video_id")?,
        client_video_id: field("client_video_id")?,
        json_metadata: entry.to_string(),
        parent_content_metadata: Some(parent_id.to_string()),
    })
}
