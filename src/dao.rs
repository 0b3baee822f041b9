use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::curation::{EnterpriseCurationConfig, HighlightSet, HighlightedContent};
use crate::mapping::{
    content_from_row, curation_from_row, highlight_set_from_row, highlighted_content_from_row,
    video_from_row, ContentRow, CurationRow, HighlightSetRow, HighlightedContentRow, VideoRow,
};
use crate::types::{now_micros, ContentMetadata, ContentMetadataInsert, ContentType};
use crate::video::Video;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfigInsert {
    pub uuid: String,
    pub title: String,
    pub enterprise_uuid: String,
    pub is_highlight_feature_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightSetInsert {
    pub uuid: String,
    pub title: String,
    pub enterprise_curation: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightedContentInsert {
    pub uuid: String,
    pub catalog_highlight_set: String,
    pub content_metadata: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInsert {
    pub edx_video_id: String,
    pub client_video_id: String,
    pub json_metadata: String, // JSON object string
    pub parent_content_metadata: Option<String>,
}

// Nullable columns are COALESCEd; the Any driver does not decode NULL into Option<String> reliably.
const CONTENT_COLUMNS: &str = "id, content_key, content_type, COALESCE(parent_content_key, ''), json_metadata, created, modified";

// --- content metadata ---

/// Insert or refresh a content record keyed by (content_key, content_type). Returns its id.
pub async fn upsert_content_metadata(pool: &AnyPool, c: &ContentMetadataInsert) -> Result<String> {
    let now = now_micros();
    let new_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO content_metadata(id, content_key, content_type, parent_content_key, json_metadata, created, modified)\n         VALUES(?, ?, ?, ?, ?, ?, ?)\n         ON CONFLICT(content_key, content_type) DO UPDATE SET\n           parent_content_key=excluded.parent_content_key, json_metadata=excluded.json_metadata,\n           modified=excluded.modified",
    )
    .bind(&new_id)
    .bind(&c.content_key)
    .bind(c.content_type.as_str())
    .bind(&c.parent_content_key)
    .bind(c.json_metadata.to_json_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = sqlx::query_scalar::<_, String>(
        "SELECT id FROM content_metadata WHERE content_key = ? AND content_type = ? LIMIT 1",
    )
    .bind(&c.content_key)
    .bind(c.content_type.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn get_content_metadata(
    pool: &AnyPool,
    content_key: &str,
    content_type: ContentType,
) -> Result<Option<ContentMetadata>> {
    let row = sqlx::query_as::<_, ContentRow>(&format!(
        "SELECT {CONTENT_COLUMNS} FROM content_metadata WHERE content_key = ? AND content_type = ? LIMIT 1"
    ))
    .bind(content_key)
    .bind(content_type.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(content_from_row).transpose()
}

/// Any type; used to resolve keys when the caller does not know the content type.
pub async fn find_content_metadata_by_key(pool: &AnyPool, content_key: &str) -> Result<Vec<ContentMetadata>> {
    let rows = sqlx::query_as::<_, ContentRow>(&format!(
        "SELECT {CONTENT_COLUMNS} FROM content_metadata WHERE content_key = ? ORDER BY created, rowid"
    ))
    .bind(content_key)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(content_from_row).collect()
}

pub async fn list_content_metadata(
    pool: &AnyPool,
    content_keys: &[String],
    content_type: ContentType,
) -> Result<Vec<ContentMetadata>> {
    if content_keys.is_empty() { return Ok(Vec::new()); }
    let placeholders = vec!["?"; content_keys.len()].join(", ");
    let sql = format!(
        "SELECT {CONTENT_COLUMNS} FROM content_metadata WHERE content_type = ? AND content_key IN ({placeholders}) ORDER BY created, rowid"
    );
    let mut q = sqlx::query_as::<_, ContentRow>(&sql).bind(content_type.as_str());
    for key in content_keys {
        q = q.bind(key);
    }
    let rows = q.fetch_all(pool).await?;
    rows.into_iter().map(content_from_row).collect()
}

/// Records whose parent is `parent_key`, oldest first.
pub async fn list_child_records(pool: &AnyPool, parent_key: &str) -> Result<Vec<ContentMetadata>> {
    let rows = sqlx::query_as::<_, ContentRow>(&format!(
        "SELECT {CONTENT_COLUMNS} FROM content_metadata WHERE parent_content_key = ? ORDER BY created, rowid"
    ))
    .bind(parent_key)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(content_from_row).collect()
}

pub async fn delete_content_metadata(pool: &AnyPool, id: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM content_metadata WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// --- curation ---

pub async fn insert_curation_config(pool: &AnyPool, c: &CurationConfigInsert) -> Result<()> {
    let now = now_micros();
    sqlx::query(
        "INSERT INTO enterprise_curation_configs(uuid, title, enterprise_uuid, is_highlight_feature_active, created, modified)\n         VALUES(?, ?, ?, ?, ?, ?)",
    )
    .bind(&c.uuid)
    .bind(&c.title)
    .bind(&c.enterprise_uuid)
    .bind(c.is_highlight_feature_active as i64)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_curation_config_by_enterprise(
    pool: &AnyPool,
    enterprise_uuid: &str,
) -> Result<Option<EnterpriseCurationConfig>> {
    let row = sqlx::query_as::<_, CurationRow>(
        "SELECT uuid, title, enterprise_uuid, is_highlight_feature_active, created, modified\n         FROM enterprise_curation_configs WHERE enterprise_uuid = ? LIMIT 1",
    )
    .bind(enterprise_uuid)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(curation_from_row))
}

pub async fn set_highlight_feature_active(pool: &AnyPool, uuid: &str, active: bool) -> Result<u64> {
    let res = sqlx::query(
        "UPDATE enterprise_curation_configs SET is_highlight_feature_active = ?, modified = ? WHERE uuid = ?",
    )
    .bind(active as i64)
    .bind(now_micros())
    .bind(uuid)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn insert_highlight_set(pool: &AnyPool, s: &HighlightSetInsert) -> Result<()> {
    let now = now_micros();
    sqlx::query(
        "INSERT INTO highlight_sets(uuid, title, enterprise_curation, is_published, created, modified)\n         VALUES(?, ?, ?, ?, ?, ?)",
    )
    .bind(&s.uuid)
    .bind(&s.title)
    .bind(&s.enterprise_curation)
    .bind(s.is_published as i64)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_highlight_set(pool: &AnyPool, uuid: &str) -> Result<Option<HighlightSet>> {
    let row = sqlx::query_as::<_, HighlightSetRow>(
        "SELECT uuid, title, enterprise_curation, is_published, created, modified FROM highlight_sets WHERE uuid = ? LIMIT 1",
    )
    .bind(uuid)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(highlight_set_from_row))
}

pub async fn list_highlight_sets(pool: &AnyPool, curation_uuid: &str) -> Result<Vec<HighlightSet>> {
    let rows = sqlx::query_as::<_, HighlightSetRow>(
        "SELECT uuid, title, enterprise_curation, is_published, created, modified\n         FROM highlight_sets WHERE enterprise_curation = ? ORDER BY created, rowid",
    )
    .bind(curation_uuid)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(highlight_set_from_row).collect())
}

pub async fn set_highlight_set_published(pool: &AnyPool, uuid: &str, published: bool) -> Result<u64> {
    let res = sqlx::query("UPDATE highlight_sets SET is_published = ?, modified = ? WHERE uuid = ?")
        .bind(published as i64)
        .bind(now_micros())
        .bind(uuid)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// Deletion cascades to highlighted_content
pub async fn delete_highlight_set(pool: &AnyPool, uuid: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM highlight_sets WHERE uuid = ?")
        .bind(uuid)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Returns false when the content is already part of the set.
pub async fn insert_highlighted_content(pool: &AnyPool, h: &HighlightedContentInsert) -> Result<bool> {
    let now = now_micros();
    let res = sqlx::query(
        "INSERT INTO highlighted_content(uuid, catalog_highlight_set, content_metadata, created, modified)\n         VALUES(?, ?, ?, ?, ?)\n         ON CONFLICT(catalog_highlight_set, content_metadata) DO NOTHING",
    )
    .bind(&h.uuid)
    .bind(&h.catalog_highlight_set)
    .bind(&h.content_metadata)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_highlighted_content(pool: &AnyPool, set_uuid: &str, content_id: &str) -> Result<u64> {
    let res = sqlx::query(
        "DELETE FROM highlighted_content WHERE catalog_highlight_set = ? AND content_metadata = ?",
    )
    .bind(set_uuid)
    .bind(content_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

/// Entries of a set joined with their content, in creation order.
pub async fn list_highlighted_content(pool: &AnyPool, set_uuid: &str) -> Result<Vec<HighlightedContent>> {
    let rows = sqlx::query_as::<_, HighlightedContentRow>(
        "SELECT hc.uuid, COALESCE(hc.catalog_highlight_set, ''), hc.created, hc.modified,\n                COALESCE(cm.id, ''), COALESCE(cm.content_key, ''), COALESCE(cm.content_type, ''),\n                COALESCE(cm.parent_content_key, ''), COALESCE(cm.json_metadata, '{}'),\n                COALESCE(cm.created, 0), COALESCE(cm.modified, 0)\n         FROM highlighted_content hc\n         LEFT JOIN content_metadata cm ON cm.id = hc.content_metadata\n         WHERE hc.catalog_highlight_set = ?\n         ORDER BY hc.created, hc.rowid",
    )
    .bind(set_uuid)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(highlighted_content_from_row).collect()
}

// --- videos ---

pub async fn upsert_video(pool: &AnyPool, v: &VideoInsert) -> Result<()> {
    let now = now_micros();
    sqlx::query(
        "INSERT INTO videos(edx_video_id, client_video_id, json_metadata, parent_content_metadata, created, modified)\n         VALUES(?, ?, ?, ?, ?, ?)\n         ON CONFLICT(edx_video_id) DO UPDATE SET\n           client_video_id=excluded.client_video_id, json_metadata=excluded.json_metadata,\n           parent_content_metadata=excluded.parent_content_metadata, modified=excluded.modified",
    )
    .bind(&v.edx_video_id)
    .bind(&v.client_video_id)
    .bind(&v.json_metadata)
    .bind(&v.parent_content_metadata)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_video(pool: &AnyPool, edx_video_id: &str) -> Result<Option<Video>> {
    let row = sqlx::query_as::<_, VideoRow>(
        "SELECT edx_video_id, client_video_id, json_metadata, COALESCE(parent_content_metadata, ''), created, modified\n         FROM videos WHERE edx_video_id = ? LIMIT 1",
    )
    .bind(edx_video_id)
    .fetch_optional(pool)
    .await?;
    row.map(video_from_row).transpose()
}

pub async fn list_videos_for_parent(pool: &AnyPool, content_id: &str) -> Result<Vec<Video>> {
    let rows = sqlx::query_as::<_, VideoRow>(
        "SELECT edx_video_id, client_video_id, json_metadata, COALESCE(parent_content_metadata, ''), created, modified\n         FROM videos WHERE parent_content_metadata = ? ORDER BY created, rowid",
    )
    .bind(content_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(video_from_row).collect()
}
