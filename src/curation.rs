//! Enterprise curation: highlight sets and the display properties derived
//! from the content they reference.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::dao::{self, CurationConfigInsert, HighlightSetInsert, HighlightedContentInsert};
use crate::error::CatalogError;
use crate::types::{AuthoringOrganization, ContentMetadata, ContentType};

/// Top-level container for everything an enterprise curates. One per enterprise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseCurationConfig {
    pub uuid: String,
    pub title: String,
    pub enterprise_uuid: String,
    pub is_highlight_feature_active: bool,
    pub created: i64,
    pub modified: i64,
}

/// A titled, optionally published group of highlighted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightSet {
    pub uuid: String,
    pub title: String,
    pub enterprise_curation: String,
    pub is_published: bool,
    pub created: i64,
    pub modified: i64,
}

/// One entry of a highlight set. The referenced content may be gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedContent {
    pub uuid: String,
    pub catalog_highlight_set: Option<String>,
    pub content_metadata: Option<ContentMetadata>,
    pub created: i64,
    pub modified: i64,
}

impl HighlightedContent {
    pub fn content_type(&self) -> Option<ContentType> {
        self.content_metadata.as_ref().map(|c| c.content_type)
    }

    pub fn content_key(&self) -> Option<&str> {
        self.content_metadata.as_ref().map(|c| c.content_key.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.content_metadata.as_ref().and_then(ContentMetadata::title)
    }

    /// Course runs and pathways have no card image.
    pub fn card_image_url(&self) -> Option<&str> {
        self.content_metadata.as_ref().and_then(ContentMetadata::card_image_url)
    }

    /// Fails if an organization entry lacks `uuid`, `name` or `logo_image_url`.
    pub fn authoring_organizations(&self) -> Result<Vec<AuthoringOrganization>, CatalogError> {
        match &self.content_metadata {
            Some(content) => content.authoring_organizations(),
            None => Ok(Vec::new()),
        }
    }
}

/// Card image of a highlight set: the image of the earliest-created entry
/// that has one. Only removing that entry changes the result; later additions
/// never do.
pub fn highlight_set_card_image(entries: &[HighlightedContent]) -> Option<String> {
    let mut ordered: Vec<&HighlightedContent> = entries.iter().collect();
    // stable: equal timestamps keep insertion order
    ordered.sort_by_key(|e| e.created);
    ordered.into_iter().find_map(|e| e.card_image_url().map(str::to_string))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightedContentView {
    pub uuid: String,
    pub content_key: Option<String>,
    pub content_type: Option<ContentType>,
    pub title: Option<String>,
    pub card_image_url: Option<String>,
    pub authoring_organizations: Vec<AuthoringOrganization>,
}

impl HighlightedContentView {
    pub fn from_entry(entry: &HighlightedContent) -> Result<Self, CatalogError> {
        Ok(Self {
            uuid: entry.uuid.clone(),
            content_key: entry.content_key().map(str::to_string),
            content_type: entry.content_type(),
            title: entry.title().map(str::to_string),
            card_image_url: entry.card_image_url().map(str::to_string),
            authoring_organizations: entry.authoring_organizations()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightSetView {
    pub uuid: String,
    pub title: String,
    pub enterprise_curation: String,
    pub is_published: bool,
    pub card_image_url: Option<String>,
    pub highlighted_content: Vec<HighlightedContentView>,
}

impl HighlightSetView {
    pub fn build(set: &HighlightSet, entries: &[HighlightedContent]) -> Result<Self, CatalogError> {
        let highlighted_content = entries
            .iter()
            .map(HighlightedContentView::from_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            uuid: set.uuid.clone(),
            title: set.title.clone(),
            enterprise_curation: set.enterprise_curation.clone(),
            is_published: set.is_published,
            card_image_url: highlight_set_card_image(entries),
            highlighted_content,
        })
    }
}

// --- store-backed operations ---

/// Fetch the curation config for an enterprise, creating it on first use.
pub async fn get_or_create_curation(
    pool: &AnyPool,
    enterprise_uuid: &str,
    title: &str,
) -> Result<EnterpriseCurationConfig> {
    if let Some(existing) = dao::get_curation_config_by_enterprise(pool, enterprise_uuid).await? {
        return Ok(existing);
    }
    let insert = CurationConfigInsert {
        uuid: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        enterprise_uuid: enterprise_uuid.to_string(),
        is_highlight_feature_active: true,
    };
    dao::insert_curation_config(pool, &insert).await?;
    tracing::info!(enterprise = %enterprise_uuid, curation = %insert.uuid, "created enterprise curation");
    require_curation(pool, enterprise_uuid).await
}

pub async fn require_curation(pool: &AnyPool, enterprise_uuid: &str) -> Result<EnterpriseCurationConfig> {
    dao::get_curation_config_by_enterprise(pool, enterprise_uuid)
        .await?
        .ok_or_else(|| CatalogError::CurationNotFound(enterprise_uuid.to_string()).into())
}

pub async fn require_highlight_set(pool: &AnyPool, set_uuid: &str) -> Result<HighlightSet> {
    dao::get_highlight_set(pool, set_uuid)
        .await?
        .ok_or_else(|| CatalogError::HighlightSetNotFound(set_uuid.to_string()).into())
}

pub async fn create_highlight_set(
    pool: &AnyPool,
    enterprise_uuid: &str,
    title: &str,
    is_published: bool,
) -> Result<HighlightSet> {
    let curation = require_curation(pool, enterprise_uuid).await?;
    let insert = HighlightSetInsert {
        uuid: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        enterprise_curation: curation.uuid,
        is_published,
    };
    dao::insert_highlight_set(pool, &insert).await?;
    tracing::info!(enterprise = %enterprise_uuid, set = %insert.uuid, title = %title, "created highlight set");
    require_highlight_set(pool, &insert.uuid).await
}

/// Add content to a set by key, in the given order. Keys already in the set
/// are skipped. Returns the keys that were added.
pub async fn add_content(pool: &AnyPool, set_uuid: &str, content_keys: &[String]) -> Result<Vec<String>> {
    require_highlight_set(pool, set_uuid).await?;
    let mut added = Vec::with_capacity(content_keys.len());
    for key in content_keys {
        let content = dao::find_content_metadata_by_key(pool, key)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::ContentKeyNotFound(key.clone()))?;
        let insert = HighlightedContentInsert {
            uuid: uuid::Uuid::new_v4().to_string(),
            catalog_highlight_set: set_uuid.to_string(),
            content_metadata: content.id,
        };
        if dao::insert_highlighted_content(pool, &insert).await? {
            added.push(key.clone());
        } else {
            tracing::debug!(set = %set_uuid, content_key = %key, "content already highlighted");
        }
    }
    tracing::info!(set = %set_uuid, added = added.len(), requested = content_keys.len(), "highlighted content added");
    Ok(added)
}

/// Remove content from a set by key. Returns the number of entries removed.
pub async fn remove_content(pool: &AnyPool, set_uuid: &str, content_key: &str) -> Result<u64> {
    let mut removed = 0;
    for content in dao::find_content_metadata_by_key(pool, content_key).await? {
        removed += dao::delete_highlighted_content(pool, set_uuid, &content.id).await?;
    }
    Ok(removed)
}

pub async fn highlight_set_card_image_url(pool: &AnyPool, set_uuid: &str) -> Result<Option<String>> {
    let entries = dao::list_highlighted_content(pool, set_uuid).await?;
    Ok(highlight_set_card_image(&entries))
}

pub async fn highlight_set_view(pool: &AnyPool, set_uuid: &str) -> Result<HighlightSetView> {
    let set = require_highlight_set(pool, set_uuid).await?;
    let entries = dao::list_highlighted_content(pool, set_uuid).await?;
    Ok(HighlightSetView::build(&set, &entries)?)
}

/// All sets of an enterprise in creation order.
pub async fn list_highlight_set_views(pool: &AnyPool, enterprise_uuid: &str) -> Result<Vec<HighlightSetView>> {
    let curation = require_curation(pool, enterprise_uuid).await?;
    let mut views = Vec::new();
    for set in dao::list_highlight_sets(pool, &curation.uuid).await? {
        let entries = dao::list_highlighted_content(pool, &set.uuid).await?;
        views.push(HighlightSetView::build(&set, &entries)?);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use serde_json::{json, Value};

    fn entry(created: i64, content_type: ContentType, metadata: Value) -> HighlightedContent {
        HighlightedContent {
            uuid: format!("hc-{created}"),
            catalog_highlight_set: Some("set".into()),
            content_metadata: Some(ContentMetadata {
                id: format!("cm-{created}"),
                content_key: format!("key-{created}"),
                content_type,
                parent_content_key: None,
                json_metadata: Metadata::try_from(metadata).unwrap(),
                created,
                modified: created,
            }),
            created,
            modified: created,
        }
    }

    #[test]
    fn earliest_entry_with_image_wins() {
        let a = entry(1, ContentType::Course, json!({"title": "A"}));
        let b = entry(2, ContentType::Course, json!({"image_url": "http://img/b.jpg"}));
        let c = entry(3, ContentType::Program, json!({"card_image_url": "http://img/c.jpg"}));
        // supplied out of order on purpose
        let entries = vec![c, a, b];
        assert_eq!(highlight_set_card_image(&entries).as_deref(), Some("http://img/b.jpg"));
    }

    #[test]
    fn empty_image_string_does_not_win() {
        let a = entry(1, ContentType::Course, json!({"image_url": ""}));
        let b = entry(2, ContentType::Course, json!({"image_url": "http://img/b.jpg"}));
        assert_eq!(highlight_set_card_image(&[a, b]).as_deref(), Some("http://img/b.jpg"));
    }

    #[test]
    fn empty_set_has_no_image() {
        assert_eq!(highlight_set_card_image(&[]), None);
    }

    #[test]
    fn unsupported_types_are_skipped_for_image() {
        let run = entry(1, ContentType::CourseRun, json!({"image_url": "http://img/run.jpg"}));
        let path = entry(2, ContentType::LearnerPathway, json!({"card_image_url": "http://img/p.jpg"}));
        assert_eq!(highlight_set_card_image(&[run, path]), None);
    }

    #[test]
    fn missing_content_yields_empty_properties() {
        let orphan = HighlightedContent {
            uuid: "hc".into(),
            catalog_highlight_set: None,
            content_metadata: None,
            created: 0,
            modified: 0,
        };
        assert_eq!(orphan.title(), None);
        assert_eq!(orphan.content_key(), None);
        assert_eq!(orphan.content_type(), None);
        assert_eq!(orphan.card_image_url(), None);
        assert!(orphan.authoring_organizations().unwrap().is_empty());
    }

    #[test]
    fn view_carries_derived_fields() {
        let course = entry(1, ContentType::Course, json!({
            "title": "Intro",
            "image_url": "http://img/i.jpg",
            "owners": [{"uuid": "u1", "name": "Org1", "logo_image_url": "http://x/logo.png"}]
        }));
        let set = HighlightSet {
            uuid: "set".into(),
            title: "Picks".into(),
            enterprise_curation: "cur".into(),
            is_published: true,
            created: 0,
            modified: 0,
        };
        let view = HighlightSetView::build(&set, &[course]).unwrap();
        assert_eq!(view.card_image_url.as_deref(), Some("http://img/i.jpg"));
        assert_eq!(view.highlighted_content[0].title.as_deref(), Some("Intro"));
        assert_eq!(view.highlighted_content[0].authoring_organizations[0].name, "Org1");
    }
}
