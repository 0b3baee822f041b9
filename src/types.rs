use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CatalogError;

/// Kind of catalog content a metadata record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "course")]
    Course,
    #[serde(rename = "courserun")]
    CourseRun,
    #[serde(rename = "program")]
    Program,
    #[serde(rename = "learnerpathway")]
    LearnerPathway,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Course => "course",
            ContentType::CourseRun => "courserun",
            ContentType::Program => "program",
            ContentType::LearnerPathway => "learnerpathway",
        }
    }

    /// Metadata field holding the card image for this kind, if it has one.
    pub fn card_image_field(&self) -> Option<&'static str> {
        match self {
            ContentType::Course => Some("image_url"),
            ContentType::Program => Some("card_image_url"),
            ContentType::CourseRun | ContentType::LearnerPathway => None,
        }
    }

    /// Metadata field listing the authoring organizations for this kind.
    pub fn organizations_field(&self) -> Option<&'static str> {
        match self {
            ContentType::Course => Some("owners"),
            ContentType::Program => Some("authoring_organizations"),
            ContentType::CourseRun | ContentType::LearnerPathway => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "course" => Ok(ContentType::Course),
            "courserun" => Ok(ContentType::CourseRun),
            "program" => Ok(ContentType::Program),
            "learnerpathway" => Ok(ContentType::LearnerPathway),
            other => Err(CatalogError::UnknownContentType(other.to_string())),
        }
    }
}

/// Semi-structured metadata payload: a JSON object with typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new() -> Self { Self(Map::new()) }

    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    /// String value at `key`; absent, null and non-string values read as `None`.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Array at `key`. Absent or null reads as `Ok(None)`; any other
    /// non-array value is malformed.
    pub fn array_field(&self, key: &str) -> Result<Option<&Vec<Value>>, CatalogError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(CatalogError::malformed(key)),
        }
    }

    pub fn object_field(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get(key).and_then(Value::as_object)
    }

    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl TryFrom<Value> for Metadata {
    type Error = CatalogError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            _ => Err(CatalogError::malformed("json_metadata")),
        }
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self { Self(map) }
}

/// One organization credited with authoring a course or program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoringOrganization {
    pub uuid: String,
    pub name: String,
    pub logo_image_url: Option<String>,
}

impl AuthoringOrganization {
    /// Project a raw owner entry down to the three fields we expose. Every
    /// key must be present; only the logo may be null.
    pub fn from_entry(entry: &Value) -> Result<Self, CatalogError> {
        let obj = entry.as_object().ok_or_else(|| CatalogError::malformed("owner"))?;
        let required = |key: &str| -> Result<String, CatalogError> {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| CatalogError::malformed(key))
        };
        let logo_image_url = match obj.get("logo_image_url") {
            None => return Err(CatalogError::malformed("logo_image_url")),
            Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(CatalogError::malformed("logo_image_url")),
        };
        Ok(Self { uuid: required("uuid")?, name: required("name")?, logo_image_url })
    }
}

/// A persisted course, course run, program or pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub id: String,
    pub content_key: String,
    pub content_type: ContentType,
    pub parent_content_key: Option<String>,
    pub json_metadata: Metadata,
    pub created: i64,
    pub modified: i64,
}

impl ContentMetadata {
    pub fn title(&self) -> Option<&str> { self.json_metadata.str_field("title") }

    /// An empty string counts as no image.
    pub fn card_image_url(&self) -> Option<&str> {
        self.content_type
            .card_image_field()
            .and_then(|field| self.json_metadata.str_field(field))
            .filter(|url| !url.is_empty())
    }

    pub fn authoring_organizations(&self) -> Result<Vec<AuthoringOrganization>, CatalogError> {
        let Some(field) = self.content_type.organizations_field() else { return Ok(Vec::new()); };
        let Some(entries) = self.json_metadata.array_field(field)? else { return Ok(Vec::new()); };
        entries.iter().map(AuthoringOrganization::from_entry).collect()
    }
}

/// Input for creating or refreshing a content metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentMetadataInsert {
    pub content_key: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub parent_content_key: Option<String>,
    #[serde(default)]
    pub json_metadata: Metadata,
}

pub(crate) fn now_micros() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(content_type: ContentType, metadata: Value) -> ContentMetadata {
        ContentMetadata {
            id: "id".into(),
            content_key: "key".into(),
            content_type,
            parent_content_key: None,
            json_metadata: Metadata::try_from(metadata).unwrap(),
            created: 0,
            modified: 0,
        }
    }

    #[test]
    fn content_type_round_trips_wire_names() {
        for ct in [ContentType::Course, ContentType::CourseRun, ContentType::Program, ContentType::LearnerPathway] {
            assert_eq!(ct.as_str().parse::<ContentType>().unwrap(), ct);
        }
        assert!(matches!("video".parse::<ContentType>(), Err(CatalogError::UnknownContentType(_))));
    }

    #[test]
    fn card_image_depends_on_type() {
        let meta = json!({"image_url": "http://img/course.jpg", "card_image_url": "http://img/program.jpg"});
        assert_eq!(record(ContentType::Course, meta.clone()).card_image_url(), Some("http://img/course.jpg"));
        assert_eq!(record(ContentType::Program, meta.clone()).card_image_url(), Some("http://img/program.jpg"));
        assert_eq!(record(ContentType::CourseRun, meta.clone()).card_image_url(), None);
        assert_eq!(record(ContentType::LearnerPathway, meta).card_image_url(), None);
    }

    #[test]
    fn empty_image_string_is_no_image() {
        assert_eq!(record(ContentType::Course, json!({"image_url": ""})).card_image_url(), None);
        assert_eq!(record(ContentType::Program, json!({"card_image_url": ""})).card_image_url(), None);
    }

    #[test]
    fn program_organizations_come_from_authoring_organizations() {
        let meta = json!({
            "owners": [{"uuid": "wrong", "name": "wrong", "logo_image_url": null}],
            "authoring_organizations": [
                {"uuid": "p1", "name": "ProgOrg", "logo_image_url": "http://x/p.png", "extra": 1}
            ]
        });
        let orgs = record(ContentType::Program, meta).authoring_organizations().unwrap();
        assert_eq!(orgs, vec![AuthoringOrganization {
            uuid: "p1".into(),
            name: "ProgOrg".into(),
            logo_image_url: Some("http://x/p.png".into()),
        }]);
    }

    #[test]
    fn missing_owner_field_is_malformed() {
        let meta = json!({"owners": [{"uuid": "u1", "name": "Org1"}]});
        let err = record(ContentType::Course, meta).authoring_organizations().unwrap_err();
        assert!(matches!(err, CatalogError::MalformedMetadata { ref field } if field == "logo_image_url"));
    }

    #[test]
    fn absent_owner_list_reads_as_empty() {
        let orgs = record(ContentType::Course, json!({"title": "t"})).authoring_organizations().unwrap();
        assert!(orgs.is_empty());
    }

    #[test]
    fn metadata_rejects_non_objects() {
        assert!(Metadata::try_from(json!([1, 2])).is_err());
        assert_eq!(Metadata::try_from(Value::Null).unwrap(), Metadata::new());
    }
}
