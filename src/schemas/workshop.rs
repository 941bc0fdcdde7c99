use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::Workshop;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct WorkshopCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "slug must not be empty"))]
    pub(crate) slug: Option<String>,
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default, alias = "startsAt", alias = "date", deserialize_with = "deserialize_optional_datetime")]
    pub(crate) starts_at: Option<OffsetDateTime>,
    #[serde(default = "default_duration", alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default = "default_platform")]
    pub(crate) platform: String,
    #[serde(default, alias = "imageUrl")]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[serde(default = "default_capacity", alias = "maxParticipants")]
    #[validate(range(min = 1, message = "max_participants must be positive"))]
    pub(crate) max_participants: i32,
    #[serde(default = "default_true", alias = "isActive")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct WorkshopUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "slug must not be empty"))]
    pub(crate) slug: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default, alias = "startsAt", alias = "date", deserialize_with = "deserialize_optional_datetime")]
    pub(crate) starts_at: Option<OffsetDateTime>,
    #[serde(default, alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    pub(crate) platform: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    pub(crate) tags: Option<Vec<String>>,
    #[serde(default, alias = "maxParticipants")]
    #[validate(range(min = 1, message = "max_participants must be positive"))]
    pub(crate) max_participants: Option<i32>,
    #[serde(default, alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkshopListQuery {
    pub(crate) search: Option<String>,
    pub(crate) page: Option<i64>,
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkshopResponse {
    pub(crate) id: String,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) starts_at: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) platform: String,
    pub(crate) image_url: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) max_participants: i32,
    pub(crate) registered_count: i32,
    pub(crate) seats_left: i32,
    pub(crate) is_active: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl WorkshopResponse {
    pub(crate) fn from_db(workshop: Workshop) -> Self {
        Self {
            seats_left: (workshop.max_participants - workshop.registered_count).max(0),
            id: workshop.id,
            slug: workshop.slug,
            title: workshop.title,
            description: workshop.description,
            starts_at: format_optional(workshop.starts_at),
            duration_minutes: workshop.duration_minutes,
            platform: workshop.platform,
            image_url: workshop.image_url,
            tags: workshop.tags.0,
            max_participants: workshop.max_participants,
            registered_count: workshop.registered_count,
            is_active: workshop.is_active,
            created_by: workshop.created_by,
            created_at: format_primitive(workshop.created_at),
            updated_at: format_primitive(workshop.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RegistrationResponse {
    pub(crate) workshop_id: String,
    pub(crate) registered: bool,
    pub(crate) already_registered: bool,
}

fn parse_datetime(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }
    // datetime-local inputs carry no offset; treat them as UTC.
    let candidate = match raw.len() {
        16 => format!("{raw}:00Z"),
        19 => format!("{raw}Z"),
        _ => return None,
    };
    OffsetDateTime::parse(&candidate, &Rfc3339).ok()
}

pub(crate) fn deserialize_optional_datetime<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}"))),
        None => Ok(None),
    }
}

fn default_duration() -> i32 {
    60
}

fn default_platform() -> String {
    "online".to_string()
}

fn default_capacity() -> i32 {
    50
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_and_offset_datetimes() {
        let local = parse_datetime("2026-03-01T18:30").unwrap();
        assert_eq!(local.hour(), 18);
        assert_eq!(local.offset(), time::UtcOffset::UTC);

        let offset = parse_datetime("2026-03-01T18:30:00+03:00").unwrap();
        assert_eq!(offset.to_offset(time::UtcOffset::UTC).hour(), 15);

        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn create_applies_defaults() {
        let payload: WorkshopCreate =
            serde_json::from_value(serde_json::json!({"title": "Intro to K8s"})).unwrap();
        assert_eq!(payload.max_participants, 50);
        assert!(payload.is_active);
        assert!(payload.starts_at.is_none());
        assert!(payload.validate().is_ok());
    }
}
