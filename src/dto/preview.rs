use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Lightweight game summary shown while handing off to the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GamePreview {
    /// Identifier as reported by the preview API.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cover image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// First release year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    /// Platform names such as `iOS` or `PC`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_names: Option<Vec<String>>,
}

/// Reason a preview body was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewShapeError {
    /// The body is not a JSON object.
    NotAnObject,
    /// Two spellings of the same field were sent together.
    ConflictingKeys,
    /// No string or numeric `id`.
    MissingId,
    /// No string `name`.
    MissingName,
}

impl PreviewShapeError {
    /// Short description used in error messages.
    pub fn reason(self) -> &'static str {
        match self {
            PreviewShapeError::NotAnObject => "body is not an object",
            PreviewShapeError::ConflictingKeys => "conflicting key spellings",
            PreviewShapeError::MissingId => "missing id",
            PreviewShapeError::MissingName => "missing string name",
        }
    }
}

/// Upstream body shape, tolerant of the spellings the preview API has used.
/// Values of the wrong type read as absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreview {
    #[serde(default, deserialize_with = "id_or_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    name: Option<String>,
    #[serde(
        default,
        alias = "cover_url",
        alias = "coverImage",
        alias = "cover",
        deserialize_with = "cover_or_none"
    )]
    cover_url: Option<String>,
    #[serde(
        default,
        alias = "release_year",
        alias = "firstReleaseYear",
        alias = "year",
        deserialize_with = "year_or_none"
    )]
    release_year: Option<i32>,
    #[serde(
        default,
        alias = "platform_names",
        alias = "platforms",
        deserialize_with = "platforms_or_none"
    )]
    platform_names: Option<Vec<String>>,
}

impl TryFrom<RawPreview> for GamePreview {
    type Error = PreviewShapeError;

    fn try_from(raw: RawPreview) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.ok_or(PreviewShapeError::MissingId)?,
            name: raw.name.ok_or(PreviewShapeError::MissingName)?,
            cover_url: raw.cover_url,
            release_year: raw.release_year,
            platform_names: raw.platform_names,
        })
    }
}

impl GamePreview {
    /// Map an upstream JSON body, accepting the alternate key spellings the API has used.
    pub fn from_json(body: &Value) -> Result<Self, PreviewShapeError> {
        if !body.is_object() {
            return Err(PreviewShapeError::NotAnObject);
        }
        let raw = RawPreview::deserialize(body).map_err(|_| PreviewShapeError::ConflictingKeys)?;
        raw.try_into()
    }
}

fn id_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        _ => None,
    })
}

fn cover_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(url) if !url.is_empty() => Some(url),
        Value::Object(cover) => cover.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

fn year_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(year) => year.as_i64().and_then(|year| i32::try_from(year).ok()),
        Value::String(year) => year.trim().parse().ok(),
        _ => None,
    })
}

fn platforms_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name),
                Value::Object(platform) => {
                    platform.get("name").and_then(Value::as_str).map(str::to_string)
                }
                _ => None,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_canonical_body() {
        let body = json!({
            "id": 123,
            "name": "Example Game",
            "coverUrl": "x.png",
            "releaseYear": 2020,
            "platformNames": ["iOS", "Android"]
        });

        assert_eq!(
            GamePreview::from_json(&body),
            Ok(GamePreview {
                id: "123".into(),
                name: "Example Game".into(),
                cover_url: Some("x.png".into()),
                release_year: Some(2020),
                platform_names: Some(vec!["iOS".into(), "Android".into()]),
            })
        );
    }

    #[test]
    fn accepts_alternate_spellings() {
        let body = json!({
            "id": "abc",
            "name": "Other",
            "cover": {"url": "https://img/cover.jpg"},
            "release_year": "1998",
            "platforms": [{"name": "PC"}, "Switch", 7]
        });

        let preview = GamePreview::from_json(&body).unwrap();
        assert_eq!(preview.cover_url.as_deref(), Some("https://img/cover.jpg"));
        assert_eq!(preview.release_year, Some(1998));
        assert_eq!(
            preview.platform_names,
            Some(vec!["PC".to_string(), "Switch".to_string()])
        );
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let preview = GamePreview::from_json(&json!({"id": 1, "name": "Bare"})).unwrap();
        assert_eq!(preview.cover_url, None);
        assert_eq!(preview.release_year, None);
        assert_eq!(preview.platform_names, None);
    }

    #[test]
    fn rejects_missing_id_or_name() {
        assert_eq!(
            GamePreview::from_json(&json!({"name": "No id"})),
            Err(PreviewShapeError::MissingId)
        );
        assert_eq!(
            GamePreview::from_json(&json!({"id": 1, "name": 5})),
            Err(PreviewShapeError::MissingName)
        );
        assert_eq!(
            GamePreview::from_json(&json!(["not", "an", "object"])),
            Err(PreviewShapeError::NotAnObject)
        );
    }

    #[test]
    fn wrongly_typed_optionals_read_as_absent() {
        let body = json!({
            "id": " 7 ",
            "name": "Loose",
            "coverUrl": 12,
            "year": "soon",
            "platforms": "PC"
        });

        assert_eq!(
            GamePreview::from_json(&body),
            Ok(GamePreview {
                id: "7".into(),
                name: "Loose".into(),
                cover_url: None,
                release_year: None,
                platform_names: None,
            })
        );
    }

    #[test]
    fn rejects_two_spellings_of_one_field() {
        let body = json!({"id": 1, "name": "Twice", "coverUrl": "a.png", "cover": "b.png"});
        assert_eq!(GamePreview::from_json(&body), Err(PreviewShapeError::ConflictingKeys));
    }

    #[test]
    fn serializes_camel_case_and_skips_missing() {
        let preview = GamePreview {
            id: "1".into(),
            name: "A".into(),
            cover_url: None,
            release_year: Some(2001),
            platform_names: None,
        };
        assert_eq!(
            serde_json::to_value(&preview).unwrap(),
            json!({"id": "1", "name": "A", "releaseYear": 2001})
        );
    }
}
