use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 검색 결과로 받은 트랙 요약 정보.
/// 소스마다 추가 필드가 다르므로 알려지지 않은 필드는 `extra`에 그대로 보존한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackSummary {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            img: None,
            extra: Map::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => "Untitled",
        }
    }

    /// 이미지 URL이 비어 있으면 `None`.
    pub fn image_url(&self) -> Option<&str> {
        self.img.as_deref().filter(|s| !s.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "track id must be a string or number, got {other}"
        ))),
    }
}

/// 원격 API가 지원하는 검색 소스.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Gaama,
    Seevn,
    Hunjama,
    Mtmusic,
    Wunk,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 5] = [
        SearchEngine::Gaama,
        SearchEngine::Seevn,
        SearchEngine::Hunjama,
        SearchEngine::Mtmusic,
        SearchEngine::Wunk,
    ];

    /// `searchEngine` 쿼리 파라미터로 전송되는 식별자.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Gaama => "gaama",
            SearchEngine::Seevn => "seevn",
            SearchEngine::Hunjama => "hunjama",
            SearchEngine::Mtmusic => "mtmusic",
            SearchEngine::Wunk => "wunk",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

/// 사용자에게 보여줄 메시지의 수준.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_keeps_extra_fields() {
        let track: TrackSummary = serde_json::from_value(json!({
            "id": "abc",
            "title": "Tum Hi Ho",
            "img": "http://x/cover.jpg",
            "artist": "Arijit Singh",
            "duration": 262
        }))
        .unwrap();

        assert_eq!(track.id, "abc");
        assert_eq!(track.display_title(), "Tum Hi Ho");
        assert_eq!(track.image_url(), Some("http://x/cover.jpg"));
        assert_eq!(track.extra.get("artist"), Some(&json!("Arijit Singh")));
        assert_eq!(track.extra.get("duration"), Some(&json!(262)));
    }

    #[test]
    fn test_numeric_id_is_normalised() {
        let track: TrackSummary = serde_json::from_value(json!({ "id": 42 })).unwrap();
        assert_eq!(track.id, "42");
        assert_eq!(track.display_title(), "Untitled");
        assert!(track.image_url().is_none());
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let result = serde_json::from_value::<TrackSummary>(json!({ "title": "No id" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_engine_identifiers() {
        let ids: Vec<&str> = SearchEngine::ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(ids, ["gaama", "seevn", "hunjama", "mtmusic", "wunk"]);
        assert_eq!(SearchEngine::default(), SearchEngine::Gaama);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
