use thiserror::Error;

use crate::models::Notice;

/// 검색/재생 동작 하나에서 발생할 수 있는 오류.
/// 모든 오류는 해당 동작에서 끝나며 자동 재시도하지 않는다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Network/API error: {0}")]
    Network(String),

    #[error("Unexpected response format: {0}")]
    Format(String),

    #[error("No results or unexpected API response.")]
    NoResults,

    #[error("No audio URL returned for this track.")]
    NoAudio,

    #[error("API fetch returned non-200 status{}", .0.map(|s| format!(" ({s})")).unwrap_or_default())]
    FetchFailed(Option<i64>),

    #[error("Invalid audio URL.")]
    InvalidUrl,

    #[error("HLS playback is not supported here: {0}")]
    UnsupportedPlayback(String),
}

impl PlayerError {
    /// 화면에 표시할 메시지로 변환한다. 결과 없음은 경고, 나머지는 오류로 표시한다.
    pub fn notice(&self) -> Notice {
        match self {
            PlayerError::NoResults => Notice::warning(self.to_string()),
            _ => Notice::error(self.to_string()),
        }
    }
}

impl From<reqwest::Error> for PlayerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlayerError::Format(err.to_string())
        } else {
            PlayerError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoticeLevel;

    #[test]
    fn test_no_results_is_warning() {
        let notice = PlayerError::NoResults.notice();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "No results or unexpected API response.");
    }

    #[test]
    fn test_network_is_distinct_from_no_results() {
        let network = PlayerError::Network("operation timed out".to_string()).notice();
        assert_eq!(network.level, NoticeLevel::Error);
        assert_ne!(network.message, PlayerError::NoResults.notice().message);
        assert!(network.message.contains("timed out"));
    }

    #[test]
    fn test_fetch_failed_message() {
        assert_eq!(
            PlayerError::FetchFailed(Some(404)).to_string(),
            "API fetch returned non-200 status (404)"
        );
        assert_eq!(
            PlayerError::FetchFailed(None).to_string(),
            "API fetch returned non-200 status"
        );
    }
}
