use serde_json::Value;

use crate::core::playback::PlaybackPlan;
use crate::core::session::Session;
use crate::error::PlayerError;
use crate::models::{Notice, SearchEngine, Theme, TrackSummary};
use crate::sources::MusicApi;

/// 사용자 동작(검색, 재생, 추가, 제거, 테마 전환)마다 하나의 핸들러를 제공한다.
/// 세션 상태는 컨트롤러가 소유한다.
pub struct Controller<A> {
    api: A,
    session: Session,
}

impl<A: MusicApi> Controller<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            session: Session::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 검색어 앞뒤 공백을 제거한 뒤 검색한다. 빈 검색어는 요청하지 않는다.
    pub fn search(
        &self,
        query: &str,
        engine: SearchEngine,
    ) -> Result<Vec<TrackSummary>, PlayerError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PlayerError::EmptyQuery);
        }
        log::info!("searching {query:?} on {engine}");
        interpret_search(self.api.search(query, engine))
    }

    /// 트랙의 오디오 URL을 조회하고 재생 방식을 정한다. 실패해도 세션은 바뀌지 않는다.
    pub fn play(&self, id: &str) -> Result<PlaybackPlan, PlayerError> {
        log::info!("fetching audio for {id}");
        interpret_fetch(self.api.fetch(id))
    }

    /// 대기열에 추가되면 성공 메시지를 돌려준다. 이미 있으면 `None`.
    pub fn add(&mut self, track: TrackSummary) -> Option<Notice> {
        let title = track.display_title().to_string();
        if self.session.playlist.add(track) {
            Some(Notice::success(format!("Added: {title}")))
        } else {
            None
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.session.playlist.remove(id)
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.session.theme = theme;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.session.theme = self.session.theme.toggled();
        self.session.theme
    }
}

/// 검색 응답을 해석한다.
///
/// - `status == 200`이고 `response`가 비어 있으면 빈 목록 ("No songs found.")
/// - 객체가 아니거나 `status != 200`이면 [`PlayerError::NoResults`]
/// - 목록 항목을 트랙으로 해석할 수 없으면 [`PlayerError::Format`]
pub fn interpret_search(
    result: Result<Value, PlayerError>,
) -> Result<Vec<TrackSummary>, PlayerError> {
    let body = result?;
    if !body.is_object() || status_of(&body) != Some(200) {
        return Err(PlayerError::NoResults);
    }

    let items = match body.get("response") {
        None => return Ok(Vec::new()),
        Some(v) if is_falsy(v) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(PlayerError::Format(format!(
                "search response is not a list: {other}"
            )))
        }
    };

    items
        .iter()
        .map(|item| {
            serde_json::from_value::<TrackSummary>(item.clone())
                .map_err(|e| PlayerError::Format(format!("invalid track {item}: {e}")))
        })
        .collect()
}

/// 조회 응답을 해석하고 재생 방식을 결정한다.
pub fn interpret_fetch(result: Result<Value, PlayerError>) -> Result<PlaybackPlan, PlayerError> {
    let body = result?;
    if !body.is_object() {
        return Err(PlayerError::Format(
            "Unexpected fetch response format.".to_string(),
        ));
    }

    match status_of(&body) {
        Some(200) => match body.get("response") {
            Some(url) if !is_falsy(url) => PlaybackPlan::dispatch(url),
            _ => Err(PlayerError::NoAudio),
        },
        status => Err(PlayerError::FetchFailed(status)),
    }
}

/// 검색 결과를 화면 메시지로 바꾼다. 결과가 있으면 메시지가 없다.
pub fn search_notice(result: &Result<Vec<TrackSummary>, PlayerError>) -> Option<Notice> {
    match result {
        Ok(tracks) if tracks.is_empty() => Some(Notice::info("No songs found.")),
        Ok(_) => None,
        Err(PlayerError::EmptyQuery) => None,
        Err(e) => Some(e.notice()),
    }
}

fn status_of(body: &Value) -> Option<i64> {
    let status = body.get("status")?;
    status.as_i64().or_else(|| {
        status
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
