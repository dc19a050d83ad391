use crate::models::TrackSummary;

/// 세션 동안만 유지되는 재생 대기열.
/// 같은 `id`를 가진 트랙은 두 번 들어가지 않는다.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<TrackSummary>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// 트랙을 끝에 추가한다. 이미 같은 `id`가 있으면 아무것도 하지 않고 `false`를 돌려준다.
    pub fn add(&mut self, track: TrackSummary) -> bool {
        if self.contains(&track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// `id`가 일치하는 항목을 모두 제거한다. 제거된 항목이 있으면 `true`.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.id != id);
        self.tracks.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == id)
    }

    pub fn tracks(&self) -> &[TrackSummary] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
