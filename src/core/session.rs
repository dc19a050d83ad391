use crate::core::playlist::Playlist;
use crate::models::Theme;

/// 한 사용자 세션의 상태. 세션이 끝나면 함께 사라지며 저장하지 않는다.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub playlist: Playlist,
    pub theme: Theme,
}

impl Session {
    pub fn new() -> Self {
        Self {
            playlist: Playlist::new(),
            theme: Theme::Light,
        }
    }
}
