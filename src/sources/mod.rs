pub mod cached;
pub mod remote;

use std::sync::Arc;

use serde_json::Value;

use crate::error::PlayerError;
use crate::models::SearchEngine;

/// 원격 음악 API 트레이트.
/// 응답 본문은 해석하지 않은 JSON 그대로 돌려주고, 해석은 컨트롤러가 맡는다.
pub trait MusicApi: Send + Sync {
    /// 검색어와 소스로 트랙을 검색한다.
    fn search(&self, query: &str, engine: SearchEngine) -> Result<Value, PlayerError>;
    /// 트랙 ID로 재생 가능한 오디오 URL을 조회한다.
    fn fetch(&self, id: &str) -> Result<Value, PlayerError>;
}

impl<T: MusicApi + ?Sized> MusicApi for Arc<T> {
    fn search(&self, query: &str, engine: SearchEngine) -> Result<Value, PlayerError> {
        (**self).search(query, engine)
    }

    fn fetch(&self, id: &str) -> Result<Value, PlayerError> {
        (**self).fetch(id)
    }
}
