use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::SearchEngine;

pub const DEFAULT_API_BASE: &str = "https://musicapi.x007.workers.dev";

/// API 기본 주소를 덮어쓰는 환경 변수.
pub const API_BASE_ENV: &str = "MUSIC_PLAYER_API_BASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub search_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            search_timeout_secs: 15,
            fetch_timeout_secs: 20,
        }
    }
}

impl ApiConfig {
    /// 환경 변수가 설정되어 있으면 그 값을, 아니면 설정 파일의 값을 사용한다.
    pub fn effective_base_url(&self) -> String {
        match std::env::var(API_BASE_ENV) {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => self.base_url.clone(),
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            ttl_secs: 600,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub default_engine: SearchEngine,
    pub default_query: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_engine: SearchEngine::Gaama,
            default_query: "Arijit Singh".to_string(),
        }
    }
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("music-player")
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("설정 파일을 해석할 수 없어 기본값을 사용합니다: {e}");
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    log::debug!("설정을 저장했습니다: {}", path.display());
    Ok(())
}
