use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::PlayerError;
use crate::models::SearchEngine;
use crate::sources::MusicApi;

/// 원격 음악 API 클라이언트.
/// 인증 없이 `/search`, `/fetch` 두 엔드포인트만 호출한다.
pub struct RemoteApi {
    client: reqwest::blocking::Client,
    base: Url,
    search_timeout: Duration,
    fetch_timeout: Duration,
}

impl RemoteApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = Self::parse_base(&config.effective_base_url())?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("music-player/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("HTTP 클라이언트 생성에 실패했습니다")?;

        Ok(Self {
            client,
            base,
            search_timeout: config.search_timeout(),
            fetch_timeout: config.fetch_timeout(),
        })
    }

    /// 기본 주소 뒤에 `/`를 붙여 `join`이 마지막 경로를 덮어쓰지 않게 한다.
    fn parse_base(raw: &str) -> Result<Url> {
        let mut normalized = raw.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Url::parse(&normalized).with_context(|| format!("잘못된 API 주소입니다: {raw}"))
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, PlayerError> {
        self.base
            .join(path)
            .map_err(|e| PlayerError::Network(format!("invalid endpoint {path}: {e}")))
    }

    fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Value, PlayerError> {
        let url = self.endpoint(path)?;
        log::debug!("GET {url} {params:?}");

        let result = self
            .client
            .get(url.clone())
            .query(params)
            .timeout(timeout)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<Value>());

        match result {
            Ok(body) => {
                log::debug!("GET {url} 완료");
                Ok(body)
            }
            Err(e) => {
                log::debug!("GET {url} 실패: {e}");
                Err(PlayerError::from(e))
            }
        }
    }
}

impl MusicApi for RemoteApi {
    fn search(&self, query: &str, engine: SearchEngine) -> Result<Value, PlayerError> {
        self.get_json(
            "search",
            &[("q", query), ("searchEngine", engine.as_str())],
            self.search_timeout,
        )
    }

    fn fetch(&self, id: &str) -> Result<Value, PlayerError> {
        self.get_json("fetch", &[("id", id)], self.fetch_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use crate::core::controller::{interpret_search, search_notice};

    /// 환경 변수(`MUSIC_PLAYER_API_BASE`)를 읽지 않고 주어진 주소로 만든다.
    fn local_api(base: &str, timeout: Duration) -> RemoteApi {
        RemoteApi {
            client: reqwest::blocking::Client::new(),
            base: RemoteApi::parse_base(base).unwrap(),
            search_timeout: timeout,
            fetch_timeout: timeout,
        }
    }

    /// 요청 하나에 정해진 응답을 돌려주는 로컬 HTTP 서버. 기본 주소를 반환한다.
    fn serve_once(status: &str, content_type: &str, body: &str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            thread::sleep(delay);
            // 클라이언트가 먼저 끊었을 수 있다.
            let _ = stream.write_all(response.as_bytes());
        });

        format!("http://{addr}")
    }

    #[test]
    fn test_endpoints_from_bare_host() {
        let api = local_api("https://musicapi.x007.workers.dev", Duration::from_secs(1));
        assert_eq!(
            api.endpoint("search").unwrap().as_str(),
            "https://musicapi.x007.workers.dev/search"
        );
        assert_eq!(
            api.endpoint("fetch").unwrap().as_str(),
            "https://musicapi.x007.workers.dev/fetch"
        );
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let api = local_api("http://localhost:8080/api", Duration::from_secs(1));
        assert_eq!(
            api.endpoint("search").unwrap().as_str(),
            "http://localhost:8080/api/search"
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(RemoteApi::parse_base("not a url").is_err());
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let api = local_api("http://127.0.0.1:9", Duration::from_secs(1));

        match api.search("anything", SearchEngine::Gaama) {
            Err(PlayerError::Network(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn test_server_error_status_is_network_error() {
        let base = serve_once(
            "500 Internal Server Error",
            "application/json",
            r#"{"status":500}"#,
            Duration::ZERO,
        );
        let api = local_api(&base, Duration::from_secs(5));

        match api.search("Arijit Singh", SearchEngine::Gaama) {
            Err(PlayerError::Network(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_is_format_error() {
        let base = serve_once(
            "200 OK",
            "text/html",
            "<html><body>maintenance</body></html>",
            Duration::ZERO,
        );
        let api = local_api(&base, Duration::from_secs(5));

        match api.fetch("abc") {
            Err(PlayerError::Format(_)) => {}
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_slow_server_times_out_as_network_error() {
        let base = serve_once(
            "200 OK",
            "application/json",
            r#"{"status":200,"response":[]}"#,
            Duration::from_secs(3),
        );
        let api = local_api(&base, Duration::from_secs(1));

        let result = interpret_search(api.search("Arijit Singh", SearchEngine::Gaama));
        match &result {
            Err(PlayerError::Network(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
        // 시간 초과는 "검색 결과 없음"과 구분된다.
        let notice = search_notice(&result).unwrap();
        assert_ne!(notice.message, "No songs found.");
    }

    #[test]
    fn test_empty_search_over_http_reports_no_songs() {
        let base = serve_once(
            "200 OK",
            "application/json",
            r#"{"status":200,"response":[]}"#,
            Duration::ZERO,
        );
        let api = local_api(&base, Duration::from_secs(5));

        let result = interpret_search(api.search("zzzz", SearchEngine::Wunk));
        assert_eq!(result, Ok(vec![]));
        assert_eq!(search_notice(&result).unwrap().message, "No songs found.");
    }

    /// 실제 원격 API를 호출하는 통합 테스트.
    /// 네트워크 접근이 필요하므로 기본 테스트에서는 제외한다.
    /// 실행: cargo test remote -- --ignored
    #[test]
    #[ignore]
    fn test_search_live_api() {
        let api = RemoteApi::new(&ApiConfig::default()).expect("RemoteApi 생성 실패");
        let body = api
            .search("Arijit Singh", SearchEngine::Gaama)
            .expect("검색 실패");

        assert!(body.is_object(), "응답이 객체가 아님: {body}");
        println!("status: {:?}", body.get("status"));
    }
}
