use serde_json::Value;

use crate::error::PlayerError;
use crate::models::Theme;

pub const HLS_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/hls.js@latest";

/// 오디오 URL에 따라 선택된 재생 방식.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackPlan {
    /// `.m3u8` 스트림. hls.js로 재생하고, 없으면 브라우저 기본 HLS로 대체한다.
    Hls { url: String },
    /// 단일 파일 오디오.
    Direct { url: String },
}

impl PlaybackPlan {
    /// API 응답의 `response` 값으로 재생 방식을 결정한다.
    /// 문자열이 아니거나 비어 있으면 `InvalidUrl`.
    pub fn dispatch(value: &Value) -> Result<Self, PlayerError> {
        match value.as_str() {
            Some(url) => Self::from_url(url),
            None => Err(PlayerError::InvalidUrl),
        }
    }

    pub fn from_url(url: &str) -> Result<Self, PlayerError> {
        if url.is_empty() {
            return Err(PlayerError::InvalidUrl);
        }

        if is_hls(url) {
            Ok(PlaybackPlan::Hls {
                url: url.to_string(),
            })
        } else {
            Ok(PlaybackPlan::Direct {
                url: url.to_string(),
            })
        }
    }

    pub fn url(&self) -> &str {
        match self {
            PlaybackPlan::Hls { url } | PlaybackPlan::Direct { url } => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackPlan::Hls { .. } => "HLS stream",
            PlaybackPlan::Direct { .. } => "direct audio",
        }
    }

    /// 플레이어 HTML 조각.
    pub fn embed_html(&self) -> String {
        match self {
            PlaybackPlan::Hls { url } => {
                let src = js_string(url);
                format!(
                    concat!(
                        r#"<script src="{cdn}"></script>"#,
                        r#"<audio id="audio" controls autoplay style="width:100%"></audio>"#,
                        "<script>",
                        r#"var audio = document.getElementById("audio");"#,
                        "if (window.Hls && Hls.isSupported()) {{",
                        "  var hls = new Hls();",
                        "  hls.loadSource({src});",
                        "  hls.attachMedia(audio);",
                        r#"}} else if (audio.canPlayType("application/vnd.apple.mpegurl")) {{"#,
                        "  audio.src = {src};",
                        "}} else {{",
                        r#"  audio.outerHTML = "<p>Your browser does not support HLS playback.</p>";"#,
                        "}}",
                        "</script>"
                    ),
                    cdn = HLS_JS_CDN,
                    src = src
                )
            }
            PlaybackPlan::Direct { url } => format!(
                r#"<audio controls autoplay style="width:100%" src="{}"></audio>"#,
                html_attr(url)
            ),
        }
    }

    /// 브라우저에서 바로 열 수 있는 전체 HTML 문서.
    pub fn page_html(&self, title: &str, theme: Theme) -> String {
        let (background, foreground) = match theme {
            Theme::Light => ("#FFFFFF", "#31333F"),
            Theme::Dark => ("#0E1117", "#E6EEF3"),
        };

        format!(
            concat!(
                "<!DOCTYPE html>\n",
                "<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n",
                "<style>body {{ background-color: {bg}; color: {fg}; font-family: sans-serif; margin: 2em; }}</style>\n",
                "</head>\n<body>\n<h3>{title}</h3>\n{embed}\n</body>\n</html>\n"
            ),
            title = html_text(title),
            bg = background,
            fg = foreground,
            embed = self.embed_html()
        )
    }
}

fn is_hls(url: &str) -> bool {
    const SUFFIX: &str = ".m3u8";
    url.len() >= SUFFIX.len()
        && url
            .get(url.len() - SUFFIX.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(SUFFIX))
}

/// `<script>` 안에 넣을 수 있는 JS 문자열 리터럴.
fn js_string(s: &str) -> String {
    let quoted = serde_json::Value::String(s.to_string()).to_string();
    quoted.replace("</", "<\\/")
}

fn html_attr(s: &str) -> String {
    html_text(s).replace('"', "&quot;").replace('\'', "&#39;")
}

fn html_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
