use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Arc};

use egui::{Color32, ColorImage, RichText, TextureHandle};
use egui_extras::{Size, StripBuilder};
use serde_json::Value;

use crate::config::Config;
use crate::core::controller::{interpret_fetch, interpret_search, search_notice, Controller};
use crate::core::playback::PlaybackPlan;
use crate::error::PlayerError;
use crate::models::{Notice, NoticeLevel, SearchEngine, Theme, TrackSummary};
use crate::player;
use crate::sources::cached::CachedApi;
use crate::sources::remote::RemoteApi;
use crate::sources::MusicApi;

pub type SharedApi = Arc<CachedApi<RemoteApi>>;

const DARK_BACKGROUND: Color32 = Color32::from_rgb(0x0E, 0x11, 0x17);
const DARK_SIDEBAR: Color32 = Color32::from_rgb(0x0B, 0x0D, 0x10);
const DARK_TEXT: Color32 = Color32::from_rgb(0xE6, 0xEE, 0xF3);

enum BgResult {
    SearchDone(Result<Value, PlayerError>),
    FetchDone {
        title: String,
        result: Result<Value, PlayerError>,
    },
    ImageDone(String, Option<Vec<u8>>),
}

/// 한 프레임 동안 눌린 버튼. 그리기가 끝난 뒤 처리한다.
enum Action {
    Play(TrackSummary),
    Add(TrackSummary),
    Remove(String),
}

struct NowPlaying {
    title: String,
    plan: PlaybackPlan,
}

pub struct MusicPlayerApp {
    controller: Controller<SharedApi>,

    // Sidebar
    query: String,
    engine: SearchEngine,

    // Search
    results: Vec<TrackSummary>,
    search_notices: Vec<Notice>,

    // Playback
    now_playing: Option<NowPlaying>,
    player_notice: Option<Notice>,

    // Thumbnails
    image_client: reqwest::blocking::Client,
    textures: HashMap<String, TextureHandle>,
    requested_images: HashSet<String>,

    // Background tasks
    tx: mpsc::Sender<BgResult>,
    rx: mpsc::Receiver<BgResult>,
    is_loading: bool,
    applied_theme: Option<Theme>,
}

impl MusicPlayerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        controller: Controller<SharedApi>,
        config: &Config,
    ) -> Self {
        Self::setup_fallback_fonts(&cc.egui_ctx);
        let (tx, rx) = mpsc::channel();

        let image_client = reqwest::blocking::Client::builder()
            .timeout(config.api.search_timeout())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("썸네일 HTTP 클라이언트 설정 실패, 기본값 사용: {e}");
                reqwest::blocking::Client::new()
            });

        Self {
            controller,
            query: config.ui.default_query.clone(),
            engine: config.ui.default_engine,
            results: Vec::new(),
            search_notices: Vec::new(),
            now_playing: None,
            player_notice: None,
            image_client,
            textures: HashMap::new(),
            requested_images: HashSet::new(),
            tx,
            rx,
            is_loading: false,
            applied_theme: None,
        }
    }

    /// 곡 제목에 자주 나오는 데바나가리/CJK 글자를 위한 대체 폰트를 등록한다.
    fn setup_fallback_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        let font_paths = [
            // macOS
            "/System/Library/Fonts/Supplemental/DevanagariMT.ttc",
            "/System/Library/Fonts/AppleSDGothicNeo.ttc",
            // Linux
            "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf",
            "/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        ];

        let mut installed = 0;
        for (i, path) in font_paths.iter().enumerate() {
            let Ok(font_data) = std::fs::read(path) else {
                continue;
            };

            let name = format!("fallback_font_{i}");
            fonts
                .font_data
                .insert(name.clone(), egui::FontData::from_owned(font_data));

            // 기본 폰트 뒤에 붙여서 라틴 문자는 그대로 기본 폰트를 쓴다.
            for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                if let Some(list) = fonts.families.get_mut(&family) {
                    list.push(name.clone());
                }
            }
            installed += 1;
        }

        if installed > 0 {
            log::debug!("대체 폰트 {installed}개를 등록했습니다");
            ctx.set_fonts(fonts);
        }
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        let theme = self.controller.session().theme;
        if self.applied_theme == Some(theme) {
            return;
        }
        self.applied_theme = Some(theme);

        let visuals = match theme {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => {
                let mut visuals = egui::Visuals::dark();
                visuals.panel_fill = DARK_BACKGROUND;
                visuals.window_fill = DARK_BACKGROUND;
                visuals.override_text_color = Some(DARK_TEXT);
                visuals
            }
        };
        ctx.set_visuals(visuals);
    }

    fn start_search(&mut self, ctx: &egui::Context) {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return;
        }

        let engine = self.engine;
        let api = Arc::clone(self.controller.api());
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        self.is_loading = true;
        self.search_notices = vec![Notice::info(format!(
            "Searching for {query} on {engine}..."
        ))];

        std::thread::spawn(move || {
            let result = api.search(&query, engine);
            log::debug!("검색 캐시 항목 {}개", api.cached_searches());
            let _ = tx.send(BgResult::SearchDone(result));
            ctx.request_repaint();
        });
    }

    fn start_play(&mut self, ctx: &egui::Context, track: TrackSummary) {
        let api = Arc::clone(self.controller.api());
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        self.is_loading = true;
        self.player_notice = Some(Notice::info(format!(
            "Fetching {}...",
            track.display_title()
        )));

        std::thread::spawn(move || {
            let result = api.fetch(&track.id);
            let _ = tx.send(BgResult::FetchDone {
                title: track.display_title().to_string(),
                result,
            });
            ctx.request_repaint();
        });
    }

    fn request_image(&mut self, ctx: &egui::Context, url: &str) {
        if self.textures.contains_key(url) || !self.requested_images.insert(url.to_string()) {
            return;
        }

        let client = self.image_client.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let url = url.to_string();

        std::thread::spawn(move || {
            let bytes = client
                .get(&url)
                .send()
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.bytes())
                .map(|b| b.to_vec());

            let data = match bytes {
                Ok(data) => Some(data),
                Err(e) => {
                    log::debug!("썸네일 다운로드 실패 {url}: {e}");
                    None
                }
            };
            let _ = tx.send(BgResult::ImageDone(url, data));
            ctx.request_repaint();
        });
    }

    fn play_plan(&mut self, title: String, plan: PlaybackPlan) {
        let theme = self.controller.session().theme;
        self.player_notice = match player::open_in_browser(&plan, &title, theme) {
            Ok(_) => None,
            Err(e) => Some(e.notice()),
        };
        self.now_playing = Some(NowPlaying { title, plan });
    }

    fn process_bg_results(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                BgResult::SearchDone(raw) => {
                    self.is_loading = false;
                    let result = interpret_search(raw);
                    self.search_notices = search_notice(&result).into_iter().collect();
                    self.results = result.unwrap_or_default();

                    let keep = image_urls(
                        &self.results,
                        self.controller.session().playlist.tracks(),
                    );
                    prune_images(&mut self.textures, &mut self.requested_images, &keep);
                }
                BgResult::FetchDone { title, result } => {
                    self.is_loading = false;
                    match interpret_fetch(result) {
                        Ok(plan) => self.play_plan(title, plan),
                        Err(e) => self.player_notice = Some(e.notice()),
                    }
                }
                BgResult::ImageDone(url, data) => {
                    // 다운로드 중에 결과가 바뀌어 더 이상 필요 없는 썸네일은 버린다.
                    if !self.requested_images.contains(&url) {
                        continue;
                    }
                    let Some(data) = data else {
                        continue;
                    };
                    if let Ok(img) = image::load_from_memory(&data) {
                        let rgba = img.to_rgba8();
                        let size = [rgba.width() as usize, rgba.height() as usize];
                        let pixels = rgba.into_raw();
                        let color_image = ColorImage::from_rgba_unmultiplied(size, &pixels);
                        let texture =
                            ctx.load_texture(format!("thumb_{url}"), color_image, Default::default());
                        self.textures.insert(url, texture);
                    }
                }
            }
        }
    }

    fn apply_action(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::Play(track) => self.start_play(ctx, track),
            Action::Add(track) => {
                if let Some(notice) = self.controller.add(track) {
                    self.search_notices.push(notice);
                }
            }
            Action::Remove(id) => {
                self.controller.remove(&id);
            }
        }
    }

    fn thumbnail(&mut self, ui: &mut egui::Ui, track: &TrackSummary, max_width: f32) {
        let Some(url) = track.image_url() else {
            return;
        };

        match self.textures.get(url) {
            Some(texture) => {
                let size = texture.size_vec2();
                let scale = (max_width / size.x).min(1.0);
                ui.image(egui::load::SizedTexture::new(texture.id(), size * scale));
            }
            None => {
                let url = url.to_string();
                self.request_image(ui.ctx(), &url);
                ui.allocate_space(egui::vec2(max_width.min(120.0), 48.0));
            }
        }
    }

    fn sidebar(&mut self, ctx: &egui::Context) {
        let mut frame = egui::Frame::side_top_panel(&ctx.style());
        if self.controller.session().theme == Theme::Dark {
            frame = frame.fill(DARK_SIDEBAR);
        }

        egui::SidePanel::left("settings_panel")
            .default_width(260.0)
            .frame(frame)
            .show(ctx, |ui| {
                ui.heading("🎵 Music Player Settings");
                ui.separator();

                ui.label("Theme");
                let mut theme = self.controller.session().theme;
                ui.radio_value(&mut theme, Theme::Light, Theme::Light.label());
                ui.radio_value(&mut theme, Theme::Dark, Theme::Dark.label());
                if theme != self.controller.session().theme {
                    self.controller.set_theme(theme);
                }

                ui.add_space(8.0);
                ui.label("Search for a song or artist");
                let response = ui.text_edit_singleline(&mut self.query);

                ui.add_space(8.0);
                ui.label("Music Source");
                egui::ComboBox::from_id_salt("music_source")
                    .selected_text(self.engine.as_str())
                    .show_ui(ui, |ui| {
                        for engine in SearchEngine::ALL {
                            ui.selectable_value(&mut self.engine, engine, engine.as_str());
                        }
                    });

                ui.add_space(8.0);
                let clicked = ui
                    .add_enabled(!self.is_loading, egui::Button::new("Search"))
                    .clicked();
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if (clicked || submitted) && !self.is_loading {
                    self.start_search(ctx);
                }

                if self.is_loading {
                    ui.spinner();
                }
            });
    }

    fn results_grid(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let results = self.results.clone();
        let enabled = !self.is_loading;

        ui.columns(3, |columns| {
            for (i, track) in results.iter().enumerate() {
                let ui = &mut columns[i % 3];
                ui.group(|ui| {
                    let width = ui.available_width();
                    self.thumbnail(ui, track, width);
                    ui.label(RichText::new(track.display_title()).strong());

                    ui.allocate_ui(egui::vec2(width, 24.0), |ui| {
                        StripBuilder::new(ui)
                            .size(Size::relative(2.0 / 3.0))
                            .size(Size::remainder())
                            .horizontal(|mut strip| {
                                strip.cell(|ui| {
                                    if ui.add_enabled(enabled, egui::Button::new("▶ Play")).clicked() {
                                        actions.push(Action::Play(track.clone()));
                                    }
                                });
                                strip.cell(|ui| {
                                    if ui.button("➕ Add").clicked() {
                                        actions.push(Action::Add(track.clone()));
                                    }
                                });
                            });
                    });
                });
                ui.add_space(6.0);
            }
        });
    }

    fn queue(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let queue = self.controller.session().playlist.tracks().to_vec();
        if queue.is_empty() {
            return;
        }
        let enabled = !self.is_loading;

        ui.separator();
        ui.heading("🎶 Now Playing Queue");

        for (idx, track) in queue.iter().enumerate() {
            egui::CollapsingHeader::new(format!("{}. {}", idx + 1, track.display_title()))
                .id_salt(("queue", &track.id))
                .show(ui, |ui| {
                    self.thumbnail(ui, track, 120.0);
                    let width = ui.available_width();
                    ui.allocate_ui(egui::vec2(width, 24.0), |ui| {
                        StripBuilder::new(ui)
                            .size(Size::relative(0.6))
                            .size(Size::relative(0.2))
                            .size(Size::remainder())
                            .horizontal(|mut strip| {
                                strip.cell(|ui| {
                                    ui.label(track.display_title());
                                });
                                strip.cell(|ui| {
                                    if ui.add_enabled(enabled, egui::Button::new("Play")).clicked() {
                                        actions.push(Action::Play(track.clone()));
                                    }
                                });
                                strip.cell(|ui| {
                                    if ui.button("Remove").clicked() {
                                        actions.push(Action::Remove(track.id.clone()));
                                    }
                                });
                            });
                    });
                });
        }
    }

    fn now_playing_panel(&mut self, ui: &mut egui::Ui) {
        if let Some(notice) = &self.player_notice {
            show_notice(ui, notice);
        }

        let Some(now) = &self.now_playing else {
            return;
        };

        let mut reopen = false;
        ui.group(|ui| {
            ui.label(RichText::new(format!("Now playing: {}", now.title)).strong());
            ui.label(format!("{} · {}", now.plan.kind(), now.plan.url()));
            ui.horizontal(|ui| {
                if ui.button("Open player").clicked() {
                    reopen = true;
                }
                if ui.button("Copy URL").clicked() {
                    ui.ctx().copy_text(now.plan.url().to_string());
                }
            });
        });

        if reopen {
            if let Some(now) = self.now_playing.take() {
                self.play_plan(now.title, now.plan);
            }
        }
    }
}

/// 검색 결과와 대기열이 참조하는 썸네일 URL.
fn image_urls(results: &[TrackSummary], queue: &[TrackSummary]) -> HashSet<String> {
    results
        .iter()
        .chain(queue)
        .filter_map(|t| t.image_url())
        .map(str::to_string)
        .collect()
}

/// `keep`에 없는 썸네일 텍스처와 요청 기록을 지운다.
fn prune_images<T>(
    textures: &mut HashMap<String, T>,
    requested: &mut HashSet<String>,
    keep: &HashSet<String>,
) {
    textures.retain(|url, _| keep.contains(url));
    requested.retain(|url| keep.contains(url));
}

fn show_notice(ui: &mut egui::Ui, notice: &Notice) {
    let colour = match notice.level {
        NoticeLevel::Info => Color32::from_rgb(0x1C, 0x83, 0xE1),
        NoticeLevel::Success => Color32::from_rgb(0x21, 0xC3, 0x54),
        NoticeLevel::Warning => Color32::from_rgb(0xFA, 0xCA, 0x2B),
        NoticeLevel::Error => Color32::from_rgb(0xFF, 0x4B, 0x4B),
    };
    ui.label(RichText::new(&notice.message).color(colour));
}

impl eframe::App for MusicPlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_bg_results(ctx);
        self.apply_theme(ctx);
        self.sidebar(ctx);

        let mut actions = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("🎧 Music Player");
                ui.label(
                    RichText::new("Audio-only playback with HLS (.m3u8) support. No downloads.")
                        .weak(),
                );
                ui.add_space(10.0);

                self.now_playing_panel(ui);

                for notice in &self.search_notices {
                    show_notice(ui, notice);
                }

                if !self.results.is_empty() {
                    ui.add_space(6.0);
                    self.results_grid(ui, &mut actions);
                }

                self.queue(ui, &mut actions);
            });
        });

        for action in actions {
            self.apply_action(ctx, action);
        }
    }
}
