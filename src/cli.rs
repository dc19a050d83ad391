use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input, Select};

use crate::config::{self, Config};
use crate::core::controller::{search_notice, Controller};
use crate::core::playback::PlaybackPlan;
use crate::models::{Notice, NoticeLevel, SearchEngine, TrackSummary};
use crate::player;
use crate::sources::cached::CachedApi;
use crate::sources::remote::RemoteApi;

#[derive(Parser)]
#[command(name = "music-player", about = "Search a music catalog, preview tracks and keep a play queue")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// GUI 모드로 실행
    #[arg(long)]
    pub gui: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 트랙 검색
    Search {
        /// 곡 또는 아티스트 이름
        query: String,
        /// 검색 소스
        #[arg(short, long, value_enum)]
        engine: Option<SearchEngine>,
    },
    /// 트랙 ID로 오디오 URL을 조회하고 재생 방식 표시
    Play {
        /// 트랙 ID
        id: String,
        /// 브라우저 플레이어로 열기
        #[arg(long)]
        open: bool,
    },
    /// 검색, 재생, 대기열을 다루는 대화형 세션
    Session {
        #[arg(short, long, value_enum)]
        engine: Option<SearchEngine>,
    },
    /// API 주소와 기본값 설정
    Config,
}

pub type AppController = Controller<CachedApi<RemoteApi>>;

pub fn build_controller(cfg: &Config) -> Result<AppController> {
    let remote = RemoteApi::new(&cfg.api).context("API 클라이언트를 만들 수 없습니다")?;
    Ok(Controller::new(CachedApi::new(remote, &cfg.cache)))
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Search { query, engine }) => cmd_search(&query, engine),
        Some(Commands::Play { id, open }) => cmd_play(&id, open),
        Some(Commands::Session { engine }) => cmd_session(engine),
        Some(Commands::Config) => cmd_config(),
        None => {
            if cli.gui {
                launch_gui()
            } else {
                println!("Usage: music-player <COMMAND> or music-player --gui");
                println!("Run music-player --help for more information.");
                Ok(())
            }
        }
    }
}

#[cfg(feature = "gui")]
fn launch_gui() -> Result<()> {
    crate::gui::launch(config::load_config())
}

#[cfg(not(feature = "gui"))]
fn launch_gui() -> Result<()> {
    anyhow::bail!("GUI support is not enabled. Rebuild with: cargo build --features gui")
}

fn print_notice(notice: &Notice) {
    let prefix = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    println!("[{prefix}] {}", notice.message);
}

fn results_table(tracks: &[TrackSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Title", "Image"]);
    for (i, track) in tracks.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&track.id),
            Cell::new(track.display_title()),
            Cell::new(track.image_url().unwrap_or("-")),
        ]);
    }
    table
}

/// 검색을 실행하고 결과 또는 메시지를 출력한다. 결과가 없으면 빈 목록.
fn search_and_print(
    controller: &AppController,
    query: &str,
    engine: SearchEngine,
) -> Vec<TrackSummary> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    print_notice(&Notice::info(format!("Searching for {query} on {engine}...")));
    let result = controller.search(query, engine);
    if let Some(notice) = search_notice(&result) {
        print_notice(&notice);
    }

    match result {
        Ok(tracks) => {
            if !tracks.is_empty() {
                println!("{}", results_table(&tracks));
            }
            tracks
        }
        Err(_) => Vec::new(),
    }
}

fn describe_plan(plan: &PlaybackPlan) {
    println!("{}: {}", plan.kind(), plan.url());
}

fn play_and_print(controller: &AppController, track_id: &str, title: &str, open: bool) {
    match controller.play(track_id) {
        Ok(plan) => {
            describe_plan(&plan);
            if open {
                match player::open_in_browser(&plan, title, controller.session().theme) {
                    Ok(path) => println!("Opened player: {}", path.display()),
                    Err(e) => print_notice(&e.notice()),
                }
            }
        }
        Err(e) => print_notice(&e.notice()),
    }
}

fn cmd_search(query: &str, engine: Option<SearchEngine>) -> Result<()> {
    let cfg = config::load_config();
    let controller = build_controller(&cfg)?;
    let engine = engine.unwrap_or(cfg.ui.default_engine);

    if query.trim().is_empty() {
        println!("Enter a song or artist to search for.");
        return Ok(());
    }

    search_and_print(&controller, query, engine);
    Ok(())
}

fn cmd_play(id: &str, open: bool) -> Result<()> {
    let cfg = config::load_config();
    let controller = build_controller(&cfg)?;
    play_and_print(&controller, id, id, open);
    Ok(())
}

fn pick_track<'a>(prompt: &str, tracks: &'a [TrackSummary]) -> Result<Option<&'a TrackSummary>> {
    if tracks.is_empty() {
        println!("Nothing to choose from.");
        return Ok(None);
    }

    let mut items: Vec<String> = tracks
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t.display_title()))
        .collect();
    items.push("Cancel".to_string());

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;

    Ok(tracks.get(selection))
}

fn cmd_session(engine: Option<SearchEngine>) -> Result<()> {
    let cfg = config::load_config();
    let mut controller = build_controller(&cfg)?;
    let mut engine = engine.unwrap_or(cfg.ui.default_engine);
    let mut query = cfg.ui.default_query.clone();
    let mut results: Vec<TrackSummary> = Vec::new();

    loop {
        let theme_item = format!("Toggle theme (now {})", controller.session().theme.label());
        let queue_item = format!("Show queue ({})", controller.session().playlist.len());
        let items = [
            "Search",
            "Play a result",
            "Add a result to the queue",
            queue_item.as_str(),
            "Play from the queue",
            "Remove from the queue",
            theme_item.as_str(),
            "Quit",
        ];

        let choice = Select::new()
            .with_prompt("Music Player")
            .items(&items)
            .default(0)
            .interact()?;

        match choice {
            0 => {
                query = Input::new()
                    .with_prompt("Search for a song or artist")
                    .with_initial_text(query.clone())
                    .allow_empty(true)
                    .interact_text()?;

                let engines: Vec<&str> = SearchEngine::ALL.iter().map(|e| e.as_str()).collect();
                let current = SearchEngine::ALL
                    .iter()
                    .position(|e| *e == engine)
                    .unwrap_or(0);
                let picked = Select::new()
                    .with_prompt("Music source")
                    .items(&engines)
                    .default(current)
                    .interact()?;
                engine = SearchEngine::ALL[picked];

                results = search_and_print(&controller, &query, engine);
            }
            1 => {
                if let Some(track) = pick_track("Play which track?", &results)? {
                    let open = Confirm::new()
                        .with_prompt("Open in browser player?")
                        .default(true)
                        .interact()?;
                    play_and_print(&controller, &track.id, track.display_title(), open);
                }
            }
            2 => {
                if let Some(track) = pick_track("Add which track?", &results)? {
                    if let Some(notice) = controller.add(track.clone()) {
                        print_notice(&notice);
                    }
                }
            }
            3 => {
                let queue = controller.session().playlist.tracks();
                if queue.is_empty() {
                    println!("The queue is empty.");
                } else {
                    println!("Now Playing Queue");
                    println!("{}", results_table(queue));
                }
            }
            4 => {
                let queue = controller.session().playlist.tracks().to_vec();
                if let Some(track) = pick_track("Play which queued track?", &queue)? {
                    let open = Confirm::new()
                        .with_prompt("Open in browser player?")
                        .default(true)
                        .interact()?;
                    play_and_print(&controller, &track.id, track.display_title(), open);
                }
            }
            5 => {
                let queue = controller.session().playlist.tracks().to_vec();
                if let Some(track) = pick_track("Remove which track?", &queue)? {
                    controller.remove(&track.id);
                    println!("Removed: {}", track.display_title());
                }
            }
            6 => {
                let theme = controller.toggle_theme();
                println!("Theme: {}", theme.label());
            }
            _ => break,
        }
    }

    Ok(())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("Music API settings");
    println!("(the {} environment variable overrides the API address)\n", config::API_BASE_ENV);

    cfg.api.base_url = Input::new()
        .with_prompt("API base URL")
        .with_initial_text(cfg.api.base_url.clone())
        .interact_text()?;

    cfg.api.search_timeout_secs = Input::new()
        .with_prompt("Search timeout (seconds)")
        .default(cfg.api.search_timeout_secs)
        .interact_text()?;

    cfg.api.fetch_timeout_secs = Input::new()
        .with_prompt("Fetch timeout (seconds)")
        .default(cfg.api.fetch_timeout_secs)
        .interact_text()?;

    let engines: Vec<&str> = SearchEngine::ALL.iter().map(|e| e.as_str()).collect();
    let current = SearchEngine::ALL
        .iter()
        .position(|e| *e == cfg.ui.default_engine)
        .unwrap_or(0);
    let picked = Select::new()
        .with_prompt("Default music source")
        .items(&engines)
        .default(current)
        .interact()?;
    cfg.ui.default_engine = SearchEngine::ALL[picked];

    cfg.ui.default_query = Input::new()
        .with_prompt("Default search text")
        .with_initial_text(cfg.ui.default_query.clone())
        .allow_empty(true)
        .interact_text()?;

    config::save_config(&cfg)?;
    println!("\nSettings saved!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::parse_from(["music-player", "search", "Arijit Singh", "-e", "wunk"]);
        match cli.command {
            Some(Commands::Search { query, engine }) => {
                assert_eq!(query, "Arijit Singh");
                assert_eq!(engine, Some(SearchEngine::Wunk));
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_engine() {
        assert!(Cli::try_parse_from(["music-player", "search", "q", "-e", "spotify"]).is_err());
    }

    #[test]
    fn test_cli_gui_flag() {
        let cli = Cli::parse_from(["music-player", "--gui"]);
        assert!(cli.gui);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_results_table_lists_tracks() {
        let mut with_img = TrackSummary::new("1", "Tum Hi Ho");
        with_img.img = Some("http://x/1.jpg".to_string());
        let table = results_table(&[with_img, TrackSummary::new("2", "")]).to_string();

        assert!(table.contains("Tum Hi Ho"));
        assert!(table.contains("http://x/1.jpg"));
        assert!(table.contains("Untitled"));
    }
}
