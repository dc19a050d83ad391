#[cfg(feature = "gui")]
mod app;

#[cfg(feature = "gui")]
pub fn launch(config: crate::config::Config) -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;

    use crate::core::controller::Controller;
    use crate::sources::cached::CachedApi;
    use crate::sources::remote::RemoteApi;

    let remote = RemoteApi::new(&config.api).context("API 클라이언트를 만들 수 없습니다")?;
    let controller = Controller::new(Arc::new(CachedApi::new(remote, &config.cache)));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Music Player")
            .with_inner_size([1100.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Music Player",
        options,
        Box::new(move |cc| Ok(Box::new(app::MusicPlayerApp::new(cc, controller, &config)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI를 실행할 수 없습니다: {e}"))
}
