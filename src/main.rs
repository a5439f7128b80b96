mod api;
mod app;
mod application;
mod domain;
mod logging;
mod ui;
mod utils;

use iced::window;

fn main() -> iced::Result {
    if !logging::init_logging() {
        tracing::warn!("a logging subscriber was already installed");
    }

    let icon_data = include_bytes!("../assets/icon.png");

    let icon = match image::load_from_memory(icon_data) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            window::icon::from_rgba(rgba.into_raw(), width, height).ok()
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not decode window icon");
            None
        }
    };

    iced::application(app::InstaApp::new, app::update, app::view)
        .title("Instagram Downloader")
        .window(window::Settings {
            icon,
            ..Default::default()
        })
        .run()
}
