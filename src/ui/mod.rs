pub mod result;
pub mod tabs;

use iced::{
    widget::{button, column, text, text_input, Space},
    Element, Length,
};

use crate::api::RateLimits;

pub use result::{ResultMessage, ResultPanel, SAVE_FILENAME};
pub use tabs::{Tab, TabBar};

/// Main view state
pub struct DownloadView {
    pub media_url: String,
    pub status_message: String,
    pub is_fetching: bool,
    pub tabs: TabBar,
    /// Hidden until the first successful download
    pub result: Option<ResultPanel>,
    pub limits: Option<RateLimits>,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            media_url: String::new(),
            status_message: "Paste an Instagram link to download".to_string(),
            is_fetching: false,
            tabs: TabBar::default(),
            result: None,
            limits: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    DownloadPressed,
    TabSelected(Tab),
    Result(ResultMessage),
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.media_url = url;
            }
            DownloadMessage::TabSelected(tab) => {
                self.tabs.select(tab);
            }
            DownloadMessage::DownloadPressed | DownloadMessage::Result(_) => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let mut download = button("Download").padding([10, 20]);
        if !self.is_fetching {
            download = download.on_press(DownloadMessage::DownloadPressed);
        }

        let mut content = column![
            text("Instagram Downloader").size(32),
            self.tabs.view().map(DownloadMessage::TabSelected),
            Space::new().height(Length::Fixed(10.0)),
            text_input(self.tabs.current().placeholder(), &self.media_url)
                .on_input(DownloadMessage::UrlChanged)
                .on_submit(DownloadMessage::DownloadPressed)
                .padding(10),
            download,
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10);

        if let Some(limits) = self.limits {
            content = content.push(
                text(format!(
                    "Requests left: {} this minute, {} this hour, {} today",
                    limits.minute, limits.hour, limits.day
                ))
                .size(12),
            );
        }

        if let Some(panel) = &self.result {
            content = content.push(panel.view().map(DownloadMessage::Result));
        }

        content.into()
    }
}
