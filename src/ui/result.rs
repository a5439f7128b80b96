use iced::{
    widget::{button, column, container, image, progress_bar, text},
    Element, Length,
};

use crate::api::DownloadResponse;
use crate::utils::image_extension;

/// Filename offered by the panel's save button
pub const SAVE_FILENAME: &str = "instagram-content";

pub enum Preview {
    Loading,
    Ready(image::Handle),
    Unavailable,
}

#[derive(Debug, Clone)]
pub enum ResultMessage {
    SavePressed,
}

/// Panel showing the resolved media and its save button
pub struct ResultPanel {
    id: u64,
    response: DownloadResponse,
    preview: Preview,
    format_hint: Option<&'static str>,
    pub is_saving: bool,
    pub save_progress: f32,
}

impl ResultPanel {
    pub fn new(id: u64, response: DownloadResponse) -> Self {
        Self {
            id,
            response,
            preview: Preview::Loading,
            format_hint: None,
            is_saving: false,
            save_progress: 0.0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn media_url(&self) -> &str {
        &self.response.url
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Extension sniffed from the preview bytes, if they were an image
    pub fn format_hint(&self) -> Option<&'static str> {
        self.format_hint
    }

    /// `Ok(None)` means the media was not worth fetching as a preview.
    pub fn set_preview(&mut self, result: Result<Option<bytes::Bytes>, String>) {
        match result {
            Ok(None) => {
                self.preview = Preview::Unavailable;
            }
            Ok(Some(data)) => match image_extension(&data) {
                Some(ext) => {
                    self.format_hint = Some(ext);
                    self.preview = Preview::Ready(image::Handle::from_bytes(data));
                }
                None => {
                    tracing::debug!(url = %self.response.url, "media is not a previewable image");
                    self.preview = Preview::Unavailable;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, url = %self.response.url, "preview failed");
                self.preview = Preview::Unavailable;
            }
        }
    }

    pub fn view(&self) -> Element<'_, ResultMessage> {
        let preview: Element<'_, ResultMessage> = match self.preview() {
            Preview::Loading => text("Loading preview...").size(14).into(),
            Preview::Ready(handle) => image(handle.clone()).width(Length::Fill).into(),
            Preview::Unavailable => text(format!("Preview unavailable: {}", self.media_url()))
                .size(14)
                .into(),
        };

        let mut save = button("Download to My Computer").padding([10, 20]);
        if !self.is_saving {
            save = save.on_press(ResultMessage::SavePressed);
        }

        let mut content = column![preview, save].spacing(16);
        if self.is_saving {
            content = content.push(progress_bar(0.0..=1.0, self.save_progress));
        }

        container(content)
            .padding(16)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
    }
}
