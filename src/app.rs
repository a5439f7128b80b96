use std::path::PathBuf;

use futures::StreamExt;
use iced::Task;

use crate::api::{ApiClient, ApiConfig, DownloadResponse, RateLimits};
use crate::application::{suggested_filename, MediaSaver, SaveEvent};
use crate::domain::{AppError, MediaKind};
use crate::ui::{DownloadMessage, DownloadView, ResultMessage, ResultPanel, SAVE_FILENAME};

pub struct InstaApp {
    view: DownloadView,
    api_client: ApiClient,
    saver: MediaSaver,
    next_panel_id: u64,
}

impl InstaApp {
    pub fn new() -> (Self, Task<Message>) {
        let config = ApiConfig::from_env();
        tracing::info!(base_url = %config.base_url, "starting");

        let app = Self::with_client(ApiClient::new(config));
        let limits = fetch_limits(&app.api_client);
        (app, limits)
    }

    pub fn with_client(api_client: ApiClient) -> Self {
        Self {
            view: DownloadView::default(),
            saver: MediaSaver::new(api_client.clone()),
            api_client,
            next_panel_id: 0,
        }
    }

    /// Current result panel, if `panel_id` still names it
    fn panel_mut(&mut self, panel_id: u64) -> Option<&mut ResultPanel> {
        self.view
            .result
            .as_mut()
            .filter(|panel| panel.id() == panel_id)
    }
}

/// Messages produced by async work carry the id of the result panel that
/// started it; a replaced panel's late messages are dropped.
#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    ContentReceived(Result<DownloadResponse, String>),
    /// (Panel id, preview bytes; `None` when the media is not a previewable image)
    PreviewLoaded(u64, Result<Option<bytes::Bytes>, String>),
    /// (Panel id, Selected Path, Media URL)
    FileSaveSelected(u64, Option<PathBuf>, String),
    Save(u64, SaveEvent),
    LimitsReceived(Result<RateLimits, String>),
}

fn fetch_limits(api_client: &ApiClient) -> Task<Message> {
    let api_client = api_client.clone();
    Task::perform(
        async move { api_client.get_limits().await.map_err(|e| e.to_string()) },
        Message::LimitsReceived,
    )
}

fn fetch_preview(api_client: &ApiClient, panel_id: u64, media_url: String) -> Task<Message> {
    let api_client = api_client.clone();
    Task::perform(
        async move {
            api_client
                .fetch_preview(&media_url)
                .await
                .map_err(|e| e.to_string())
        },
        move |result| Message::PreviewLoaded(panel_id, result),
    )
}

pub fn update(app: &mut InstaApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(DownloadMessage::DownloadPressed) => {
            let input = app.view.media_url.trim().to_string();
            if input.is_empty() || app.view.is_fetching {
                return Task::none();
            }

            let Some(kind) = MediaKind::from_url(&input) else {
                app.view.status_message = AppError::InvalidInput.to_string();
                return Task::none();
            };

            app.view.is_fetching = true;
            app.view.status_message = format!("Fetching {}...", kind);

            let api_client = app.api_client.clone();
            return Task::perform(
                async move {
                    api_client
                        .download_content(&input)
                        .await
                        .map_err(|e| e.to_string())
                },
                Message::ContentReceived,
            );
        }
        Message::UiMessage(DownloadMessage::Result(ResultMessage::SavePressed)) => {
            let Some(panel) = app.view.result.as_mut() else {
                return Task::none();
            };
            // Busy from the moment the dialog opens until the save ends
            if panel.is_saving {
                return Task::none();
            }
            panel.is_saving = true;
            panel.save_progress = 0.0;

            let panel_id = panel.id();
            let media_url = panel.media_url().to_string();
            let filename =
                suggested_filename(Some(SAVE_FILENAME), &media_url, panel.format_hint());
            let saver = app.saver.clone();

            return Task::perform(
                async move {
                    let path = saver.choose_save_path(filename).await;
                    (path, media_url)
                },
                move |(path, media_url)| Message::FileSaveSelected(panel_id, path, media_url),
            );
        }
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg);
        }
        Message::ContentReceived(result) => {
            app.view.is_fetching = false;
            match result {
                Ok(response) => {
                    let panel_id = app.next_panel_id;
                    app.next_panel_id += 1;

                    let media_url = response.url.clone();
                    app.view.result = Some(ResultPanel::new(panel_id, response));
                    app.view.status_message = "Ready to save".to_string();

                    return Task::batch([
                        fetch_preview(&app.api_client, panel_id, media_url),
                        fetch_limits(&app.api_client),
                    ]);
                }
                Err(e) => {
                    app.view.status_message = e;
                    return fetch_limits(&app.api_client);
                }
            }
        }
        Message::PreviewLoaded(panel_id, result) => {
            if let Some(panel) = app.panel_mut(panel_id) {
                panel.set_preview(result);
            }
        }
        Message::FileSaveSelected(panel_id, path_opt, media_url) => match path_opt {
            Some(path) => {
                app.view.status_message = format!("Saving to: {}", path.display());

                return Task::stream(
                    app.saver
                        .save_stream(media_url, path)
                        .map(move |event| Message::Save(panel_id, event)),
                );
            }
            None => {
                tracing::debug!(panel_id, "save dialog cancelled");
                if let Some(panel) = app.panel_mut(panel_id) {
                    panel.is_saving = false;
                }
            }
        },
        Message::Save(panel_id, event) => {
            let Some(panel) = app.panel_mut(panel_id) else {
                tracing::debug!(panel_id, ?event, "save event for a replaced panel");
                return Task::none();
            };
            let status = match event {
                SaveEvent::Progress(progress) => {
                    panel.save_progress = progress;
                    None
                }
                SaveEvent::Completed(path) => {
                    panel.is_saving = false;
                    Some(format!("Saved: {}", path.display()))
                }
                SaveEvent::Failed(e) => {
                    // Nothing is shown to the user
                    tracing::warn!(panel_id, error = %e, "save abandoned");
                    panel.is_saving = false;
                    Some("Ready to save".to_string())
                }
            };
            if let Some(status) = status {
                app.view.status_message = status;
            }
        }
        Message::LimitsReceived(result) => match result {
            Ok(limits) => app.view.limits = Some(limits),
            Err(e) => tracing::debug!(error = %e, "rate limits unavailable"),
        },
    }
    Task::none()
}

pub fn view(app: &InstaApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::result::Preview;
    use crate::ui::Tab;
    use serde_json::Map;

    fn app() -> InstaApp {
        InstaApp::with_client(ApiClient::new(ApiConfig::new("http://127.0.0.1:1/api")))
    }

    fn save_pressed() -> Message {
        Message::UiMessage(DownloadMessage::Result(ResultMessage::SavePressed))
    }

    fn response(url: &str) -> DownloadResponse {
        DownloadResponse {
            url: url.to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_unsupported_link_is_rejected_before_request() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::UiMessage(DownloadMessage::UrlChanged(
                "https://www.instagram.com/natgeo/".into(),
            )),
        );
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));

        assert!(!app.view.is_fetching);
        assert_eq!(app.view.status_message, "Unsupported URL type");
    }

    #[test]
    fn test_supported_link_starts_fetch() {
        let mut app = app();
        app.view.media_url = "https://www.instagram.com/p/Cx1/".into();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));

        assert!(app.view.is_fetching);
        assert_eq!(app.view.status_message, "Fetching post...");
    }

    #[test]
    fn test_content_overwrites_result_panel() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/a.jpg"))),
        );
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/b.jpg"))),
        );

        let panel = app.view.result.as_ref().unwrap();
        assert_eq!(panel.media_url(), "https://example.com/b.jpg");
    }

    #[test]
    fn test_failed_fetch_keeps_previous_result() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/a.jpg"))),
        );
        app.view.is_fetching = true;
        let _ = update(
            &mut app,
            Message::ContentReceived(Err("Download failed".into())),
        );

        assert!(!app.view.is_fetching);
        assert_eq!(app.view.status_message, "Download failed");
        assert_eq!(
            app.view.result.as_ref().unwrap().media_url(),
            "https://example.com/a.jpg"
        );
    }

    #[test]
    fn test_stale_preview_is_ignored() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/a.jpg"))),
        );
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/b.jpg"))),
        );
        let _ = update(&mut app, Message::PreviewLoaded(0, Err("late".into())));

        let panel = app.view.result.as_ref().unwrap();
        assert_eq!(panel.id(), 1);
        assert!(matches!(panel.preview(), Preview::Loading));
    }

    #[test]
    fn test_stale_save_events_do_not_touch_new_panel() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/a.jpg"))),
        );
        let _ = update(&mut app, save_pressed());
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/b.jpg"))),
        );
        let _ = update(&mut app, save_pressed());
        let _ = update(&mut app, Message::Save(1, SaveEvent::Progress(0.25)));

        // Events still arriving from the first panel's save
        let _ = update(&mut app, Message::Save(0, SaveEvent::Progress(0.9)));
        let _ = update(
            &mut app,
            Message::Save(0, SaveEvent::Completed(PathBuf::from("/tmp/a.jpg"))),
        );

        let panel = app.view.result.as_ref().unwrap();
        assert!(panel.is_saving);
        assert_eq!(panel.save_progress, 0.25);
        assert_ne!(app.view.status_message, "Saved: /tmp/a.jpg");

        let _ = update(
            &mut app,
            Message::Save(1, SaveEvent::Completed(PathBuf::from("/tmp/b.jpg"))),
        );
        let panel = app.view.result.as_ref().unwrap();
        assert!(!panel.is_saving);
        assert_eq!(app.view.status_message, "Saved: /tmp/b.jpg");
    }

    #[test]
    fn test_save_button_is_busy_while_dialog_is_open() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/a.jpg"))),
        );
        let _ = update(&mut app, save_pressed());
        assert!(app.view.result.as_ref().unwrap().is_saving);

        // A second click while the first save runs starts nothing
        let _ = update(&mut app, Message::Save(0, SaveEvent::Progress(0.5)));
        let _ = update(&mut app, save_pressed());
        assert_eq!(app.view.result.as_ref().unwrap().save_progress, 0.5);

        let _ = update(
            &mut app,
            Message::FileSaveSelected(0, None, "https://example.com/a.jpg".into()),
        );
        assert!(!app.view.result.as_ref().unwrap().is_saving);
    }

    #[test]
    fn test_save_failure_only_clears_saving_flag() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::ContentReceived(Ok(response("https://example.com/a.jpg"))),
        );
        let _ = update(&mut app, save_pressed());

        let _ = update(
            &mut app,
            Message::Save(0, SaveEvent::Failed(AppError::Io("disk full".into()))),
        );

        let panel = app.view.result.as_ref().unwrap();
        assert!(!panel.is_saving);
        assert_eq!(app.view.status_message, "Ready to save");
    }

    #[test]
    fn test_tab_clicks_reach_tab_bar() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::UiMessage(DownloadMessage::TabSelected(Tab::Stories)),
        );
        assert_eq!(app.view.tabs.current(), Tab::Stories);
    }
}
