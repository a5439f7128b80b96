use std::path::PathBuf;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::{
    api::ApiClient,
    domain::AppError,
    utils::{extension_from_url, has_extension, sanitize_filename},
};

pub const DEFAULT_FILENAME: &str = "instagram-download";

#[derive(Debug, Clone)]
pub enum SaveEvent {
    Progress(f32),
    Completed(PathBuf),
    Failed(AppError),
}

/// The caller's filename, or [`DEFAULT_FILENAME`] when there is none.
pub fn resolve_filename(filename: Option<&str>) -> String {
    match filename.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_FILENAME.to_string(),
    }
}

/// Name offered in the save dialog.
///
/// An extension is appended when the resolved name lacks one: the sniffed
/// image format wins over whatever the media URL path ends in.
pub fn suggested_filename(
    filename: Option<&str>,
    media_url: &str,
    format_hint: Option<&str>,
) -> String {
    let mut name = sanitize_filename(&resolve_filename(filename));
    if name.is_empty() {
        name = DEFAULT_FILENAME.to_string();
    }

    if has_extension(&name) {
        return name;
    }

    match format_hint
        .map(str::to_string)
        .or_else(|| extension_from_url(media_url))
    {
        Some(ext) => format!("{}.{}", name, ext),
        None => name,
    }
}

#[derive(Clone)]
pub struct MediaSaver {
    api_client: ApiClient,
}

impl MediaSaver {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    pub async fn choose_save_path(&self, suggested_filename: String) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(&suggested_filename)
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Save `url` into `dir` without asking, under the suggested name.
    #[cfg(test)]
    pub async fn save(
        &self,
        url: &str,
        filename: Option<&str>,
        dir: &std::path::Path,
    ) -> Result<PathBuf, AppError> {
        let path = dir.join(suggested_filename(filename, url, None));
        let mut events = self.save_stream(url.to_string(), path);

        let mut outcome = Err(AppError::Io("save produced no result".to_string()));
        while let Some(event) = events.next().await {
            match event {
                SaveEvent::Progress(_) => {}
                SaveEvent::Completed(path) => outcome = Ok(path),
                SaveEvent::Failed(e) => outcome = Err(e),
            }
        }
        outcome
    }

    pub fn save_stream(&self, url: String, path: PathBuf) -> BoxStream<'static, SaveEvent> {
        futures::stream::unfold(
            SaveState::Start {
                client: self.api_client.clone(),
                url,
                path,
            },
            |state| async move {
                match state {
                    SaveState::Start { client, url, path } => {
                        tracing::debug!(%url, path = %path.display(), "saving media");

                        let file = match tokio::fs::File::create(&path).await {
                            Ok(file) => file,
                            Err(e) => {
                                return Some(fail(
                                    AppError::Io(format!("Failed to create file: {}", e)),
                                    None,
                                )
                                .await);
                            }
                        };

                        match client.download_file_stream(&url).await {
                            Ok((total_size, stream)) => Some((
                                SaveEvent::Progress(0.0),
                                SaveState::Writing {
                                    file,
                                    stream: stream.boxed(),
                                    written: 0,
                                    total: total_size,
                                    path,
                                },
                            )),
                            Err(e) => {
                                drop(file);
                                Some(fail(AppError::Api(e.to_string()), Some(path)).await)
                            }
                        }
                    }
                    SaveState::Writing {
                        mut file,
                        mut stream,
                        mut written,
                        total,
                        path,
                    } => match stream.next().await {
                        Some(Ok(chunk)) => {
                            if let Err(e) = file.write_all(&chunk).await {
                                drop(file);
                                return Some(
                                    fail(AppError::Io(format!("Write error: {}", e)), Some(path))
                                        .await,
                                );
                            }

                            written += chunk.len() as u64;

                            let progress = match total {
                                Some(total_size) if total_size > 0 => {
                                    written as f32 / total_size as f32
                                }
                                _ => 0.0,
                            };

                            Some((
                                SaveEvent::Progress(progress),
                                SaveState::Writing {
                                    file,
                                    stream,
                                    written,
                                    total,
                                    path,
                                },
                            ))
                        }
                        Some(Err(e)) => {
                            drop(file);
                            Some(fail(AppError::Api(e.to_string()), Some(path)).await)
                        }
                        None => {
                            if let Err(e) = file.sync_all().await {
                                drop(file);
                                return Some(
                                    fail(
                                        AppError::Io(format!("Failed to sync file: {}", e)),
                                        Some(path),
                                    )
                                    .await,
                                );
                            }

                            tracing::info!(bytes = written, path = %path.display(), "media saved");
                            Some((SaveEvent::Completed(path), SaveState::Finished))
                        }
                    },
                    SaveState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

/// Log the failure and drop whatever was written so far
async fn fail(error: AppError, partial: Option<PathBuf>) -> (SaveEvent, SaveState) {
    tracing::error!(%error, "save failed");

    if let Some(path) = partial {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %e, path = %path.display(), "could not remove partial file");
        }
    }

    (SaveEvent::Failed(error), SaveState::Finished)
}

enum SaveState {
    Start {
        client: ApiClient,
        url: String,
        path: PathBuf,
    },
    Writing {
        file: tokio::fs::File,
        stream: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
        written: u64,
        total: Option<u64>,
        path: PathBuf,
    },
    Finished,
}
