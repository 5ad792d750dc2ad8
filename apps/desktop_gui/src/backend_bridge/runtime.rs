//! Runtime bridge between UI command queue and the upload/result controller.

use std::{path::Path, sync::Arc, thread, time::Duration};

use client_core::{
    ControllerSnapshot, FileCandidate, HttpBackend, SelectOutcome, Settings, TriviaPoller,
    TriviaUpdate, UploadResultController,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::watch;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::media;

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: Settings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let backend = match HttpBackend::from_settings(&settings) {
                Ok(backend) => Arc::new(backend),
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err}"),
                    )));
                    tracing::error!("failed to build http backend: {err}");
                    return;
                }
            };
            tracing::info!(base_url = %backend.base_url(), "backend worker ready");

            let mut controller = UploadResultController::new(Arc::clone(&backend));
            let relay = tokio::spawn(relay_snapshots(
                controller.subscribe(),
                Arc::clone(&backend),
                settings.trivia_interval(),
                ui_tx.clone(),
            ));
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::SelectFile { path } => {
                        let candidate = match read_candidate(&path).await {
                            Ok(candidate) => candidate,
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::FileAccess,
                                    err,
                                )));
                                continue;
                            }
                        };
                        if controller.select_file(candidate).await == SelectOutcome::Rejected {
                            tracing::info!(path = %path.display(), "selection rejected: not a pdf");
                        }
                    }
                    BackendCommand::Regenerate => controller.regenerate().await,
                }
            }

            relay.abort();
        });
    });
}

async fn read_candidate(path: &Path) -> Result<FileCandidate, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| format!("failed to read '{}': {err}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = media::media_type_for_path(path);
    Ok(FileCandidate::new(name, media_type.as_deref(), bytes))
}

/// Forwards controller snapshots to the UI, keeps trivia polling alive while
/// a request is loading, and decodes each new visualization off the UI thread.
async fn relay_snapshots(
    mut updates: watch::Receiver<ControllerSnapshot>,
    backend: Arc<HttpBackend>,
    trivia_interval: Duration,
    ui_tx: Sender<UiEvent>,
) {
    let mut poller: Option<TriviaPoller> = None;
    let mut shown_image: Option<String> = None;

    loop {
        let snapshot = updates.borrow_and_update().clone();

        if snapshot.is_loading {
            if poller.is_none() {
                let _ = ui_tx.try_send(UiEvent::Trivia(TriviaUpdate::default()));
                let trivia_tx = ui_tx.clone();
                poller = Some(TriviaPoller::spawn(
                    Arc::clone(&backend),
                    trivia_interval,
                    move |update| {
                        let _ = trivia_tx.try_send(UiEvent::Trivia(update));
                    },
                ));
            }
        } else if let Some(mut active) = poller.take() {
            active.stop();
        }

        let image = snapshot
            .result
            .as_ref()
            .and_then(|result| result.image_base64.clone());
        if image != shown_image {
            match snapshot.result.clone() {
                Some(result) => {
                    let decoded =
                        tokio::task::spawn_blocking(move || media::decode_visualization(&result))
                            .await
                            .unwrap_or_else(|err| Err(format!("decoder task failed: {err}")));
                    match decoded {
                        Ok(visualization) => {
                            let _ = ui_tx.try_send(UiEvent::VisualizationDecoded(visualization));
                        }
                        Err(reason) => {
                            tracing::warn!("failed to decode visualization: {reason}");
                            let _ = ui_tx.try_send(UiEvent::VisualizationFailed { reason });
                        }
                    }
                }
                None => {
                    let _ = ui_tx.try_send(UiEvent::VisualizationDecoded(None));
                }
            }
            shown_image = image;
        }

        if !forward_snapshot(&ui_tx, snapshot) {
            tracing::debug!("ui event receiver gone; stopping snapshot relay");
            break;
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}

/// Snapshots are never dropped: a full queue waits for the UI to drain it,
/// otherwise the final `is_loading = false` state could be lost.
fn forward_snapshot(ui_tx: &Sender<UiEvent>, snapshot: ControllerSnapshot) -> bool {
    match ui_tx.try_send(UiEvent::StateChanged(snapshot)) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::warn!("ui event queue full; waiting to deliver controller state");
            tokio::task::block_in_place(|| ui_tx.send(event)).is_ok()
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}
