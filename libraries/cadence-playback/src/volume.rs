//! Debounced volume persistence
//!
//! Dragging a volume slider produces a burst of updates. Only the last value
//! of a burst is written, once the burst has been quiet for the debounce delay.
//!
//! ```text
//! save(0.1) save(0.2) save(0.3) ........ 500ms ........ write(0.3)
//! ```

use cadence_core::settings::SETTING_VOLUME;
use cadence_core::ConfigStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum Message {
    Save(f32),
    Flush(oneshot::Sender<()>),
}

/// Background writer for the volume setting
///
/// Dropping the saver closes its channel; the task then writes any pending
/// value and exits.
pub struct VolumeSaver {
    tx: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

impl VolumeSaver {
    /// Spawn the writer task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: Arc<dyn ConfigStore>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(config, delay, rx));
        Self { tx, task }
    }

    /// Queue a volume for saving, restarting the debounce timer
    pub fn save(&self, volume: f32) {
        if self.tx.send(Message::Save(volume)).is_err() {
            tracing::warn!("Volume saver has stopped, dropping volume {}", volume);
        }
    }

    /// Write the pending value now, if any
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Flush and stop the writer task
    pub async fn close(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::error!("Volume saver task failed: {}", e);
        }
    }
}

async fn run(
    config: Arc<dyn ConfigStore>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    let mut pending: Option<f32> = None;
    let timer = tokio::time::sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(Message::Save(volume)) => {
                    pending = Some(volume);
                    timer.as_mut().reset(Instant::now() + delay);
                }
                Some(Message::Flush(ack)) => {
                    write(config.as_ref(), pending.take()).await;
                    let _ = ack.send(());
                }
                None => {
                    write(config.as_ref(), pending.take()).await;
                    break;
                }
            },
            () = &mut timer, if pending.is_some() => {
                write(config.as_ref(), pending.take()).await;
            }
        }
    }
}

async fn write(config: &dyn ConfigStore, volume: Option<f32>) {
    let Some(volume) = volume else {
        return;
    };

    tracing::debug!("Saving volume {}", volume);
    if let Err(e) = config.set(SETTING_VOLUME, serde_json::json!(volume)).await {
        tracing::warn!("Failed to save volume: {}", e);
    }
}
