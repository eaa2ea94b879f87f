//! Toast notifications for the UI process
use cadence_core::{NotificationSink, Severity};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A notification shown to the user, dismissed by id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
}

/// Notification sink that forwards toasts to the session loop
#[derive(Debug, Clone)]
pub struct ToastSink {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ToastSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ToastSink {
    fn add(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Danger | Severity::Warning => tracing::warn!("Toast: {}", message),
            Severity::Info | Severity::Success => tracing::info!("Toast: {}", message),
        }

        let toast = Toast {
            id: Uuid::new_v4(),
            severity,
            message: message.to_string(),
        };
        // Session already closed, nobody left to show it to
        let _ = self.tx.send(toast);
    }
}
