use crate::core::{SelectionPersistence, StoreWarning};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

enum WriteCommand {
    Write { key: String, value: String },
    Flush(oneshot::Sender<()>),
}

/// Write-behind queue in front of a `SelectionPersistence`.
///
/// `enqueue` never blocks. A single background task applies writes in the
/// order they were issued, so an older value can never land after a newer
/// one. Failed writes are logged and published as `StoreWarning::WriteFailed`.
///
/// Must be created inside a Tokio runtime.
#[derive(Clone)]
pub struct WriteQueue {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl WriteQueue {
    pub fn spawn(
        persistence: Arc<dyn SelectionPersistence>,
        warnings: broadcast::Sender<StoreWarning>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteCommand>();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriteCommand::Write { key, value } => {
                        if let Err(e) = persistence.set(&key, &value).await {
                            tracing::warn!("Failed to persist '{}': {}", key, e);
                            let _ = warnings.send(StoreWarning::WriteFailed {
                                key,
                                message: e.to_string(),
                            });
                        }
                    }
                    WriteCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Write queue closed");
        });

        Self { tx }
    }

    pub fn enqueue(&self, key: &str, value: String) {
        let command = WriteCommand::Write {
            key: key.to_string(),
            value,
        };
        if self.tx.send(command).is_err() {
            tracing::error!("Write queue is gone, dropping write for '{}'", key);
        }
    }

    /// Waits until every write enqueued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}
