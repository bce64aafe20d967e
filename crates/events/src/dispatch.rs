//! Fire-and-forget email dispatch.
//!
//! Request handlers hand an [`OutboundEmail`] to the [`EmailDispatcher`],
//! which only pushes it onto a bounded queue. A single worker task drains
//! the queue and calls the configured [`Mailer`]. Delivery is at most once:
//! a full queue drops the message, a failed send is logged and never
//! retried, and the triggering request never observes either outcome.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::delivery::email::EmailError;

/// Default number of emails that may wait for the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// A fully rendered email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Transport abstraction used by the dispatcher worker.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError>;
}

/// Mailer used when no SMTP relay is configured: logs instead of sending.
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.html_body,
            "SMTP not configured, email logged instead of sent"
        );
        Ok(())
    }
}

/// Handle for queueing outbound email.
#[derive(Clone)]
pub struct EmailDispatcher {
    sender: mpsc::Sender<OutboundEmail>,
}

impl EmailDispatcher {
    /// Spawn the worker and return the queue handle plus the worker's join
    /// handle.
    ///
    /// The worker stops when `cancel` fires or every dispatcher handle has
    /// been dropped. Messages still queued at cancellation are discarded.
    pub fn start(
        mailer: Arc<dyn Mailer>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(mailer, receiver, cancel));
        (Self { sender }, handle)
    }

    /// Whether the worker is still draining the queue.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue an email without waiting. Returns `false` if it was dropped.
    pub fn enqueue(&self, email: OutboundEmail) -> bool {
        match self.sender.try_send(email) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(email)) => {
                tracing::warn!(to = %email.to, "Email queue full, message dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(email)) => {
                tracing::warn!(to = %email.to, "Email worker stopped, message dropped");
                false
            }
        }
    }
}

async fn run_worker(
    mailer: Arc<dyn Mailer>,
    mut receiver: mpsc::Receiver<OutboundEmail>,
    cancel: CancellationToken,
) {
    tracing::info!("Email dispatcher started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Email dispatcher stopping");
                break;
            }
            next = receiver.recv() => {
                let Some(email) = next else {
                    tracing::info!("Email queue closed, dispatcher stopping");
                    break;
                };
                if let Err(e) = mailer.send(&email).await {
                    tracing::error!(error = %e, to = %email.to, "Failed to send email");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
