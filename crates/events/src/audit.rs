//! Audit trail subscriber.
//!
//! [`AuditLog`] drains the [`EventBus`](crate::bus::EventBus) and writes one
//! structured `info` line per event under the `audit` target, so identity
//! changes and mutations can be filtered with `RUST_LOG=audit=info`.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::DomainEvent;

/// Background service that logs every published event.
pub struct AuditLog;

impl AuditLog {
    /// Run the audit loop until `cancel` fires or the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<DomainEvent>, cancel: CancellationToken) {
        tracing::info!("Audit log subscriber started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Audit log subscriber stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => Self::record(&event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Audit log lagged, some events were not recorded");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, audit log shutting down");
                        break;
                    }
                },
            }
        }
    }

    fn record(event: &DomainEvent) {
        tracing::info!(
            target: "audit",
            kind = event.kind.as_str(),
            subject = event.subject.kind(),
            subject_id = event.subject.id(),
            actor = event.actor,
            detail = %event.detail,
            at = %event.at,
            "event"
        );
    }
}
