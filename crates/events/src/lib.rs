//! Event bus and outbound notification infrastructure.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`] -- what happened, to which [`Subject`], and who did it.
//! - [`AuditLog`] -- background subscriber that writes every event to the
//!   tracing log.
//! - [`EmailDispatcher`] -- bounded queue plus worker that sends mail
//!   without blocking the request path.
//! - [`delivery`] -- the SMTP transport.

pub mod audit;
pub mod bus;
pub mod delivery;
pub mod dispatch;
pub mod messages;

pub use audit::AuditLog;
pub use bus::{DomainEvent, EventBus, EventKind, Subject};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use dispatch::{EmailDispatcher, LogMailer, Mailer, OutboundEmail};
