//! Outbound messages (OTP codes, visit invitations, completion notices).
//!
//! Workflows never talk to a sender directly: they queue into an [`Outbox`] while the
//! ledger transaction is open and the outbox is flushed once the commit succeeded.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

/// Delivery channel for short text messages addressed by phone number.
pub trait NotificationSender: Send + Sync {
    fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    /// Stable name of the message kind, used in logs and tests.
    pub template: &'static str,
    pub message: String,
}

/// Notifications queued during a transaction.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Notification>,
}

impl Outbox {
    pub fn queue(&mut self, recipient: &str, template: &'static str, message: String) {
        if recipient.trim().is_empty() {
            warn!(template, "dropping notification without a recipient");
            return;
        }
        self.pending.push(Notification {
            recipient: recipient.to_string(),
            template,
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Sends everything queued. Failures are logged and swallowed; returns how many went out.
    pub fn dispatch<N>(self, sender: &N) -> usize
    where
        N: NotificationSender + ?Sized,
    {
        let mut delivered = 0;
        for notification in self.pending {
            match sender.send(&notification.recipient, &notification.message) {
                Ok(()) => delivered += 1,
                Err(err) => warn!(
                    template = notification.template,
                    recipient = %notification.recipient,
                    error = %err,
                    "notification delivery failed"
                ),
            }
        }
        delivered
    }
}

/// Sender that writes each message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSender;

impl NotificationSender for LogSender {
    fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        info!(%recipient, %message, "notification sent");
        Ok(())
    }
}

/// Sender that keeps every message in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<(String, String)> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, message)| message)
            .collect()
    }
}

impl NotificationSender for RecordingSender {
    fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        let mut guard = self
            .sent
            .lock()
            .map_err(|_| NotificationError::Transport("recording sender poisoned".to_string()))?;
        guard.push((recipient.to_string(), message.to_string()));
        Ok(())
    }
}
