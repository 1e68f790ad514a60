use std::future::Future;

use crate::error::AppError;

/// Outbound message dispatch. Delivery is best effort: callers log failures and move on.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    sender: String,
}

impl LogNotifier {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        log::info!(
            "Notification from {} to {}: {} | {}",
            self.sender,
            to,
            subject,
            body
        );
        Ok(())
    }
}
