/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use async_trait::async_trait;

use crate::error::Result;

/// Chat notification sink. Delivery is best-effort; callers log and ignore failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: String) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, message: String) -> Result<()> {
        log::debug!("notification dropped: {message}");
        Ok(())
    }
}

/// Sends `message` and swallows any failure.
pub(crate) async fn best_effort(notifier: &dyn Notifier, message: String) {
    if let Err(e) = notifier.notify(message).await {
        log::warn!("notification failed: {e}");
    }
}
