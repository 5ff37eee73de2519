//! Notification adapter that emits alert digests through `tracing`.

use crate::domain::alert::AlertDigest;
use crate::domain::error::FundwatchError;
use crate::ports::notify_port::NotificationPort;
use tracing::warn;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn notify(&self, digest: &AlertDigest) -> Result<(), FundwatchError> {
        warn!(count = digest.count, title = %digest.title, "{}", digest.body);
        Ok(())
    }
}
