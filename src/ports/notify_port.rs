//! Notification port.

use crate::domain::alert::AlertDigest;
use crate::domain::error::FundwatchError;

pub trait NotificationPort {
    fn notify(&self, digest: &AlertDigest) -> Result<(), FundwatchError>;
}
