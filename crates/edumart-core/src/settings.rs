//! Platform-wide settings editable by admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EduError, Result};

/// Stored platform settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Commission taken from every order line's net amount.
    pub commission_percent: u8,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl PlatformSettings {
    /// Settings with the given commission.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` if the percentage exceeds 100.
    pub fn new(commission_percent: u8) -> Result<Self> {
        if commission_percent > 100 {
            return Err(EduError::invalid(
                "commission_percent",
                "must be between 0 and 100",
            ));
        }
        Ok(Self {
            commission_percent,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_bounds() {
        assert!(PlatformSettings::new(0).is_ok());
        assert!(PlatformSettings::new(100).is_ok());
        assert!(PlatformSettings::new(101).is_err());
    }
}
