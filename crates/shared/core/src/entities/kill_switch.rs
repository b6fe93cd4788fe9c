use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-wide emergency stop
///
/// While `active`, every new admission is rejected. Activation is sticky:
/// only an explicit administrative clear turns it off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSwitchState {
    pub active: bool,
    pub reason: Option<String>,
    pub initiated_by: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl KillSwitchState {
    /// Switch off, never activated
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Switch on with the given attribution
    pub fn activated(
        reason: impl Into<String>,
        initiated_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            active: true,
            reason: Some(reason.into()),
            initiated_by: Some(initiated_by.into()),
            activated_at: Some(at),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
