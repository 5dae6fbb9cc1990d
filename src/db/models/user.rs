use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::MonitorSettings;

/// One row of `users`. New users start with an empty settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn is_new(&self) -> bool {
        self.settings
            .as_object()
            .map(|map| map.is_empty())
            .unwrap_or(true)
    }

    /// Monitor settings stored for this user; defaults when absent or when
    /// the stored document does not validate.
    pub fn monitor_settings(&self) -> MonitorSettings {
        serde_json::from_value::<MonitorSettings>(self.settings.clone())
            .ok()
            .filter(|settings| settings.validate().is_ok())
            .unwrap_or_default()
    }
}
