use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookkeeping stored alongside a linkage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkageMetadata {
    /// Name the linkage is stored under.
    pub name: String,
    pub saved: DateTime<Utc>,
}

impl LinkageMetadata {
    /// Metadata for `name`, stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            saved: Utc::now(),
        }
    }
}
