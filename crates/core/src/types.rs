/// All asset identifiers are UUIDs (v7, time-ordered, service-assigned).
pub type AssetId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
