//! Immutable runtime configuration.
//!
//! Built once at startup and passed by reference; nothing in this layer
//! mutates configuration after construction.

use std::time::Duration;

/// Default batch size for blue/green reindex bulk copies.
pub const DEFAULT_REINDEX_BATCH_SIZE: u32 = 256;

/// Default page size for cursor-paginated legacy migrations.
pub const DEFAULT_MIGRATION_PAGE_SIZE: u32 = 256;

/// Default bounded wait when acquiring the startup-job lock.
pub const DEFAULT_LOCK_WAIT_SECS: u64 = 10;

/// Default lease on a held startup-job lock.
pub const DEFAULT_LOCK_LEASE_SECS: u64 = 300;

/// Configuration for the persistence and index-synchronization layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Prefix for search aliases; the per-kind alias is `{prefix}-{kind}`.
    pub alias_prefix: String,
    /// Rows per bulk-index batch during a reindex.
    pub reindex_batch_size: u32,
    /// Rows per cursor page during a legacy migration.
    pub migration_page_size: u32,
    /// How long a startup job waits for the distributed lock before
    /// concluding another instance is handling it.
    pub lock_wait: Duration,
    /// Lease on a held lock; an expired lease may be reclaimed.
    pub lock_lease: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            alias_prefix: "atelier".to_string(),
            reindex_batch_size: DEFAULT_REINDEX_BATCH_SIZE,
            migration_page_size: DEFAULT_MIGRATION_PAGE_SIZE,
            lock_wait: Duration::from_secs(DEFAULT_LOCK_WAIT_SECS),
            lock_lease: Duration::from_secs(DEFAULT_LOCK_LEASE_SECS),
        }
    }
}

impl PersistenceConfig {
    /// Load configuration from the environment (`.env` honored via
    /// dotenvy), falling back to defaults for anything unset or
    /// unparseable.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            alias_prefix: std::env::var("ATELIER_ALIAS_PREFIX")
                .unwrap_or(defaults.alias_prefix),
            reindex_batch_size: env_u32("ATELIER_REINDEX_BATCH_SIZE")
                .unwrap_or(defaults.reindex_batch_size),
            migration_page_size: env_u32("ATELIER_MIGRATION_PAGE_SIZE")
                .unwrap_or(defaults.migration_page_size),
            lock_wait: env_u64("ATELIER_LOCK_WAIT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.lock_wait),
            lock_lease: env_u64("ATELIER_LOCK_LEASE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.lock_lease),
        }
    }

    /// The search alias for a given asset kind tag.
    pub fn alias_for(&self, kind: &str) -> String {
        format!("{}-{kind}", self.alias_prefix)
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = PersistenceConfig::default();
        assert_eq!(cfg.reindex_batch_size, 256);
        assert_eq!(cfg.migration_page_size, 256);
        assert!(cfg.lock_wait < cfg.lock_lease);
    }

    #[test]
    fn alias_for_appends_kind() {
        let cfg = PersistenceConfig::default();
        assert_eq!(cfg.alias_for("model"), "atelier-model");
    }
}
