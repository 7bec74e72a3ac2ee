use std::collections::HashMap;
use std::time::Duration;

use crate::error::{LineupCoreError, Result};
use crate::models::ContentCategory;

/// Engine configuration, loadable from the environment.
#[derive(Debug, Clone)]
pub struct LineupConfig {
    pub database_url: String,
    /// Bound on every store operation; a timeout surfaces as a transient
    /// store failure
    pub store_timeout_ms: u64,
    /// How many queued pieces each category wants on hand; below this the
    /// queue health flags that more content is needed
    pub queue_targets: HashMap<ContentCategory, usize>,
    /// How deep the lineup report looks into each queue
    pub lineup_depths: HashMap<ContentCategory, i64>,
}

impl Default for LineupConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/lineup_development".to_string(),
            store_timeout_ms: 5_000,
            queue_targets: HashMap::from([
                (ContentCategory::Blog, 2),
                (ContentCategory::Linkedin, 4),
            ]),
            lineup_depths: HashMap::from([
                (ContentCategory::Blog, 2),
                (ContentCategory::Linkedin, 4),
            ]),
        }
    }
}

impl LineupConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(timeout) = std::env::var("LINEUP_STORE_TIMEOUT_MS") {
            config.store_timeout_ms = timeout.parse().map_err(|e| {
                LineupCoreError::configuration(format!("Invalid store_timeout_ms: {e}"))
            })?;
        }

        if let Ok(target) = std::env::var("LINEUP_BLOG_QUEUE_TARGET") {
            let parsed = target.parse().map_err(|e| {
                LineupCoreError::configuration(format!("Invalid blog queue target: {e}"))
            })?;
            config.queue_targets.insert(ContentCategory::Blog, parsed);
        }

        if let Ok(target) = std::env::var("LINEUP_LINKEDIN_QUEUE_TARGET") {
            let parsed = target.parse().map_err(|e| {
                LineupCoreError::configuration(format!("Invalid linkedin queue target: {e}"))
            })?;
            config
                .queue_targets
                .insert(ContentCategory::Linkedin, parsed);
        }

        Ok(config)
    }

    /// Target queue depth for a category
    pub fn queue_target(&self, category: ContentCategory) -> usize {
        self.queue_targets.get(&category).copied().unwrap_or(1)
    }

    /// Lineup report depth for a category
    pub fn lineup_depth(&self, category: ContentCategory) -> i64 {
        self.lineup_depths.get(&category).copied().unwrap_or(1)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LineupConfig::default();
        assert_eq!(config.queue_target(ContentCategory::Blog), 2);
        assert_eq!(config.queue_target(ContentCategory::Linkedin), 4);
        assert_eq!(config.store_timeout(), Duration::from_millis(5_000));
    }

    // One test owns every env var read by from_env; parallel test threads
    // share the process environment.
    #[test]
    fn test_env_overrides_and_invalid_values() {
        std::env::set_var("LINEUP_BLOG_QUEUE_TARGET", "7");
        let config = LineupConfig::from_env().unwrap();
        assert_eq!(config.queue_target(ContentCategory::Blog), 7);
        std::env::remove_var("LINEUP_BLOG_QUEUE_TARGET");

        std::env::set_var("LINEUP_STORE_TIMEOUT_MS", "not-a-number");
        assert!(LineupConfig::from_env().is_err());
        std::env::remove_var("LINEUP_STORE_TIMEOUT_MS");
    }
}
