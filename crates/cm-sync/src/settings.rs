//! Synchronization settings derived from the application config

use std::time::Duration;

use cm_core::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Cadence for fast-changing status data
    pub status_interval: Duration,
    /// Cadence for slow-changing inventory and progress data
    pub inventory_interval: Duration,
    pub realtime_enabled: bool,
    pub realtime_channel: String,
    /// Refuse to load without a session
    pub require_session: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SyncSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            status_interval: config.sync.status_interval(),
            inventory_interval: config.sync.inventory_interval(),
            realtime_enabled: config.realtime.enabled,
            realtime_channel: config.realtime.channel.clone(),
            require_session: config.session.require_session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SyncSettings::default();
        assert_eq!(settings.status_interval, Duration::from_secs(30));
        assert_eq!(settings.inventory_interval, Duration::from_secs(300));
        assert_eq!(settings.realtime_channel, "project-updates");
        assert!(!settings.require_session);
    }
}
