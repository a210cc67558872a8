use presensi_core::attendance::DEFAULT_LATE_GRACE_MINUTES;

/// Tunables for the attendance engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minutes after the period start before a `hadir` confirmation is
    /// recorded as `telat`.
    pub late_grace_minutes: i64,
}

impl EngineConfig {
    /// Load from the environment.
    ///
    /// | Variable             | Default |
    /// |----------------------|---------|
    /// | `LATE_GRACE_MINUTES` | `5`     |
    pub fn from_env() -> Self {
        let late_grace_minutes = std::env::var("LATE_GRACE_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|m| *m >= 0)
            .unwrap_or(DEFAULT_LATE_GRACE_MINUTES);
        Self { late_grace_minutes }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            late_grace_minutes: DEFAULT_LATE_GRACE_MINUTES,
        }
    }
}
