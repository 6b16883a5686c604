//! Configuration for the sync engine.

/// Configuration for sync cycles.
///
/// Defaults match the production tuning: 30 s base cooldown doubling
/// to a 300 s cap, a 2 s duplicate-attempt guard window, and at most
/// 200 candidates per cycle.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Cooldown applied after the first failure, in seconds.
    pub base_cooldown_secs: i64,
    /// Upper bound on the escalating cooldown, in seconds.
    pub max_cooldown_secs: i64,
    /// Minimum gap between two upload attempts for the same session,
    /// in seconds.
    pub min_retry_interval_secs: i64,
    /// Maximum number of candidates processed in one cycle.
    pub max_candidates_per_cycle: usize,
    /// Optional cap on retained sync marks; oldest marks are evicted
    /// past the cap. `None` retains everything.
    pub max_ledger_marks: Option<usize>,
}

impl SyncConfig {
    /// Creates a configuration with production defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_cooldown_secs: 30,
            max_cooldown_secs: 300,
            min_retry_interval_secs: 2,
            max_candidates_per_cycle: 200,
            max_ledger_marks: None,
        }
    }

    /// Sets the base cooldown in seconds.
    #[must_use]
    pub fn with_base_cooldown_secs(mut self, secs: i64) -> Self {
        self.base_cooldown_secs = secs;
        self
    }

    /// Sets the maximum cooldown in seconds.
    #[must_use]
    pub fn with_max_cooldown_secs(mut self, secs: i64) -> Self {
        self.max_cooldown_secs = secs;
        self
    }

    /// Sets the per-session duplicate-attempt guard window in seconds.
    #[must_use]
    pub fn with_min_retry_interval_secs(mut self, secs: i64) -> Self {
        self.min_retry_interval_secs = secs;
        self
    }

    /// Sets the per-cycle candidate cap.
    #[must_use]
    pub fn with_max_candidates_per_cycle(mut self, max: usize) -> Self {
        self.max_candidates_per_cycle = max;
        self
    }

    /// Sets the bounded-retention cap on sync marks.
    #[must_use]
    pub fn with_max_ledger_marks(mut self, max: usize) -> Self {
        self.max_ledger_marks = Some(max);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
