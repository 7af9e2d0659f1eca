//! Per-endpoint accounting of refresh-triggered retries

use papaya::HashMap;

/// Counts refresh-triggered retry cycles per endpoint.
///
/// An endpoint that reaches the ceiling is not allowed another refresh; its counter is
/// cleared by any successful response from it.
pub struct RetryCounter {
    counts: HashMap<String, u32>,
    ceiling: u32,
}

impl RetryCounter {
    pub fn new(ceiling: u32) -> Self {
        Self {
            counts: HashMap::new(),
            ceiling,
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn get(&self, endpoint: &str) -> u32 {
        self.counts.pin().get(endpoint).copied().unwrap_or(0)
    }

    /// Whether the endpoint may start another refresh cycle
    pub fn allows(&self, endpoint: &str) -> bool {
        self.get(endpoint) < self.ceiling
    }

    /// Record a refresh cycle started by the endpoint, returning the new count
    pub fn increment(&self, endpoint: &str) -> u32 {
        let counts = self.counts.pin();
        let next = counts.get(endpoint).copied().unwrap_or(0).saturating_add(1);
        counts.insert(endpoint.to_string(), next);
        next
    }

    pub fn clear(&self, endpoint: &str) {
        self.counts.pin().remove(endpoint);
    }

    pub fn reset(&self) {
        self.counts.pin().clear();
    }
}
