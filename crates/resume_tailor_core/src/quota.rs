//! crates/resume_tailor_core/src/quota.rs

/// Follow-up questions allowed per conversation.
pub const FOLLOWUP_LIMIT: u32 = 3;

/// Counts successful follow-up answers against a fixed ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaTracker {
    used: u32,
    limit: u32,
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(FOLLOWUP_LIMIT)
    }
}

impl QuotaTracker {
    pub fn new(limit: u32) -> Self {
        Self { used: 0, limit }
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit - self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    /// Records one consumed attempt. Saturates at the ceiling.
    pub fn consume(&mut self) {
        if !self.is_exhausted() {
            self.used += 1;
        }
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}
