//! Token budget tracking across a run

/// Budget configuration and tracking
#[derive(Debug, Clone, Default)]
pub struct Budget {
    /// Total tokens available for the run; `None` means unlimited
    pub total_tokens: Option<u64>,
    /// Tokens used so far
    pub tokens_used: u64,
}

impl Budget {
    /// Create a budget capped at `total_tokens`
    pub fn new(total_tokens: u64) -> Self {
        Self {
            total_tokens: Some(total_tokens),
            tokens_used: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Record token usage
    pub fn use_tokens(&mut self, tokens: u64) {
        self.tokens_used = self.tokens_used.saturating_add(tokens);
    }

    /// Get remaining tokens
    pub fn remaining(&self) -> Option<u64> {
        self.total_tokens.map(|total| total.saturating_sub(self.tokens_used))
    }

    /// Get usage percentage
    pub fn usage_percentage(&self) -> f32 {
        match self.total_tokens {
            Some(0) | None => 0.0,
            Some(total) => (self.tokens_used as f32 / total as f32) * 100.0,
        }
    }

    /// Check if budget is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.total_tokens.is_some_and(|total| self.tokens_used >= total)
    }
}

/// Budget warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetWarning {
    /// Budget is healthy (< 50%)
    Healthy,
    /// Budget is getting low (50-75%)
    Warning,
    /// Budget is critically low (75-90%)
    Critical,
    /// Budget is nearly exhausted (> 90%)
    Exhausted,
}

impl Budget {
    /// Get the current warning level
    pub fn warning_level(&self) -> BudgetWarning {
        let percentage = self.usage_percentage();
        match percentage {
            p if p < 50.0 => BudgetWarning::Healthy,
            p if p < 75.0 => BudgetWarning::Warning,
            p if p < 90.0 => BudgetWarning::Critical,
            _ => BudgetWarning::Exhausted,
        }
    }
}
