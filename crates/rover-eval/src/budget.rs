//! Execution budgets that guarantee every run terminates.
//!
//! - [`StepBudget`] counts visible unit actions (one per move step or `speak`).
//! - [`Gas`] counts every statement and expression evaluation.
//!
//! Exhausting either one raises [`EvalError::StepLimitExceeded`].

use crate::error::{EvalError, EvalResult};

/// Visible-action budget: `min(maxMoves, step ceiling)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    taken: u32,
    limit: u32,
}

impl StepBudget {
    pub fn new(max_moves: Option<u32>, ceiling: u32) -> Self {
        let limit = max_moves.map_or(ceiling, |m| m.min(ceiling));
        Self { taken: 0, limit }
    }

    /// Spend one step. Fails once `limit` steps have been taken.
    pub fn consume(&mut self) -> EvalResult<()> {
        if self.taken >= self.limit {
            tracing::debug!(limit = self.limit, "step budget exhausted");
            return Err(EvalError::StepLimitExceeded);
        }
        self.taken += 1;
        Ok(())
    }

    pub fn taken(&self) -> u32 {
        self.taken
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Operation budget.
///
/// ```text
/// used += n
/// if used > limit { StepLimitExceeded }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gas {
    used: u64,
    limit: u64,
}

impl Gas {
    pub fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }

    pub fn tick(&mut self) -> EvalResult<()> {
        self.charge(1)
    }

    /// Consume `n` units at once, e.g. for materializing a `range()`.
    pub fn charge(&mut self, n: u64) -> EvalResult<()> {
        self.used = self.used.saturating_add(n);
        if self.used > self.limit {
            tracing::debug!(limit = self.limit, "operation budget exhausted");
            Err(EvalError::StepLimitExceeded)
        } else {
            Ok(())
        }
    }

    pub fn used(&self) -> u64 {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_budget_uses_smaller_limit() {
        assert_eq!(StepBudget::new(Some(12), 1000).limit(), 12);
        assert_eq!(StepBudget::new(Some(5000), 1000).limit(), 1000);
        assert_eq!(StepBudget::new(None, 1000).limit(), 1000);
    }

    #[test]
    fn test_step_budget_refuses_past_limit() {
        let mut budget = StepBudget::new(Some(2), 1000);
        assert!(budget.consume().is_ok());
        assert!(budget.consume().is_ok());
        assert_eq!(budget.consume(), Err(EvalError::StepLimitExceeded));
        assert_eq!(budget.taken(), 2);
    }

    #[test]
    fn test_zero_moves_allows_nothing() {
        let mut budget = StepBudget::new(Some(0), 1000);
        assert_eq!(budget.consume(), Err(EvalError::StepLimitExceeded));
    }

    #[test]
    fn test_gas_exhaustion() {
        let mut gas = Gas::new(3);
        for _ in 0..3 {
            gas.tick().unwrap();
        }
        assert_eq!(gas.tick(), Err(EvalError::StepLimitExceeded));
        assert_eq!(Gas::new(10).charge(11), Err(EvalError::StepLimitExceeded));
    }
}
