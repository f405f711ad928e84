//! Per-user budget document and spend-ratio math.
//!
//! # Responsibility
//! - Define the singleton budget document.
//! - Compute the derived percentage-spent value persisted after mutations.
//!
//! # Invariants
//! - `amount` is non-negative and finite.
//! - `percentage_spent` is 0 whenever `amount` is 0, never a division result.
//! - The percentage is informational and never clamped numerically.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Budget assumed when a user has no budget document yet.
pub const DEFAULT_BUDGET_AMOUNT: f64 = 10_000.0;

/// Validation failure for budget writes.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetValidationError {
    /// Budget amount must be non-negative and finite.
    InvalidAmount(f64),
}

impl Display for BudgetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount(amount) => {
                write!(f, "budget amount must be non-negative, got {amount}")
            }
        }
    }
}

impl Error for BudgetValidationError {}

/// The single budget document kept per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub amount: f64,
    /// Derived spend ratio, persisted after expense/budget mutations.
    pub percentage_spent: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            amount: DEFAULT_BUDGET_AMOUNT,
            percentage_spent: 0.0,
        }
    }
}

impl Budget {
    /// Checks write-path rules.
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if !(self.amount.is_finite() && self.amount >= 0.0) {
            return Err(BudgetValidationError::InvalidAmount(self.amount));
        }
        Ok(())
    }
}

/// Percent of the budget spent; 0 when the budget amount is 0.
pub fn percentage_spent(total_spent: f64, budget_amount: f64) -> f64 {
    if budget_amount > 0.0 {
        total_spent / budget_amount * 100.0
    } else {
        0.0
    }
}
