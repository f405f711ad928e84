//! Expense domain record.
//!
//! # Responsibility
//! - Define the budget-tracker expense document and its category set.
//! - Enforce the amount/description rules before persistence.
//!
//! # Invariants
//! - `amount` is strictly positive.
//! - `category` is one of the closed wedding category set.
//! - `date` is stamped on every write, including edits.

use crate::model::RecordId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Closed category set for wedding expenses.
///
/// Serialized with the display names the backend documents use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Venue,
    Catering,
    Attire,
    Photography,
    Other,
}

/// All categories in presentation order (summary rows, chart legend).
pub const EXPENSE_CATEGORIES: [ExpenseCategory; 5] = [
    ExpenseCategory::Venue,
    ExpenseCategory::Catering,
    ExpenseCategory::Attire,
    ExpenseCategory::Photography,
    ExpenseCategory::Other,
];

impl ExpenseCategory {
    /// Stable name used in documents and UI labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Venue => "Venue",
            Self::Catering => "Catering",
            Self::Attire => "Attire",
            Self::Photography => "Photography",
            Self::Other => "Other",
        }
    }

    /// Parses a stored category name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Venue" => Some(Self::Venue),
            "Catering" => Some(Self::Catering),
            "Attire" => Some(Self::Attire),
            "Photography" => Some(Self::Photography),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl Display for ExpenseCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure for expense writes.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseValidationError {
    /// Amount must be strictly positive and finite.
    InvalidAmount(f64),
    /// Description must contain non-whitespace text.
    EmptyDescription,
}

impl Display for ExpenseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount(amount) => {
                write!(f, "expense amount must be positive, got {amount}")
            }
            Self::EmptyDescription => write!(f, "expense description cannot be empty"),
        }
    }
}

impl Error for ExpenseValidationError {}

/// One expense document in a user's budget collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Store-assigned id, or a `local-` placeholder while a create is in flight.
    pub id: RecordId,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    /// Epoch milliseconds, refreshed on every write.
    pub date: i64,
}

impl Expense {
    /// Creates an unsent expense; the sync layer assigns the id on insert.
    pub fn new(description: impl Into<String>, amount: f64, category: ExpenseCategory) -> Self {
        Self {
            id: RecordId::new(),
            description: description.into().trim().to_string(),
            amount,
            category,
            date: 0,
        }
    }

    /// Checks write-path rules.
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.description.trim().is_empty() {
            return Err(ExpenseValidationError::EmptyDescription);
        }
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(ExpenseValidationError::InvalidAmount(self.amount));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Expense, ExpenseCategory, ExpenseValidationError, EXPENSE_CATEGORIES};

    #[test]
    fn category_names_roundtrip() {
        for category in EXPENSE_CATEGORIES {
            assert_eq!(ExpenseCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(ExpenseCategory::parse("Honeymoon"), None);
    }

    #[test]
    fn validate_rejects_non_positive_amounts() {
        for amount in [0.0, -25.0, f64::NAN, f64::INFINITY] {
            let expense = Expense::new("flowers", amount, ExpenseCategory::Other);
            assert!(matches!(
                expense.validate(),
                Err(ExpenseValidationError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn validate_rejects_blank_description() {
        let expense = Expense::new("   ", 120.0, ExpenseCategory::Catering);
        assert_eq!(
            expense.validate(),
            Err(ExpenseValidationError::EmptyDescription)
        );
    }

    #[test]
    fn serializes_with_backend_field_names() {
        let mut expense = Expense::new("deposit", 2500.0, ExpenseCategory::Venue);
        expense.id = "abc123".to_string();
        expense.date = 1_700_000_000_000;
        let json = serde_json::to_value(&expense).expect("expense should serialize");
        assert_eq!(json["category"], "Venue");
        assert_eq!(json["amount"], 2500.0);
        assert_eq!(json["date"], 1_700_000_000_000_i64);
    }
}
