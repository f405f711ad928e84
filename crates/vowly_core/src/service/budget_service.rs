//! Budget-tracker use-case service.
//!
//! # Responsibility
//! - Maintain the live expense collection and the budget document mirror.
//! - Apply optimistic expense/budget mutations with rollback.
//! - Recompute and persist the derived percentage-spent value after every
//!   successful mutation.
//!
//! # Invariants
//! - `percentage_spent` is 0 when the budget amount is 0.
//! - The derived-percentage write is fire-and-forget: its failure is logged
//!   and never rolls back the primary mutation.
//! - A failed primary write restores the exact pre-mutation state.

use crate::model::budget::{percentage_spent, Budget, BudgetValidationError};
use crate::model::expense::{
    Expense, ExpenseCategory, ExpenseValidationError, EXPENSE_CATEGORIES,
};
use crate::model::{now_epoch_ms, RecordId};
use crate::store::{
    EntityKind, RecordData, RemoteStore, SessionContext, Snapshot, SnapshotFn, StoreError,
    StoreResult, Subscription, BUDGET_DOC_ID,
};
use crate::sync::{LiveCollection, MutationError, MutationKind};
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

/// Budget use-case error.
#[derive(Debug)]
pub enum BudgetError {
    /// Expense failed validation; no state was touched.
    InvalidExpense(ExpenseValidationError),
    /// Budget amount failed validation; no state was touched.
    InvalidBudget(BudgetValidationError),
    /// Remote write failed; local state was rolled back.
    Mutation(MutationError),
}

impl Display for BudgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidExpense(err) => write!(f, "{err}"),
            Self::InvalidBudget(err) => write!(f, "{err}"),
            Self::Mutation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BudgetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidExpense(err) => Some(err),
            Self::InvalidBudget(err) => Some(err),
            Self::Mutation(err) => Some(err),
        }
    }
}

impl From<MutationError> for BudgetError {
    fn from(value: MutationError) -> Self {
        Self::Mutation(value)
    }
}

/// Read model for the budget summary card.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub budget_amount: f64,
    pub total_spent: f64,
    pub remaining: f64,
    /// Informational ratio, never clamped numerically.
    pub percentage_spent: f64,
    pub over_budget: bool,
}

impl BudgetSummary {
    /// Remaining amount for display; overspend shows the magnitude with an
    /// "(Over)" marker rather than a negative number.
    pub fn remaining_label(&self) -> String {
        if self.over_budget {
            format!("${:.2} (Over)", self.remaining.abs())
        } else {
            format!("${:.2}", self.remaining)
        }
    }
}

/// Per-category spend total for the breakdown chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub amount: f64,
}

/// Budget-tracker facade: live expenses plus the budget document.
pub struct BudgetPlanner {
    store: Arc<dyn RemoteStore>,
    ctx: SessionContext,
    expenses: LiveCollection<Expense>,
    budget: Arc<Mutex<Budget>>,
    budget_stream_error: Arc<Mutex<Option<String>>>,
    _budget_subscription: Subscription,
}

impl BudgetPlanner {
    /// Opens both live subscriptions; mirrors hold current remote state when
    /// this returns. A user with no budget document sees the default budget.
    pub fn open(store: Arc<dyn RemoteStore>, ctx: SessionContext) -> StoreResult<Self> {
        let expenses = LiveCollection::open(Arc::clone(&store), ctx.clone())?;

        let budget: Arc<Mutex<Budget>> = Arc::new(Mutex::new(Budget::default()));
        let budget_stream_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let budget_sink = Arc::clone(&budget);
        let error_sink = Arc::clone(&budget_stream_error);
        let on_snapshot: SnapshotFn = Box::new(move |snapshot: Snapshot| match snapshot {
            Snapshot::Budget(doc) => {
                *lock(&budget_sink) = doc;
                *lock(&error_sink) = None;
            }
            other => {
                error!(
                    "event=snapshot_kind_mismatch module=budget kind={}",
                    other.kind()
                );
            }
        });

        let error_sink = Arc::clone(&budget_stream_error);
        let on_error = Box::new(move |err: StoreError| {
            error!("event=stream_error module=budget error={err}");
            *lock(&error_sink) = Some(err.to_string());
        });

        let budget_subscription =
            store.subscribe(&ctx, EntityKind::Budget, on_snapshot, on_error)?;

        Ok(Self {
            store,
            ctx,
            expenses,
            budget,
            budget_stream_error,
            _budget_subscription: budget_subscription,
        })
    }

    pub fn budget(&self) -> Budget {
        lock(&self.budget).clone()
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.expenses.records()
    }

    /// Newest-first slice for the "Recent Expenses" list.
    pub fn recent_expenses(&self, limit: usize) -> Vec<Expense> {
        let mut expenses = self.expenses.records();
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        expenses.truncate(limit);
        expenses
    }

    pub fn total_spent(&self) -> f64 {
        self.expenses
            .records()
            .iter()
            .map(|expense| expense.amount)
            .sum()
    }

    /// Summary card read model derived from the current mirrors.
    pub fn summary(&self) -> BudgetSummary {
        let budget_amount = lock(&self.budget).amount;
        let total_spent = self.total_spent();
        let remaining = budget_amount - total_spent;
        BudgetSummary {
            budget_amount,
            total_spent,
            remaining,
            percentage_spent: percentage_spent(total_spent, budget_amount),
            over_budget: remaining < 0.0,
        }
    }

    /// Non-zero per-category totals in presentation order.
    pub fn category_breakdown(&self) -> Vec<CategoryTotal> {
        let expenses = self.expenses.records();
        EXPENSE_CATEGORIES
            .into_iter()
            .map(|category| CategoryTotal {
                category,
                amount: expenses
                    .iter()
                    .filter(|expense| expense.category == category)
                    .map(|expense| expense.amount)
                    .sum(),
            })
            .filter(|total| total.amount > 0.0)
            .collect()
    }

    /// Adds an expense optimistically, then persists the refreshed
    /// percentage.
    pub fn add_expense(
        &self,
        description: impl Into<String>,
        amount: f64,
        category: ExpenseCategory,
    ) -> Result<RecordId, BudgetError> {
        let mut expense = Expense::new(description, amount, category);
        expense.date = now_epoch_ms();
        expense.validate().map_err(BudgetError::InvalidExpense)?;

        let id = self.expenses.insert(expense)?;
        self.persist_percentage();
        Ok(id)
    }

    /// Rewrites an existing expense, refreshing its `date` stamp.
    pub fn edit_expense(
        &self,
        id: &str,
        description: impl Into<String>,
        amount: f64,
        category: ExpenseCategory,
    ) -> Result<(), BudgetError> {
        let mut expense = Expense::new(description, amount, category);
        expense.id = id.to_string();
        expense.date = now_epoch_ms();
        expense.validate().map_err(BudgetError::InvalidExpense)?;

        self.expenses.update(expense)?;
        self.persist_percentage();
        Ok(())
    }

    pub fn delete_expense(&self, id: &str) -> Result<(), BudgetError> {
        self.expenses.remove(id)?;
        self.persist_percentage();
        Ok(())
    }

    /// Sets the budget amount optimistically, then persists the refreshed
    /// percentage.
    pub fn set_budget(&self, amount: f64) -> Result<(), BudgetError> {
        let before = lock(&self.budget).clone();
        let updated = Budget {
            amount,
            percentage_spent: before.percentage_spent,
        };
        updated.validate().map_err(BudgetError::InvalidBudget)?;

        *lock(&self.budget) = updated.clone();
        match self
            .store
            .write(&self.ctx, Some(BUDGET_DOC_ID), RecordData::Budget(updated))
        {
            Ok(_) => {
                self.persist_percentage();
                Ok(())
            }
            Err(source) => {
                *lock(&self.budget) = before;
                warn!(
                    "event=mutation_rollback module=budget op=update error={source}"
                );
                Err(BudgetError::Mutation(MutationError {
                    mutation: MutationKind::Update,
                    source,
                }))
            }
        }
    }

    /// Recomputes the derived percentage and writes it to the budget
    /// document. Fire-and-forget relative to the primary mutation: a
    /// failure here is logged and otherwise swallowed, an accepted
    /// inconsistency window.
    fn persist_percentage(&self) {
        let total_spent = self.total_spent();
        let doc = {
            let mut budget = lock(&self.budget);
            budget.percentage_spent = percentage_spent(total_spent, budget.amount);
            budget.clone()
        };

        if let Err(err) = self
            .store
            .write(&self.ctx, Some(BUDGET_DOC_ID), RecordData::Budget(doc))
        {
            warn!("event=percentage_write module=budget status=error error={err}");
        }
    }

    /// First unrecovered stream failure across both subscriptions.
    pub fn stream_error(&self) -> Option<String> {
        lock(&self.budget_stream_error)
            .clone()
            .or_else(|| self.expenses.stream_error())
    }

    /// Dismisses surfaced stream failures. There is no automatic retry.
    pub fn clear_stream_error(&self) {
        *lock(&self.budget_stream_error) = None;
        self.expenses.clear_stream_error();
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().expect("budget mirror mutex poisoned")
}
