//! Repair step for transactions that were migrated without a category.
use std::sync::Arc;

use ledger_migrate_repository::{DocumentStore, SharedCategory, StoreError};

use crate::run_log::RunLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// `transactions` rows now point at `category`.
    Updated {
        category: SharedCategory,
        transactions: u64,
    },
    /// The new store has no shared category to assign.
    NoSharedCategory,
}

/// Assigns the oldest shared category to every uncategorised transaction.
pub struct CategoryBackfill {
    store: Arc<dyn DocumentStore>,
}

impl CategoryBackfill {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn run(&self, log: &mut RunLog) -> Result<BackfillOutcome, StoreError> {
        log.info("Looking for a shared category...");
        let Some(category) = self.store.first_shared_category().await? else {
            log.error("No shared category found in the new store");
            return Ok(BackfillOutcome::NoSharedCategory);
        };
        log.info(format!(
            "Using shared category {} ({})",
            category.label, category.id
        ));

        let transactions = self.store.assign_missing_categories(category.id).await?;
        log.success(format!(
            "Updated {transactions} transactions without a category"
        ));

        Ok(BackfillOutcome::Updated {
            category,
            transactions,
        })
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
