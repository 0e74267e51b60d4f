//! Paginated access to the legacy store.
use std::num::NonZeroU64;
use std::sync::Arc;

use ledger_migrate_repository::{LegacySource, SourceError};
use ledger_migrate_shared::{
    LegacyAccount, LegacyCategory, LegacySheet, LegacyTransaction, PageWindow, SourceRow,
};

/// Default number of legacy rows fetched per page.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Reads the legacy store one page at a time.
///
/// The reader owns the page size; migrators ask it for the first window and
/// advance with [`PageWindow::next`] until a short page comes back.
pub struct SourceReader {
    source: Arc<dyn LegacySource>,
    page_size: NonZeroU64,
}

impl SourceReader {
    pub fn new(source: Arc<dyn LegacySource>, page_size: NonZeroU64) -> Self {
        Self { source, page_size }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.get()
    }

    pub fn first_window(&self) -> PageWindow {
        PageWindow::first(self.page_size.get())
    }

    pub async fn accounts(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyAccount>>, SourceError> {
        self.source.read_accounts(window).await
    }

    pub async fn categories(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyCategory>>, SourceError> {
        self.source.read_categories(window).await
    }

    pub async fn sheets(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacySheet>>, SourceError> {
        self.source.read_sheets(window).await
    }

    pub async fn transactions(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyTransaction>>, SourceError> {
        self.source.read_transactions(window).await
    }

    pub async fn close(&self) {
        self.source.close().await;
    }
}
