use std::path::Path;

use anyhow::Result;

use crate::db::Database;
use crate::image::compress_image;
use crate::models::{
    EmptyFields, ExportData, ImportSummary, NewProduct, Product, ProductCheck, ProductDraft,
};
use crate::store::ProductStore;
use crate::validation::validate;

/// Outcome of a save request.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The product was created or updated.
    Saved(Product),
    /// A product with the same title exists. Nothing was written yet.
    NeedsConfirmation(PendingSubmission),
    /// Required fields were empty. Nothing was written.
    Invalid(EmptyFields),
}

/// A submission held back by the duplicate check until the user decides.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    target_id: Option<i64>,
    draft: ProductDraft,
}

impl PendingSubmission {
    #[must_use]
    pub fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    /// Id of the product being edited, `None` when adding.
    #[must_use]
    pub fn target_id(&self) -> Option<i64> {
        self.target_id
    }
}

pub struct CalorieService<S: ProductStore = Database> {
    store: S,
}

impl CalorieService<Database> {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { store: db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { store: db })
    }

    pub fn total_calories(&self) -> Result<f64> {
        self.store.total_calories()
    }

    pub fn export_all(&self) -> Result<ExportData> {
        self.store.export_all()
    }

    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        self.store.import_all(data)
    }
}

impl<S: ProductStore> CalorieService<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- Upsert ---

    /// Validate `draft` and, when it passes, create a new product or update
    /// `existing`.
    ///
    /// A failed duplicate lookup is returned as an error so a caller never
    /// mistakes it for a successful save.
    pub fn submit(&self, existing: Option<&Product>, draft: ProductDraft) -> Result<SubmitOutcome> {
        let target_id = existing.map(|p| p.id);
        match validate(&self.store, &draft.title, draft.calories, target_id) {
            ProductCheck::Success => self.apply(target_id, &draft).map(SubmitOutcome::Saved),
            ProductCheck::Duplicate => {
                tracing::debug!(title = %draft.title, "duplicate title, awaiting confirmation");
                Ok(SubmitOutcome::NeedsConfirmation(PendingSubmission {
                    target_id,
                    draft,
                }))
            }
            ProductCheck::EmptyFields(kind) => Ok(SubmitOutcome::Invalid(kind)),
            ProductCheck::StoreFailure(e) => {
                tracing::warn!(error = %e, "product not saved");
                Err(e.context("Could not check for duplicate products"))
            }
        }
    }

    /// The user chose to save despite the duplicate.
    pub fn confirm(&self, pending: PendingSubmission) -> Result<Product> {
        self.apply(pending.target_id, &pending.draft)
    }

    /// The user dismissed the duplicate prompt. The draft is discarded.
    #[allow(clippy::needless_pass_by_value, clippy::unused_self)]
    pub fn cancel(&self, pending: PendingSubmission) {
        tracing::debug!(title = %pending.draft.title, "duplicate submission cancelled");
    }

    fn apply(&self, target_id: Option<i64>, draft: &ProductDraft) -> Result<Product> {
        let image = draft.image.as_deref().map(compress_image).transpose()?;
        match target_id {
            Some(id) => self
                .store
                .update(id, &draft.title, draft.calories, image.as_deref()),
            None => self.store.insert(&NewProduct {
                title: draft.title.clone(),
                calories: draft.calories,
                image,
            }),
        }
    }

    // --- Direct store operations ---

    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        self.store.get(id)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        self.store.list_all()
    }

    pub fn delete_product(&self, id: i64) -> Result<bool> {
        self.store.delete(id)
    }

    pub fn product_image(&self, id: i64) -> Result<Option<Vec<u8>>> {
        Ok(self.store.get(id)?.and_then(|p| p.image))
    }
}
