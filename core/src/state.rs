//! Explicit state for the product list screen and its add/edit form.
//!
//! Front ends render from this state and feed user events back into it. The
//! listing is reloaded by `refresh` after every mutation.

use anyhow::Result;

use crate::models::{EmptyFields, Product, ProductDraft, total_calories};
use crate::service::{CalorieService, PendingSubmission, SubmitOutcome};
use crate::store::ProductStore;

/// What the screen is currently asking the user about.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Alert {
    #[default]
    None,
    Validation(EmptyFields),
    DuplicatePrompt(PendingSubmission),
    Deleting(i64),
}

/// The add/edit form. `editing` is `None` when adding a new product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub editing: Option<Product>,
    pub title: String,
    pub calories: Option<f64>,
    pub picked_image: Option<Vec<u8>>,
}

impl ProductForm {
    fn draft(&self) -> ProductDraft {
        ProductDraft {
            title: self.title.clone(),
            // An untouched calories field counts as zero
            calories: self.calories.unwrap_or(0.0),
            image: self.picked_image.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ProductsListState {
    products: Vec<Product>,
    form: Option<ProductForm>,
    alert: Alert,
}

impl ProductsListState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<S: ProductStore>(service: &CalorieService<S>) -> Result<Self> {
        let mut state = Self::new();
        state.refresh(service)?;
        Ok(state)
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn form(&self) -> Option<&ProductForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut ProductForm> {
        self.form.as_mut()
    }

    #[must_use]
    pub fn alert(&self) -> &Alert {
        &self.alert
    }

    #[must_use]
    pub fn total_calories(&self) -> f64 {
        total_calories(&self.products)
    }

    pub fn refresh<S: ProductStore>(&mut self, service: &CalorieService<S>) -> Result<()> {
        self.products = service.list_products()?;
        Ok(())
    }

    // --- Form ---

    pub fn begin_add(&mut self) {
        self.form = Some(ProductForm::default());
        self.alert = Alert::None;
    }

    /// Open the form prefilled from a listed product. Returns `false` if the
    /// id is not in the current listing.
    pub fn begin_edit(&mut self, id: i64) -> bool {
        let Some(product) = self.products.iter().find(|p| p.id == id) else {
            return false;
        };
        self.form = Some(ProductForm {
            editing: Some(product.clone()),
            title: product.title.clone(),
            calories: Some(product.calories),
            picked_image: None,
        });
        self.alert = Alert::None;
        true
    }

    pub fn dismiss_form(&mut self) {
        self.form = None;
        self.alert = Alert::None;
    }

    /// Submit the open form. Does nothing when no form is open.
    pub fn save<S: ProductStore>(&mut self, service: &CalorieService<S>) -> Result<()> {
        let Some(form) = &self.form else {
            return Ok(());
        };
        match service.submit(form.editing.as_ref(), form.draft())? {
            SubmitOutcome::Saved(_) => {
                self.dismiss_form();
                self.refresh(service)?;
            }
            SubmitOutcome::Invalid(kind) => self.alert = Alert::Validation(kind),
            SubmitOutcome::NeedsConfirmation(pending) => {
                self.alert = Alert::DuplicatePrompt(pending);
            }
        }
        Ok(())
    }

    /// Acknowledge a validation message. The form stays open for correction.
    pub fn dismiss_validation(&mut self) {
        if matches!(self.alert, Alert::Validation(_)) {
            self.alert = Alert::None;
        }
    }

    /// Save the held-back duplicate. On error the prompt stays up so the
    /// user can retry or cancel.
    pub fn confirm_duplicate<S: ProductStore>(&mut self, service: &CalorieService<S>) -> Result<()> {
        let Alert::DuplicatePrompt(pending) = &self.alert else {
            return Ok(());
        };
        service.confirm(pending.clone())?;
        self.alert = Alert::None;
        self.form = None;
        self.refresh(service)
    }

    /// Discard the duplicate submission and close the form.
    pub fn cancel_duplicate<S: ProductStore>(&mut self, service: &CalorieService<S>) {
        if let Alert::DuplicatePrompt(pending) = std::mem::take(&mut self.alert) {
            service.cancel(pending);
            self.form = None;
        }
    }

    // --- Deletion ---

    pub fn request_delete(&mut self, id: i64) {
        self.alert = Alert::Deleting(id);
    }

    pub fn cancel_delete(&mut self) {
        if matches!(self.alert, Alert::Deleting(_)) {
            self.alert = Alert::None;
        }
    }

    /// Delete the product awaiting confirmation. An id that is no longer in
    /// the listing is ignored. A failed delete leaves the confirmation up.
    pub fn approve_delete<S: ProductStore>(&mut self, service: &CalorieService<S>) -> Result<()> {
        let Alert::Deleting(id) = self.alert else {
            return Ok(());
        };
        if self.products.iter().any(|p| p.id == id) {
            service.delete_product(id)?;
        }
        self.alert = Alert::None;
        self.refresh(service)
    }
}
