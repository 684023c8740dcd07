use anyhow::Result;

use crate::models::{NewProduct, Product};

/// Persistence operations the validator and the upsert controller rely on.
///
/// `Database` is the SQLite implementation. Calls are synchronous and report
/// failures as errors, never by panicking.
pub trait ProductStore {
    fn insert(&self, product: &NewProduct) -> Result<Product>;

    /// Overwrite title and calories. `image` of `None` keeps the stored image.
    fn update(&self, id: i64, title: &str, calories: f64, image: Option<&[u8]>) -> Result<Product>;

    /// Returns `false` when no product had that id.
    fn delete(&self, id: i64) -> Result<bool>;

    /// Count products whose title equals `title` ignoring case, skipping
    /// `exclude_id`. Counting stops at `limit`.
    fn count_matching(&self, title: &str, exclude_id: Option<i64>, limit: i64) -> Result<i64>;

    /// All products, newest first.
    fn list_all(&self) -> Result<Vec<Product>>;

    fn get(&self, id: i64) -> Result<Option<Product>>;
}
