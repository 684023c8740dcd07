use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::models::{
    EXPORT_VERSION, ExportData, ExportProduct, ImportSummary, NewProduct, Product, normalize_title,
    title_key, validate_product_data,
};
use crate::store::ProductStore;

const PRODUCT_COLUMNS: &str = "id, uuid, title, calories, image, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Rewrite any RFC 3339 timestamp in the stored form (UTC, microseconds) so
/// that text order matches time order.
fn utc_timestamp(ts: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(ts)
        .with_context(|| format!("Invalid timestamp '{ts}'. Must be RFC 3339 format"))?;
    Ok(parsed
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true))
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS products (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    title TEXT NOT NULL,
                    title_key TEXT NOT NULL,
                    calories REAL NOT NULL CHECK (calories >= 0),
                    image BLOB,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE UNIQUE INDEX IF NOT EXISTS idx_products_uuid ON products(uuid);
                CREATE INDEX IF NOT EXISTS idx_products_title_key ON products(title_key);
                CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping ---

    // Expects PRODUCT_COLUMNS in order.
    fn product_from_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(0)?,
            uuid: row.get(1)?,
            title: row.get(2)?,
            calories: row.get(3)?,
            image: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    // --- Products ---

    pub fn insert_product(&self, product: &NewProduct) -> Result<Product> {
        let now = now_timestamp();
        let uuid = Uuid::new_v4().to_string();
        let title = normalize_title(&product.title);
        self.conn.execute(
            "INSERT INTO products (uuid, title, title_key, calories, image, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uuid,
                title,
                title_key(title),
                product.calories,
                product.image,
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, title, "inserted product");
        self.get_product_by_id(id)
    }

    pub fn update_product(
        &self,
        id: i64,
        title: &str,
        calories: f64,
        image: Option<&[u8]>,
    ) -> Result<Product> {
        let now = now_timestamp();
        let title = normalize_title(title);
        let changed = match image {
            Some(bytes) => self.conn.execute(
                "UPDATE products SET title = ?1, title_key = ?2, calories = ?3, image = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![title, title_key(title), calories, bytes, now, id],
            )?,
            None => self.conn.execute(
                "UPDATE products SET title = ?1, title_key = ?2, calories = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![title, title_key(title), calories, now, id],
            )?,
        };
        if changed == 0 {
            bail!("Product {id} not found");
        }
        tracing::debug!(id, title, "updated product");
        self.get_product_by_id(id)
    }

    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        if changed > 0 {
            tracing::debug!(id, "deleted product");
        }
        Ok(changed > 0)
    }

    pub fn get_product_by_id(&self, id: i64) -> Result<Product> {
        self.find_product(id)?
            .with_context(|| format!("Product {id} not found"))
    }

    pub fn find_product(&self, id: i64) -> Result<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
                params![id],
                Self::product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    pub fn get_product_by_uuid(&self, uuid: &str) -> Result<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE uuid = ?1"),
                params![uuid],
                Self::product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    pub fn count_products_titled(
        &self,
        title: &str,
        exclude_id: Option<i64>,
        limit: i64,
    ) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM (
                SELECT 1 FROM products
                WHERE title_key = ?1 AND (?2 IS NULL OR id <> ?2)
                LIMIT ?3
             )",
            params![title_key(title), exclude_id, limit],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))?;
        let products = stmt
            .query_map([], Self::product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    pub fn total_calories(&self) -> Result<f64> {
        let total: Option<f64> =
            self.conn
                .query_row("SELECT SUM(calories) FROM products", [], |row| row.get(0))?;
        Ok(total.unwrap_or(0.0))
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        let products = self
            .list_products()?
            .into_iter()
            .rev()
            .map(ExportProduct::from)
            .collect();
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: now_timestamp(),
            products,
        })
    }

    /// Upsert every exported product by uuid inside a single transaction.
    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        if data.version > EXPORT_VERSION {
            bail!(
                "Unsupported export version {} (expected at most {EXPORT_VERSION})",
                data.version
            );
        }
        let mut rows = Vec::with_capacity(data.products.len());
        for (i, product) in data.products.iter().enumerate() {
            validate_product_data(product)
                .with_context(|| format!("Invalid product at index {i}"))?;
            let created_at = utc_timestamp(&product.created_at)
                .with_context(|| format!("Invalid product at index {i}"))?;
            let updated_at = if product.updated_at.is_empty() {
                created_at.clone()
            } else {
                utc_timestamp(&product.updated_at)
                    .with_context(|| format!("Invalid product at index {i}"))?
            };
            rows.push((product, created_at, updated_at));
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut summary = ImportSummary::default();
        for (product, created_at, updated_at) in rows {
            let title = normalize_title(&product.title);
            if self.get_product_by_uuid(&product.uuid)?.is_some() {
                self.conn.execute(
                    "UPDATE products SET title = ?1, title_key = ?2, calories = ?3, image = ?4,
                     created_at = ?5, updated_at = ?6 WHERE uuid = ?7",
                    params![
                        title,
                        title_key(title),
                        product.calories,
                        product.image,
                        created_at,
                        updated_at,
                        product.uuid,
                    ],
                )?;
                summary.updated += 1;
            } else {
                self.conn.execute(
                    "INSERT INTO products (uuid, title, title_key, calories, image, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        product.uuid,
                        title,
                        title_key(title),
                        product.calories,
                        product.image,
                        created_at,
                        updated_at,
                    ],
                )?;
                summary.inserted += 1;
            }
        }
        tx.commit()?;
        tracing::debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "imported products"
        );
        Ok(summary)
    }
}

impl ProductStore for Database {
    fn insert(&self, product: &NewProduct) -> Result<Product> {
        self.insert_product(product)
    }

    fn update(&self, id: i64, title: &str, calories: f64, image: Option<&[u8]>) -> Result<Product> {
        self.update_product(id, title, calories, image)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        self.delete_product(id)
    }

    fn count_matching(&self, title: &str, exclude_id: Option<i64>, limit: i64) -> Result<i64> {
        self.count_products_titled(title, exclude_id, limit)
    }

    fn list_all(&self) -> Result<Vec<Product>> {
        self.list_products()
    }

    fn get(&self, id: i64) -> Result<Option<Product>> {
        self.find_product(id)
    }
}
