use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub title: String,
    pub calories: f64,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Product {
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// JSON view of a product: the image blob is replaced by its size.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView<'a> {
    pub id: i64,
    pub uuid: &'a str,
    pub title: &'a str,
    pub calories: f64,
    pub has_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<usize>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(p: &'a Product) -> Self {
        Self {
            id: p.id,
            uuid: &p.uuid,
            title: &p.title,
            calories: p.calories,
            has_image: p.has_image(),
            image_bytes: p.image.as_ref().map(Vec::len),
            created_at: &p.created_at,
            updated_at: &p.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub calories: f64,
    pub image: Option<Vec<u8>>,
}

/// What the user typed into the product form.
///
/// `image` is `Some` only when a new picture was picked during this edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub title: String,
    pub calories: f64,
    pub image: Option<Vec<u8>>,
}

impl ProductDraft {
    pub fn new(title: impl Into<String>, calories: f64) -> Self {
        Self {
            title: title.into(),
            calories,
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }
}

/// Which required form fields were left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyFields {
    Both,
    Title,
    Calories,
}

impl EmptyFields {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            EmptyFields::Both => {
                "Product title can't be empty and calories value can't be empty or zero"
            }
            EmptyFields::Title => "Product title can't be empty",
            EmptyFields::Calories => "Product calories can't be empty or zero",
        }
    }

    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            EmptyFields::Both => "Please fill in both fields and try again",
            EmptyFields::Title => "Please fill in product title field",
            EmptyFields::Calories => "Please update or fill in product calories field",
        }
    }
}

/// Result of checking a candidate product against the form rules and the store.
#[derive(Debug)]
pub enum ProductCheck {
    Success,
    Duplicate,
    EmptyFields(EmptyFields),
    StoreFailure(anyhow::Error),
}

impl ProductCheck {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ProductCheck::Success)
    }
}

pub const DUPLICATE_PROMPT: &str = "Product already exists! Add anyway?";
pub const DUPLICATE_HINT: &str = "You can edit existing product and update calories value";
pub const DELETE_PROMPT: &str = "Are you sure you want to remove this product?";
pub const DELETE_HINT: &str = "This action cannot be undone";

/// Trim surrounding whitespace the same way on every path into the store.
#[must_use]
pub fn normalize_title(title: &str) -> &str {
    title.trim()
}

/// Key used for case-insensitive title comparison.
#[must_use]
pub fn title_key(title: &str) -> String {
    normalize_title(title).to_lowercase()
}

#[must_use]
pub fn total_calories(products: &[Product]) -> f64 {
    products.iter().map(|p| p.calories).sum()
}

// --- Export / Import ---

pub const EXPORT_VERSION: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    pub products: Vec<ExportProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportProduct {
    pub uuid: String,
    pub title: String,
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_image")]
    pub image: Option<Vec<u8>>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl From<Product> for ExportProduct {
    fn from(p: Product) -> Self {
        Self {
            uuid: p.uuid,
            title: p.title,
            calories: p.calories,
            image: p.image,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: i64,
    pub updated: i64,
}

/// Validate an imported product: title must not be empty, calories must not be negative.
pub fn validate_product_data(product: &ExportProduct) -> Result<()> {
    if normalize_title(&product.title).is_empty() {
        anyhow::bail!("Product title must not be empty");
    }
    if !product.calories.is_finite() || product.calories < 0.0 {
        anyhow::bail!("Product calories must be a non-negative number");
    }
    if uuid::Uuid::parse_str(&product.uuid).is_err() {
        anyhow::bail!("Invalid product uuid '{}'", product.uuid);
    }
    chrono::DateTime::parse_from_rfc3339(&product.created_at).map_err(|_| {
        anyhow::anyhow!(
            "Invalid created_at '{}'. Must be RFC 3339 format",
            product.created_at
        )
    })?;
    if !product.updated_at.is_empty() {
        chrono::DateTime::parse_from_rfc3339(&product.updated_at).map_err(|_| {
            anyhow::anyhow!(
                "Invalid updated_at '{}'. Must be RFC 3339 format",
                product.updated_at
            )
        })?;
    }
    Ok(())
}

mod base64_image {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(image: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match image {
            Some(bytes) => s.serialize_str(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
