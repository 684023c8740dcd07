use crate::models::{EmptyFields, ProductCheck, normalize_title};
use crate::store::ProductStore;

/// Only existence matters for the duplicate check.
const DUPLICATE_QUERY_LIMIT: i64 = 1;

/// Classify a candidate product. Rules run in order and the first match wins:
/// empty title and zero calories, empty title, zero calories, then a
/// case-insensitive title lookup that skips `exclude_id`.
///
/// The title is trimmed before both the emptiness check and the lookup.
pub fn validate(
    store: &dyn ProductStore,
    title: &str,
    calories: f64,
    exclude_id: Option<i64>,
) -> ProductCheck {
    let title = normalize_title(title);
    let calories_missing = calories == 0.0;

    match (title.is_empty(), calories_missing) {
        (true, true) => return ProductCheck::EmptyFields(EmptyFields::Both),
        (true, false) => return ProductCheck::EmptyFields(EmptyFields::Title),
        (false, true) => return ProductCheck::EmptyFields(EmptyFields::Calories),
        (false, false) => {}
    }

    match store.count_matching(title, exclude_id, DUPLICATE_QUERY_LIMIT) {
        Ok(0) => ProductCheck::Success,
        Ok(_) => ProductCheck::Duplicate,
        Err(e) => {
            tracing::warn!(error = %e, title, "duplicate check failed");
            ProductCheck::StoreFailure(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{NewProduct, Product};
    use anyhow::{Result, bail};

    struct FailingStore;

    impl ProductStore for FailingStore {
        fn insert(&self, _product: &NewProduct) -> Result<Product> {
            bail!("disk I/O error")
        }
        fn update(&self, _id: i64, _t: &str, _c: f64, _i: Option<&[u8]>) -> Result<Product> {
            bail!("disk I/O error")
        }
        fn delete(&self, _id: i64) -> Result<bool> {
            bail!("disk I/O error")
        }
        fn count_matching(&self, _t: &str, _e: Option<i64>, _l: i64) -> Result<i64> {
            bail!("disk I/O error")
        }
        fn list_all(&self) -> Result<Vec<Product>> {
            bail!("disk I/O error")
        }
        fn get(&self, _id: i64) -> Result<Option<Product>> {
            bail!("disk I/O error")
        }
    }

    fn db_with(titles: &[(&str, f64)]) -> (Database, Vec<Product>) {
        let db = Database::open_in_memory().unwrap();
        let products = titles
            .iter()
            .map(|(title, calories)| {
                db.insert_product(&NewProduct {
                    title: (*title).to_string(),
                    calories: *calories,
                    image: None,
                })
                .unwrap()
            })
            .collect();
        (db, products)
    }

    fn assert_empty(check: &ProductCheck, expected: EmptyFields) {
        match check {
            ProductCheck::EmptyFields(kind) => assert_eq!(*kind, expected),
            other => panic!("expected EmptyFields({expected:?}), got {other:?}"),
        }
    }

    #[test]
    fn test_empty_both() {
        let (db, _) = db_with(&[]);
        assert_empty(&validate(&db, "", 0.0, None), EmptyFields::Both);
        assert_empty(&validate(&db, "   \n\t", 0.0, None), EmptyFields::Both);
    }

    #[test]
    fn test_empty_title() {
        let (db, _) = db_with(&[]);
        assert_empty(&validate(&db, "", 100.0, None), EmptyFields::Title);
        assert_empty(&validate(&db, "  ", 0.5, None), EmptyFields::Title);
    }

    #[test]
    fn test_empty_calories() {
        let (db, _) = db_with(&[]);
        assert_empty(&validate(&db, "Apple", 0.0, None), EmptyFields::Calories);
        assert_empty(&validate(&db, " Apple ", -0.0, None), EmptyFields::Calories);
    }

    #[test]
    fn test_empty_fields_win_over_duplicate() {
        let (db, _) = db_with(&[("Apple", 52.0)]);
        assert_empty(&validate(&db, "Apple", 0.0, None), EmptyFields::Calories);
    }

    #[test]
    fn test_success_when_no_match() {
        let (db, _) = db_with(&[("Apple", 52.0)]);
        assert!(validate(&db, "Pear", 57.0, None).is_success());
        assert!(validate(&db, "Apple pie", 237.0, None).is_success());
    }

    #[test]
    fn test_duplicate_ignores_case() {
        let (db, _) = db_with(&[("Apple", 52.0)]);
        assert!(matches!(
            validate(&db, "apple", 60.0, None),
            ProductCheck::Duplicate
        ));
        assert!(matches!(
            validate(&db, "APPLE", 60.0, None),
            ProductCheck::Duplicate
        ));
    }

    #[test]
    fn test_duplicate_compares_trimmed_title() {
        let (db, _) = db_with(&[("Apple", 52.0)]);
        assert!(matches!(
            validate(&db, "  apple  ", 60.0, None),
            ProductCheck::Duplicate
        ));
    }

    #[test]
    fn test_exclude_self() {
        let (db, products) = db_with(&[("Apple", 52.0)]);
        let apple = &products[0];
        assert!(validate(&db, "Apple", 55.0, Some(apple.id)).is_success());
        assert!(validate(&db, "apple", 55.0, Some(apple.id)).is_success());
    }

    #[test]
    fn test_exclude_self_still_sees_others() {
        let (db, products) = db_with(&[("Apple", 52.0), ("Pear", 57.0)]);
        let pear = &products[1];
        assert!(matches!(
            validate(&db, "apple", 57.0, Some(pear.id)),
            ProductCheck::Duplicate
        ));
    }

    #[test]
    fn test_store_failure() {
        match validate(&FailingStore, "Apple", 52.0, None) {
            ProductCheck::StoreFailure(e) => assert!(e.to_string().contains("disk I/O")),
            other => panic!("expected StoreFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_fields_do_not_touch_store() {
        // FailingStore would turn any query into StoreFailure
        assert_empty(&validate(&FailingStore, "", 0.0, None), EmptyFields::Both);
        assert_empty(&validate(&FailingStore, "", 5.0, None), EmptyFields::Title);
        assert_empty(
            &validate(&FailingStore, "Apple", 0.0, None),
            EmptyFields::Calories,
        );
    }
}
