use anyhow::Result;
use serde::Serialize;

use caloriemeter_core::models::{ProductView, total_calories};
use caloriemeter_core::service::CalorieService;

use super::helpers::{format_calories, print_product_table};

pub(crate) fn cmd_list(svc: &CalorieService, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct Listing<'a> {
        total_calories: f64,
        products: Vec<ProductView<'a>>,
    }

    let products = svc.list_products()?;
    let total = total_calories(&products);

    if json {
        let listing = Listing {
            total_calories: total,
            products: products.iter().map(ProductView::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if products.is_empty() {
        eprintln!("No products yet. Use `caloriemeter add <title> <calories>` to log one.");
    } else {
        print_product_table(&products);
    }
    println!("Total kcal: {}", format_calories(total));

    Ok(())
}

pub(crate) fn cmd_total(svc: &CalorieService, json: bool) -> Result<()> {
    let total = svc.total_calories()?;
    if json {
        println!("{}", serde_json::json!({ "total_calories": total }));
    } else {
        println!("Total kcal: {}", format_calories(total));
    }
    Ok(())
}
