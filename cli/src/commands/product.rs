use anyhow::{Result, bail};
use std::path::PathBuf;

use caloriemeter_core::image::{image_mime, load_image};
use caloriemeter_core::models::{
    DELETE_HINT, DELETE_PROMPT, DUPLICATE_HINT, DUPLICATE_PROMPT, Product, ProductDraft,
    ProductView,
};
use caloriemeter_core::service::{CalorieService, SubmitOutcome};

use super::helpers::{
    exit_invalid, exit_not_found, format_calories, format_size, format_timestamp, parse_calories,
    prompt_confirm,
};

/// Run a submission through validation, asking before saving a duplicate.
///
/// Returns `None` when the user declines the duplicate.
fn submit_with_prompt(
    svc: &CalorieService,
    existing: Option<&Product>,
    draft: ProductDraft,
    yes: bool,
    json: bool,
) -> Result<Option<Product>> {
    match svc.submit(existing, draft)? {
        SubmitOutcome::Saved(product) => Ok(Some(product)),
        SubmitOutcome::Invalid(kind) => exit_invalid(kind, json),
        SubmitOutcome::NeedsConfirmation(pending) => {
            if yes || prompt_confirm(DUPLICATE_PROMPT, DUPLICATE_HINT)? {
                Ok(Some(svc.confirm(pending)?))
            } else {
                svc.cancel(pending);
                Ok(None)
            }
        }
    }
}

fn print_saved(verb: &str, product: Option<&Product>, json: bool) -> Result<()> {
    match (product, json) {
        (Some(p), true) => println!("{}", serde_json::to_string_pretty(&ProductView::from(p))?),
        (Some(p), false) => {
            let title = &p.title;
            let id = p.id;
            let cal = format_calories(p.calories);
            let photo = if p.has_image() { " (with photo)" } else { "" };
            println!("{verb}: [{id}] {title} — {cal} kcal{photo}");
        }
        (None, true) => println!("{}", serde_json::json!({ "cancelled": true })),
        (None, false) => eprintln!("Cancelled"),
    }
    Ok(())
}

pub(crate) fn cmd_add(
    svc: &CalorieService,
    title: &str,
    calories: &str,
    image: Option<PathBuf>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let calories = parse_calories(calories)?;
    let mut draft = ProductDraft::new(title, calories);
    if let Some(path) = image {
        draft = draft.with_image(load_image(&path)?);
    }

    let product = submit_with_prompt(svc, None, draft, yes, json)?;
    print_saved("Added", product.as_ref(), json)
}

pub(crate) fn cmd_edit(
    svc: &CalorieService,
    id: i64,
    title: Option<String>,
    calories: Option<&str>,
    image: Option<PathBuf>,
    yes: bool,
    json: bool,
) -> Result<()> {
    if title.is_none() && calories.is_none() && image.is_none() {
        bail!("Nothing to update. Provide at least one of --title, --calories, or --image");
    }

    let Some(existing) = svc.get_product(id)? else {
        exit_not_found(&format!("Product {id} not found"), json);
    };

    let calories = match calories {
        Some(c) => parse_calories(c)?,
        None => existing.calories,
    };
    let title = title.unwrap_or_else(|| existing.title.clone());
    let mut draft = ProductDraft::new(title, calories);
    if let Some(path) = image {
        draft = draft.with_image(load_image(&path)?);
    }

    let product = submit_with_prompt(svc, Some(&existing), draft, yes, json)?;
    print_saved("Updated", product.as_ref(), json)
}

pub(crate) fn cmd_delete(svc: &CalorieService, id: i64, yes: bool, json: bool) -> Result<()> {
    let Some(product) = svc.get_product(id)? else {
        exit_not_found(&format!("Product {id} not found"), json);
    };

    if !yes {
        let question = format!("{DELETE_PROMPT} ({})", product.title);
        if !prompt_confirm(&question, DELETE_HINT)? {
            return print_saved("Deleted", None, json);
        }
    }

    if !svc.delete_product(id)? {
        exit_not_found(&format!("Product {id} not found"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        let title = &product.title;
        println!("Deleted: [{id}] {title}");
    }
    Ok(())
}

pub(crate) fn cmd_show(svc: &CalorieService, id: i64, json: bool) -> Result<()> {
    let Some(product) = svc.get_product(id)? else {
        exit_not_found(&format!("Product {id} not found"), json);
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ProductView::from(&product))?
        );
        return Ok(());
    }

    let cal = format_calories(product.calories);
    println!("[{}] {}", product.id, product.title);
    println!("  Calories: {cal} kcal");
    println!("  Added:    {}", format_timestamp(&product.created_at));
    println!("  Updated:  {}", format_timestamp(&product.updated_at));
    match &product.image {
        Some(bytes) => {
            let mime = image_mime(bytes).unwrap_or("unknown");
            let size = format_size(bytes.len());
            println!("  Photo:    {mime}, {size}");
        }
        None => println!("  Photo:    none"),
    }
    Ok(())
}
