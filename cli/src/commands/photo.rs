use anyhow::{Context, Result};
use std::path::Path;

use caloriemeter_core::image::image_mime;
use caloriemeter_core::service::CalorieService;

use super::helpers::{exit_not_found, format_size};

/// Write a product's stored photo to `output`.
pub(crate) fn cmd_image(svc: &CalorieService, id: i64, output: &Path, json: bool) -> Result<()> {
    if svc.get_product(id)?.is_none() {
        exit_not_found(&format!("Product {id} not found"), json);
    }
    let Some(bytes) = svc.product_image(id)? else {
        exit_not_found(&format!("Product {id} has no photo"), json);
    };

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write image: {}", output.display()))?;

    let mime = image_mime(&bytes).unwrap_or("application/octet-stream");
    if json {
        println!(
            "{}",
            serde_json::json!({
                "id": id,
                "path": output.display().to_string(),
                "bytes": bytes.len(),
                "mime_type": mime,
            })
        );
    } else {
        let size = format_size(bytes.len());
        println!("Wrote {size} ({mime}) to {}", output.display());
    }
    Ok(())
}
