use anyhow::{Context, Result};
use std::path::Path;

use caloriemeter_core::models::ExportData;
use caloriemeter_core::service::CalorieService;

pub(crate) fn cmd_export(svc: &CalorieService, output: Option<&Path>) -> Result<()> {
    let data = svc.export_all()?;
    let body = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            let count = data.products.len();
            eprintln!("Exported {count} products to {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

pub(crate) fn cmd_import(svc: &CalorieService, file: &Path, json: bool) -> Result<()> {
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let data: ExportData = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse export file {}", file.display()))?;

    let summary = svc.import_all(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Imported {} new and {} updated products",
            summary.inserted, summary.updated
        );
    }
    Ok(())
}
