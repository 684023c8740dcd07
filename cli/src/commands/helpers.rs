use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use caloriemeter_core::models::{EmptyFields, Product};

/// Parse a calorie value: "105", "105kcal", "105 kcal", "150.5".
///
/// An empty string parses as zero so the form rules can report the field as missing.
pub(crate) fn parse_calories(s: &str) -> Result<f64> {
    let lower = s.trim().to_lowercase();
    let number = lower.strip_suffix("kcal").unwrap_or(&lower).trim();
    if number.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = number.parse().with_context(|| {
        format!("Invalid calories value: '{s}'. Use a number like '105' or '105kcal'")
    })?;
    if !value.is_finite() {
        bail!("Calories must be a finite number");
    }
    if value < 0.0 {
        bail!("Calories can't be negative");
    }
    Ok(no_neg_zero(value))
}

/// Ask a yes/no question on stderr. Anything but "y"/"yes" counts as no.
pub(crate) fn prompt_confirm(question: &str, hint: &str) -> Result<bool> {
    eprintln!("{question}");
    eprint!("{hint} [y/N]: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let Some(line) = stdin.lock().lines().next() else {
        return Ok(false);
    };
    Ok(is_yes(&line?))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print an empty-field message and exit with status 2.
pub(crate) fn exit_invalid(kind: EmptyFields, json: bool) -> ! {
    if json {
        #[derive(Serialize)]
        struct InvalidInput<'a> {
            error: &'a str,
            hint: &'a str,
            missing: EmptyFields,
        }
        let body = InvalidInput {
            error: kind.message(),
            hint: kind.hint(),
            missing: kind,
        };
        println!(
            "{}",
            serde_json::to_string(&body).unwrap_or_else(|_| json_error(kind.message()))
        );
    } else {
        eprintln!("{}", kind.message());
        eprintln!("{}", kind.hint());
    }
    process::exit(2);
}

/// Print a "not found" style message and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn print_product_table(products: &[Product]) {
    #[derive(Tabled)]
    struct ProductRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "kcal")]
        calories: String,
        #[tabled(rename = "Photo")]
        photo: String,
        #[tabled(rename = "Added")]
        added: String,
    }

    let rows: Vec<ProductRow> = products
        .iter()
        .map(|p| ProductRow {
            id: p.id,
            title: truncate(&p.title, 35),
            calories: format_calories(p.calories),
            photo: p
                .image
                .as_ref()
                .map_or_else(|| "-".into(), |bytes| format_size(bytes.len())),
            added: format_timestamp(&p.created_at),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

/// Whole numbers without decimals, otherwise one decimal place.
pub(crate) fn format_calories(v: f64) -> String {
    let v = no_neg_zero(v);
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

/// Show a stored RFC 3339 timestamp in local time, falling back to the raw text.
pub(crate) fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts).map_or_else(
        |_| ts.to_string(),
        |dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calories() {
        assert!((parse_calories("105").unwrap() - 105.0).abs() < f64::EPSILON);
        assert!((parse_calories("105kcal").unwrap() - 105.0).abs() < f64::EPSILON);
        assert!((parse_calories("105 kcal").unwrap() - 105.0).abs() < f64::EPSILON);
        assert!((parse_calories(" 150.5 ").unwrap() - 150.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_calories_suffix_any_case() {
        assert!((parse_calories("105Kcal").unwrap() - 105.0).abs() < f64::EPSILON);
        assert!((parse_calories("105 KCAL").unwrap() - 105.0).abs() < f64::EPSILON);
        assert!((parse_calories("90 kCal").unwrap() - 90.0).abs() < f64::EPSILON);
        assert!(parse_calories("kcal").unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_calories_empty_is_zero() {
        assert_eq!(parse_calories("").unwrap().to_bits(), 0.0_f64.to_bits());
        assert_eq!(parse_calories("  ").unwrap().to_bits(), 0.0_f64.to_bits());
        assert_eq!(parse_calories("0").unwrap().to_bits(), 0.0_f64.to_bits());
        assert_eq!(parse_calories("-0").unwrap().to_bits(), 0.0_f64.to_bits());
    }

    #[test]
    fn test_parse_calories_invalid() {
        assert!(parse_calories("abc").is_err());
        assert!(parse_calories("-50").is_err());
        assert!(parse_calories("inf").is_err());
        assert!(parse_calories("NaN").is_err());
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES \n"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("maybe"));
    }

    #[test]
    fn test_format_calories() {
        assert_eq!(format_calories(105.0), "105");
        assert_eq!(format_calories(150.5), "150.5");
        assert_eq!(format_calories(-0.0), "0");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_format_timestamp_invalid_passthrough() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp("2025-11-18T10:00:00Z").len(), 16);
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
