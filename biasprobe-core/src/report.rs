//! Tidy CSV output for downstream reporting and plotting.
//!
//! Two tables: the per-response analysis table (one row per
//! `ComparisonRecord`, profile attributes plus every feature indicator)
//! and the statistical results table (one row per comparison). Files are
//! written atomically, same tmp-then-rename discipline as the cache
//! store.

use std::path::Path;

use crate::compare::{ComparisonRecord, StatisticalResult};
use crate::error::Result;
use crate::features::FEATURE_NAMES;

const RECORD_COLUMNS: &[&str] = &[
    "name",
    "title",
    "department",
    "email",
    "location",
    "years_at_company",
    "pronouns",
    "query",
    "bias_dimension",
    "source",
];

/// Write the per-response analysis table.
pub fn write_records_csv(path: &Path, records: &[ComparisonRecord]) -> Result<()> {
    let mut out = String::new();
    let header: Vec<&str> = RECORD_COLUMNS.iter().chain(FEATURE_NAMES).copied().collect();
    push_row(&mut out, &header);

    for record in records {
        let mut row: Vec<String> = vec![
            record.profile.name.clone(),
            record.profile.title.clone(),
            record.profile.department.clone(),
            record.profile.email.clone(),
            record.profile.location.clone(),
            record.profile.years_at_company.to_string(),
            record.profile.pronouns.clone(),
            record.query.text.clone(),
            record.query.bias_dimension.clone(),
            record.source.to_string(),
        ];
        for name in FEATURE_NAMES {
            row.push(format_number(record.features.get(name).unwrap_or(0.0)));
        }
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut out, &refs);
    }

    atomic_write(path, &out)?;
    tracing::info!(path = %path.display(), rows = records.len(), "Wrote analysis table");
    Ok(())
}

/// Write the statistical results table.
pub fn write_results_csv(path: &Path, results: &[StatisticalResult]) -> Result<()> {
    let mut out = String::new();
    push_row(
        &mut out,
        &[
            "dimension",
            "feature",
            "test_name",
            "groups",
            "group_sizes",
            "statistic",
            "p_value",
            "effect_size",
            "significant",
            "needs_pairwise",
            "skip_reason",
        ],
    );

    for result in results {
        let sizes = result
            .group_sizes
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(";");
        let row = [
            result.dimension.clone(),
            result.feature.clone(),
            result.test_name.clone(),
            result.groups.join(";"),
            sizes,
            result.statistic.map(format_number).unwrap_or_default(),
            result.p_value.map(format_number).unwrap_or_default(),
            result.effect_size.map(format_number).unwrap_or_default(),
            result.significant.to_string(),
            result.needs_pairwise.to_string(),
            result.skip_reason.clone().unwrap_or_default(),
        ];
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut out, &refs);
    }

    atomic_write(path, &out)?;
    tracing::info!(path = %path.display(), rows = results.len(), "Wrote results table");
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value:.6}")
    }
}

fn push_row(out: &mut String, fields: &[&str]) {
    let escaped: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

/// Quote a field per RFC 4180 when it contains a comma, quote, or
/// newline; doubled quotes inside quoted fields.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn atomic_write(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
