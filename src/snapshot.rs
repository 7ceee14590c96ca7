use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::comparison::ComparisonReport;
use crate::config::SnapshotConfig;
use crate::models::{Catalog, Price, PriceColumn, PriceMatrix, UNRESOLVED};
use crate::utils::error::{AppError, Result};

pub const UNDERCUT_HEADER: &str = "Undercut by";

fn snapshot_error(path: &Path, message: impl Into<String>) -> AppError {
    AppError::Snapshot {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn parse_price(cell: &str) -> Option<Price> {
    cell.trim().parse().ok()
}

/// Read our own prices from the previous snapshot.
///
/// After `header_rows` rows, data row k holds the price of catalog model k in
/// `baseline_column`, blank rows included. Cells that are not integers read
/// as unresolved, and rows missing at the end leave their models unresolved.
pub fn read_baseline(
    path: &Path,
    catalog: &Catalog,
    config: &SnapshotConfig,
) -> Result<PriceColumn> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| snapshot_error(path, format!("cannot open snapshot: {}", e)))?;

    let mut prices = vec![UNRESOLVED; catalog.len()];
    let mut data_rows = 0;

    for record in reader.records().skip(config.header_rows) {
        let record = record?;
        let index = data_rows;

        let Some(model) = catalog.model(index) else {
            // Trailing filler rows past the catalog are harmless.
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            return Err(snapshot_error(
                path,
                format!("more data rows than the {} catalog models", catalog.len()),
            ));
        };
        data_rows += 1;

        if let Some(label) = record.get(0).map(str::trim).filter(|l| !l.is_empty()) {
            if label != model {
                warn!(
                    row = index,
                    snapshot = label,
                    catalog = model,
                    "Snapshot row label differs from catalog model"
                );
            }
        }

        prices[index] = record
            .get(config.baseline_column)
            .and_then(parse_price)
            .unwrap_or(UNRESOLVED);
    }

    if data_rows < catalog.len() {
        debug!(
            rows = data_rows,
            models = catalog.len(),
            "Snapshot is shorter than the catalog, trailing baseline prices left unresolved"
        );
    }

    Ok(PriceColumn::new(config.baseline_title.clone(), prices))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write the run's table and atomically replace the snapshot at `path`.
///
/// Layout: a date row, a title row (baseline, then competitors, then the
/// undercut column), then one row per catalog model. With the default layout
/// the result reads back through [`read_baseline`].
pub fn write_snapshot(
    path: &Path,
    matrix: &PriceMatrix,
    report: &ComparisonReport,
    config: &SnapshotConfig,
    date: NaiveDate,
) -> Result<()> {
    let tmp = temp_path(path);

    let written = write_rows(&tmp, matrix, report, config, date);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    std::fs::rename(&tmp, path)
        .map_err(|e| snapshot_error(path, format!("cannot replace snapshot: {}", e)))?;
    Ok(())
}

fn write_rows(
    tmp: &Path,
    matrix: &PriceMatrix,
    report: &ComparisonReport,
    config: &SnapshotConfig,
    date: NaiveDate,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(tmp)
        .map_err(|e| snapshot_error(tmp, format!("cannot create snapshot: {}", e)))?;

    writer.write_record([format!("Prices as of: {}", date.format(&config.date_format))])?;

    let mut titles = vec![String::new(), matrix.baseline().company.clone()];
    titles.extend(matrix.competitors().iter().map(|c| c.company.clone()));
    titles.push(UNDERCUT_HEADER.to_string());
    writer.write_record(&titles)?;

    for (index, model) in matrix.catalog().models().enumerate() {
        let mut row = vec![model.to_string(), matrix.baseline().prices[index].to_string()];
        row.extend(matrix.competitors().iter().map(|c| c.prices[index].to_string()));
        row.push(report.undercutters_at(index).join("; "));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
