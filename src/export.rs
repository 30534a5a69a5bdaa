use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::features::{Cell, FeatureColumns, FeatureRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub rows: usize,
    pub columns: usize,
}

/// Missing values are written as empty fields.
pub fn write_features_csv(
    path: &Path,
    columns: &FeatureColumns,
    rows: &[FeatureRow],
) -> Result<ExportReport> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed creating {}", path.display()))?;
    let headers = columns.headers();
    writer.write_record(&headers).context("write header")?;
    for (idx, row) in rows.iter().enumerate() {
        let cells = columns.cells(row);
        writer
            .write_record(cells.iter().map(Cell::render))
            .with_context(|| format!("write row {idx}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed flushing {}", path.display()))?;
    Ok(ExportReport {
        rows: rows.len(),
        columns: headers.len(),
    })
}

pub fn write_features_xlsx(
    path: &Path,
    columns: &FeatureColumns,
    rows: &[FeatureRow],
) -> Result<ExportReport> {
    let headers = columns.headers();
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Features")?;
        write_header(sheet, &headers)?;
        for (idx, row) in rows.iter().enumerate() {
            write_cells(sheet, idx as u32 + 1, &columns.cells(row))?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(ExportReport {
        rows: rows.len(),
        columns: headers.len(),
    })
}

fn write_header(worksheet: &mut Worksheet, headers: &[String]) -> Result<()> {
    for (col_idx, name) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, name)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    Ok(())
}

fn write_cells(worksheet: &mut Worksheet, row_idx: u32, cells: &[Cell]) -> Result<()> {
    for (col_idx, cell) in cells.iter().enumerate() {
        let col = col_idx as u16;
        match cell {
            Cell::Text(value) => {
                worksheet
                    .write_string(row_idx, col, value)
                    .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
            }
            Cell::Number(value) => {
                worksheet
                    .write_number(row_idx, col, *value)
                    .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
            }
            Cell::Empty => {}
        }
    }
    Ok(())
}
