//! Report export subsystem — writes the analysis report as an XLSX workbook
//!
//! One workbook per analysis: a `Summary` sheet with the four relation
//! counts, then one detail sheet per relation with its fixed column schema.
//! File names are uuid-suffixed so concurrent requests never collide.

use std::path::Path;

use anyhow::Result;
use hazlink_core::report::{
    NM_INC_HEADERS, PREVENTED_HEADERS, RELATION_NM_INC, RELATION_PREVENTED, RELATION_SO_INC,
    RELATION_SO_NM_INC, SO_INC_HEADERS, SO_NM_INC_HEADERS, SUMMARY_HEADERS,
};
use hazlink_core::Report;
use rust_xlsxwriter::{Workbook, Worksheet};
use uuid::Uuid;

/// Write `report` into `report_dir` and return the generated file name.
pub fn write_report(report: &Report, report_dir: &Path) -> Result<String> {
    std::fs::create_dir_all(report_dir)?;
    let file_name = format!("safety-report-{}.xlsx", Uuid::new_v4());

    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;
    write_header_row(sheet, &SUMMARY_HEADERS)?;
    let metrics = [
        (RELATION_SO_INC, report.counts.so_inc),
        (RELATION_NM_INC, report.counts.nm_inc),
        (RELATION_SO_NM_INC, report.counts.so_nm_inc),
        (RELATION_PREVENTED, report.counts.prevented),
    ];
    for (i, (name, count)) in metrics.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, *name)?;
        sheet.write_number(row, 1, *count as f64)?;
    }

    write_table(
        workbook.add_worksheet(),
        "SO_to_Incident",
        &SO_INC_HEADERS,
        report.so_inc.iter().map(|r| r.cells()),
    )?;
    write_table(
        workbook.add_worksheet(),
        "NM_to_Incident",
        &NM_INC_HEADERS,
        report.nm_inc.iter().map(|r| r.cells()),
    )?;
    write_table(
        workbook.add_worksheet(),
        "SO_NM_to_Incident",
        &SO_NM_INC_HEADERS,
        report.so_nm_inc.iter().map(|r| r.cells()),
    )?;
    write_table(
        workbook.add_worksheet(),
        "Prevented_Risks",
        &PREVENTED_HEADERS,
        report.prevented.iter().map(|r| r.cells()),
    )?;

    let path = report_dir.join(&file_name);
    workbook.save(&path)?;
    tracing::info!(file = %path.display(), "Report workbook written");

    Ok(file_name)
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    Ok(())
}

fn write_table<I>(sheet: &mut Worksheet, name: &str, headers: &[&str], rows: I) -> Result<()>
where
    I: Iterator<Item = Vec<String>>,
{
    sheet.set_name(name)?;
    write_header_row(sheet, headers)?;
    for (i, row) in rows.enumerate() {
        for (col, cell) in row.iter().enumerate() {
            sheet.write_string((i + 1) as u32, col as u16, cell.as_str())?;
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
