//! Report sinks.
//!
//! A report is a fixed set of sheets, each with a header row and rows
//! appended one device at a time. [`XlsxReport`] persists every append so
//! that an interrupted run keeps the devices it already finished.
//! [`MemoryReport`] keeps everything in memory.

mod xlsx;

pub use xlsx::XlsxReport;

use indexmap::IndexMap;

use crate::error::ReportError;
use crate::extract::{DeviceRows, Row};
use crate::schema::ReportSchema;

/// Append-only destination for device rows.
pub trait ReportSink {
    /// Append one device's rows. Either every row is stored or none is.
    fn append_device_rows(&mut self, rows: &DeviceRows) -> Result<(), ReportError>;
}

/// Check `rows` against the sheets' header widths before anything is written.
fn check_shape(widths: &IndexMap<String, usize>, rows: &DeviceRows) -> Result<(), ReportError> {
    for sheet in &rows.sheets {
        let expected = *widths
            .get(&sheet.sheet)
            .ok_or_else(|| ReportError::MissingSheet(sheet.sheet.clone()))?;
        if let Some(row) = sheet.rows.iter().find(|row| row.len() != expected) {
            return Err(ReportError::RowShape {
                sheet: sheet.sheet.clone(),
                expected,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

fn header_widths(schema: &ReportSchema) -> IndexMap<String, usize> {
    schema
        .sheets
        .iter()
        .map(|sheet| (sheet.title.clone(), sheet.width()))
        .collect()
}

/// In-memory report.
#[derive(Debug, Clone, Default)]
pub struct MemoryReport {
    headers: IndexMap<String, Row>,
    rows: IndexMap<String, Vec<Row>>,
}

impl MemoryReport {
    pub fn new(schema: &ReportSchema) -> Self {
        Self {
            headers: schema
                .sheets
                .iter()
                .map(|sheet| (sheet.title.clone(), sheet.headers()))
                .collect(),
            rows: schema
                .sheets
                .iter()
                .map(|sheet| (sheet.title.clone(), Vec::new()))
                .collect(),
        }
    }

    pub fn header(&self, sheet: &str) -> Option<&[String]> {
        self.headers.get(sheet).map(Vec::as_slice)
    }

    /// Data rows of `sheet`, header excluded.
    pub fn rows(&self, sheet: &str) -> &[Row] {
        self.rows.get(sheet).map_or(&[], Vec::as_slice)
    }
}

impl ReportSink for MemoryReport {
    fn append_device_rows(&mut self, rows: &DeviceRows) -> Result<(), ReportError> {
        let widths = self
            .headers
            .iter()
            .map(|(title, header)| (title.clone(), header.len()))
            .collect();
        check_shape(&widths, rows)?;

        for sheet in &rows.sheets {
            self.rows
                .entry(sheet.sheet.clone())
                .or_default()
                .extend(sheet.rows.iter().cloned());
        }
        Ok(())
    }
}
