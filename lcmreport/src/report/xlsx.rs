//! XLSX report backed by umya-spreadsheet.
//!
//! The file is reopened, appended to and rewritten for every device. Writes
//! go to a sibling temp file that is then renamed over the report, so a
//! reader never sees a half-written workbook.

use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, info};
use umya_spreadsheet::helper::coordinate::string_from_column_index;
use umya_spreadsheet::{Spreadsheet, reader, writer};

use super::{ReportSink, check_shape, header_widths};
use crate::error::ReportError;
use crate::extract::{DeviceRows, Row};
use crate::schema::ReportSchema;

/// Sheet every new workbook starts with; it becomes the first report sheet.
const DEFAULT_SHEET: &str = "Sheet1";

/// Spreadsheet report on disk.
#[derive(Debug, Clone)]
pub struct XlsxReport {
    path: PathBuf,
    widths: IndexMap<String, usize>,
}

impl XlsxReport {
    /// Create the report with every sheet and its header, then persist it.
    pub fn create(path: impl Into<PathBuf>, schema: &ReportSchema) -> Result<Self, ReportError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut book = umya_spreadsheet::new_file();
        for (position, sheet) in schema.sheets.iter().enumerate() {
            let sheet_error = |message: &str| ReportError::Sheet {
                sheet: sheet.title.clone(),
                message: message.to_string(),
            };
            let worksheet = if position == 0 {
                let first = book
                    .get_sheet_by_name_mut(DEFAULT_SHEET)
                    .ok_or_else(|| sheet_error("new workbook has no default sheet"))?;
                first.set_name(sheet.title.as_str());
                first
            } else {
                book.new_sheet(&sheet.title).map_err(sheet_error)?
            };
            for (index, header) in sheet.columns.iter().enumerate() {
                worksheet
                    .get_cell_mut((column_number(index), 1))
                    .set_value_string(header.header.clone());
            }
            let last_column = column_number(sheet.width().saturating_sub(1));
            worksheet.set_auto_filter(format!(
                "A1:{}1",
                string_from_column_index(&last_column)
            ));
        }

        let report = Self {
            path,
            widths: header_widths(schema),
        };
        report.persist(&book)?;
        info!("Report created at {}", report.path.display());
        Ok(report)
    }

    /// Read back every row of `sheet`, header first.
    pub fn read_sheet(&self, sheet: &str) -> Result<Vec<Row>, ReportError> {
        let width = *self
            .widths
            .get(sheet)
            .ok_or_else(|| ReportError::MissingSheet(sheet.to_string()))?;
        let book = self.load()?;
        let worksheet = book
            .get_sheet_by_name(sheet)
            .ok_or_else(|| ReportError::MissingSheet(sheet.to_string()))?;

        Ok((1..=worksheet.get_highest_row())
            .map(|row| {
                (0..width)
                    .map(|index| worksheet.get_value((column_number(index), row)))
                    .collect()
            })
            .collect())
    }

    fn load(&self) -> Result<Spreadsheet, ReportError> {
        reader::xlsx::read(&self.path).map_err(|e| ReportError::Read {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn persist(&self, book: &Spreadsheet) -> Result<(), ReportError> {
        let staging = self.path.with_extension("xlsx.tmp");
        writer::xlsx::write(book, &staging).map_err(|e| ReportError::Write {
            path: staging.clone(),
            message: e.to_string(),
        })?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl ReportSink for XlsxReport {
    fn append_device_rows(&mut self, rows: &DeviceRows) -> Result<(), ReportError> {
        check_shape(&self.widths, rows)?;

        let mut book = self.load()?;
        for sheet in &rows.sheets {
            let worksheet = book
                .get_sheet_by_name_mut(&sheet.sheet)
                .ok_or_else(|| ReportError::MissingSheet(sheet.sheet.clone()))?;
            let mut next = worksheet.get_highest_row() + 1;
            for row in &sheet.rows {
                for (index, value) in row.iter().enumerate() {
                    worksheet
                        .get_cell_mut((column_number(index), next))
                        .set_value_string(value.clone());
                }
                next += 1;
            }
        }
        self.persist(&book)?;

        debug!(
            "{}: {} rows written to {}",
            rows.device,
            rows.row_count(),
            self.path.display()
        );
        Ok(())
    }
}

/// 1-based spreadsheet column number of a 0-based index.
fn column_number(index: usize) -> u32 {
    index as u32 + 1
}
