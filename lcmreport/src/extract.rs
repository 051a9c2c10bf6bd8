//! Mapping device outcomes onto report rows.

use crate::poller::DeviceOutcome;
use crate::schema::{ColumnSource, ReportSchema, RowMode, SheetSchema};

/// Cell value for a fact that could not be collected.
pub const UNKNOWN: &str = "unknown";

pub type Row = Vec<String>;

/// Rows one device contributes to one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRows {
    pub sheet: String,
    pub rows: Vec<Row>,
}

/// Rows one device contributes to the whole report, in sheet order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRows {
    pub device: String,
    pub sheets: Vec<SheetRows>,
}

impl DeviceRows {
    pub fn sheet(&self, title: &str) -> Option<&SheetRows> {
        self.sheets.iter().find(|sheet| sheet.sheet == title)
    }

    /// Total number of rows over all sheets.
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.rows.len()).sum()
    }
}

/// Pure mapping from [`DeviceOutcome`] to [`DeviceRows`] for one schema.
///
/// Missing facts become [`UNKNOWN`]; a row is never dropped because a
/// command failed. Per-device sheets always get exactly one row. Per-record
/// sheets get one row per record of their driving command, with other
/// commands' records joined by position or key; a connected device whose driving
/// command produced nothing still gets one row, an unreachable device gets
/// none. With a join key, a secondary record lands on the row whose driving
/// record has the same key value, and a row without a match reads
/// [`UNKNOWN`].
#[derive(Debug, Clone, Copy)]
pub struct FactExtractor<'a> {
    schema: &'a ReportSchema,
}

impl<'a> FactExtractor<'a> {
    pub fn new(schema: &'a ReportSchema) -> Self {
        Self { schema }
    }

    pub fn extract(&self, outcome: &DeviceOutcome) -> DeviceRows {
        DeviceRows {
            device: outcome.device.clone(),
            sheets: self
                .schema
                .sheets
                .iter()
                .map(|sheet| SheetRows {
                    sheet: sheet.title.clone(),
                    rows: sheet_rows(sheet, outcome),
                })
                .collect(),
        }
    }
}

fn sheet_rows(sheet: &SheetSchema, outcome: &DeviceOutcome) -> Vec<Row> {
    match &sheet.rows {
        RowMode::PerDevice => vec![row(sheet, outcome, |_| Some(0))],
        RowMode::PerRecord { .. } if !outcome.is_connected() => Vec::new(),
        RowMode::PerRecord { command, key } => {
            let records = outcome.output(command).map_or(0, |output| output.len());
            if records == 0 {
                vec![row(sheet, outcome, |_| None)]
            } else {
                (0..records)
                    .map(|index| {
                        row(sheet, outcome, |other| {
                            joined_record(outcome, command, key.as_deref(), index, other)
                        })
                    })
                    .collect()
            }
        }
    }
}

/// Index of the `other` record that belongs with record `index` of the
/// driving command.
fn joined_record(
    outcome: &DeviceOutcome,
    driver: &str,
    key: Option<&str>,
    index: usize,
    other: &str,
) -> Option<usize> {
    let Some(key) = key.filter(|_| other != driver) else {
        return Some(index);
    };
    let wanted = outcome.output(driver)?.field(index, key)?.trim();
    let output = outcome.output(other)?;
    (0..output.len())
        .find(|&candidate| output.field(candidate, key).map(str::trim) == Some(wanted))
}

/// One row; `locate` picks the record of each command, `None` leaves its
/// fields unknown.
fn row<F>(sheet: &SheetSchema, outcome: &DeviceOutcome, locate: F) -> Row
where
    F: Fn(&str) -> Option<usize>,
{
    sheet
        .columns
        .iter()
        .map(|column| match &column.source {
            ColumnSource::DeviceName => outcome.device.clone(),
            ColumnSource::Host => outcome.host.clone(),
            ColumnSource::DeviceType => outcome.device_type.clone(),
            ColumnSource::Field { command, field } => locate(command)
                .and_then(|index| outcome.output(command)?.field(index, field))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string(),
        })
        .collect()
}
