//! O2D sheet rows reshaped into a date-indexed sales table.
//!
//! The first fetched row is the header. Every data row becomes a
//! [`SaleRecord`] keyed by its calendar date (`date2`, `YYYY-MM-DD`), which is
//! what the dashboard filters on. The table is built once and never mutated.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const TIMESTAMP: &str = "Timestamp";
pub const QTY: &str = "Qty";
pub const DEPARTMENT: &str = "Department";
pub const CATEGORY: &str = "Category";
pub const DESIGN_NO: &str = "Design no.";
pub const COLOUR: &str = "Colour";
pub const CUSTOMER_NAME: &str = "Customer Name";
pub const PRETTURE_NO: &str = "Pretture no.";
pub const BARCODE_NO: &str = "Barcode no.";
pub const NOS: &str = "NOS";

/// Columns shown in the dashboard table, in display order.
pub const TABLE_COLUMNS: [&str; 8] = [
    PRETTURE_NO,
    BARCODE_NO,
    CUSTOMER_NAME,
    DEPARTMENT,
    DESIGN_NO,
    QTY,
    COLOUR,
    NOS,
];

/// How the date part of the `Timestamp` column is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateFormat {
    /// `DD/MM/YYYY`
    #[default]
    DayFirst,
    /// `MM/DD/YYYY`
    MonthFirst,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::DayFirst => "%d/%m/%Y",
            DateFormat::MonthFirst => "%m/%d/%Y",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Sheet has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("Row {row}: date '{value}' does not match {expected}")]
    InvalidDate {
        row: usize,
        value: String,
        expected: &'static str,
    },
    #[error("Row {row}: quantity '{value}' is not a whole number")]
    InvalidQuantity { row: usize, value: String },
}

/// One sold item from the O2D sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleRecord {
    pub timestamp: String,
    pub department: String,
    pub category: String,
    pub design_no: String,
    pub qty: u32,
    pub colour: String,
    pub customer_name: String,
    pub pretture_no: String,
    pub barcode_no: String,
    pub nos: String,
    /// Date part of the timestamp, as written in the sheet.
    pub date: String,
    pub day: String,
    pub month: String,
    pub year: String,
    /// `YYYY-MM-DD`, the filter key.
    pub date2: String,
    /// Every cell of the source row keyed by header.
    pub fields: BTreeMap<String, String>,
}

impl SaleRecord {
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Projection onto [`TABLE_COLUMNS`].
    pub fn table_row(&self) -> TableRow {
        TableRow {
            pretture_no: self.pretture_no.clone(),
            barcode_no: self.barcode_no.clone(),
            customer_name: self.customer_name.clone(),
            department: self.department.clone(),
            design_no: self.design_no.clone(),
            qty: self.qty,
            colour: self.colour.clone(),
            nos: self.nos.clone(),
        }
    }
}

/// A record as displayed in the dashboard table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    #[serde(rename = "Pretture no.")]
    pub pretture_no: String,
    #[serde(rename = "Barcode no.")]
    pub barcode_no: String,
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Design no.")]
    pub design_no: String,
    #[serde(rename = "Qty")]
    pub qty: u32,
    #[serde(rename = "Colour")]
    pub colour: String,
    #[serde(rename = "NOS")]
    pub nos: String,
}

impl TableRow {
    /// Cell text in [`TABLE_COLUMNS`] order.
    pub fn cells(&self) -> [String; 8] {
        [
            self.pretture_no.clone(),
            self.barcode_no.clone(),
            self.customer_name.clone(),
            self.department.clone(),
            self.design_no.clone(),
            self.qty.to_string(),
            self.colour.clone(),
            self.nos.clone(),
        ]
    }

    pub fn is_nos(&self) -> bool {
        self.nos == "Yes"
    }
}

/// Immutable snapshot of the normalized sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesTable {
    headers: Vec<String>,
    records: Vec<SaleRecord>,
}

impl SalesTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Build the sales table from raw sheet rows.
///
/// Row 0 is the header. Rows whose timestamp has no date part are dropped;
/// any other malformed date or quantity fails the whole load.
pub fn normalize(rows: &[Vec<String>], format: DateFormat) -> Result<SalesTable, NormalizeError> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Ok(SalesTable::default());
    };
    let headers = header_row.clone();

    let column = |name: &'static str| headers.iter().position(|h| h == name);
    let timestamp_col = column(TIMESTAMP).ok_or(NormalizeError::MissingColumn(TIMESTAMP))?;
    let qty_col = column(QTY).ok_or(NormalizeError::MissingColumn(QTY))?;

    let mut records = Vec::with_capacity(data_rows.len());
    for (index, row) in data_rows.iter().enumerate() {
        // 1-based sheet row; the header sits on row 1
        let sheet_row = index + 2;
        let cell = |col: usize| row.get(col).map(String::as_str).unwrap_or("");

        let timestamp = cell(timestamp_col);
        let date = timestamp.split(' ').next().unwrap_or("");
        if date.is_empty() {
            continue;
        }

        let parsed = NaiveDate::parse_from_str(date, format.pattern()).map_err(|_| {
            NormalizeError::InvalidDate {
                row: sheet_row,
                value: date.to_string(),
                expected: format.pattern(),
            }
        })?;

        let raw_qty = cell(qty_col);
        let qty = raw_qty
            .trim()
            .parse::<u32>()
            .map_err(|_| NormalizeError::InvalidQuantity {
                row: sheet_row,
                value: raw_qty.to_string(),
            })?;

        let fields: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .map(|(col, name)| (name.clone(), cell(col).to_string()))
            .collect();
        let named = |name: &str| fields.get(name).cloned().unwrap_or_default();

        let day = parsed.format("%d").to_string();
        let month = parsed.format("%m").to_string();
        let year = parsed.format("%Y").to_string();
        let date2 = [year.as_str(), month.as_str(), day.as_str()].join("-");

        records.push(SaleRecord {
            timestamp: timestamp.to_string(),
            department: named(DEPARTMENT),
            category: named(CATEGORY),
            design_no: named(DESIGN_NO),
            qty,
            colour: named(COLOUR),
            customer_name: named(CUSTOMER_NAME),
            pretture_no: named(PRETTURE_NO),
            barcode_no: named(BARCODE_NO),
            nos: named(NOS),
            date: date.to_string(),
            day,
            month,
            year,
            date2,
            fields,
        });
    }

    Ok(SalesTable { headers, records })
}
