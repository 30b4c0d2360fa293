//! Date-range selection over the sales table.
//!
//! [`select`] is the single handler behind the dashboard: every change of
//! the start or end date re-runs it and every output (table rows, label,
//! both charts) comes from the same invocation.

pub mod chart;
pub mod page;

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::table::{SaleRecord, SalesTable, TableRow};

pub use chart::{Bar, BarChart, ChartError};

pub const DEPARTMENT_CHART_TITLE: &str = "Location-wise Sales";
pub const CATEGORY_CHART_TITLE: &str = "Category-wise Distribution";

/// Everything the page shows for one date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dates: Vec<String>,
    pub label: String,
    pub rows: Vec<TableRow>,
    pub department_chart: BarChart,
    pub category_chart: BarChart,
}

/// Every calendar day from `start` to `end` inclusive, as `YYYY-MM-DD`.
///
/// Empty when `start` is after `end`.
pub fn day_sequence(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| day.format("%Y-%m-%d").to_string())
        .collect()
}

/// Filter the table to `start..=end` and aggregate it.
pub fn select(table: &SalesTable, start: NaiveDate, end: NaiveDate) -> Selection {
    let dates = day_sequence(start, end);
    let wanted: HashSet<&str> = dates.iter().map(String::as_str).collect();

    let matched: Vec<&SaleRecord> = table
        .records()
        .iter()
        .filter(|record| wanted.contains(record.date2.as_str()))
        .collect();

    log::info!(
        "Selected {} of {} records for {} .. {}",
        matched.len(),
        table.len(),
        start,
        end
    );

    let department_chart = BarChart {
        title: DEPARTMENT_CHART_TITLE.to_string(),
        x_label: "Department".to_string(),
        y_label: "Qty".to_string(),
        width: 500,
        height: 250,
        bars: sum_qty_by(&matched, |r| r.department.as_str()),
    };
    let category_chart = BarChart {
        title: CATEGORY_CHART_TITLE.to_string(),
        x_label: "Category".to_string(),
        y_label: "Qty".to_string(),
        width: 700,
        height: 450,
        bars: sum_qty_by(&matched, |r| r.category.as_str()),
    };

    Selection {
        start_date: start,
        end_date: end,
        label: selection_label(&dates),
        rows: matched.iter().map(|r| r.table_row()).collect(),
        dates,
        department_chart,
        category_chart,
    }
}

/// Group by `key` and sum quantities; groups come back sorted by key.
fn sum_qty_by<F>(records: &[&SaleRecord], key: F) -> Vec<Bar>
where
    F: Fn(&SaleRecord) -> &str,
{
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *totals.entry(key(record)).or_default() += u64::from(record.qty);
    }
    totals
        .into_iter()
        .map(|(label, qty)| Bar {
            label: label.to_string(),
            qty,
        })
        .collect()
}

fn selection_label(dates: &[String]) -> String {
    let quoted: Vec<String> = dates.iter().map(|d| format!("'{}'", d)).collect();
    format!("The selected dates are : [{}]", quoted.join(", "))
}
