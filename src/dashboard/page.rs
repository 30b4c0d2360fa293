//! Server-rendered dashboard page.
//!
//! Changing either date input re-submits the form, which re-runs
//! [`super::select`] and renders the whole page from its result.

use chrono::NaiveDate;
use maud::{html, Markup, PreEscaped, Render, DOCTYPE};

use super::{ChartError, Selection};
use crate::table::{TableRow, DESIGN_NO, TABLE_COLUMNS};

const HEADER_STYLE: &str = "background-color:rgb(165,233,246)";
const STYLESHEET: &str = "https://cdn.jsdelivr.net/npm/bootswatch@5.3.2/dist/lux/bootstrap.min.css";

/// Inputs for one render of the page.
pub struct PageView<'a> {
    pub selection: &'a Selection,
    pub min_date: NaiveDate,
    /// 1-based page of the data table.
    pub page: usize,
    pub page_size: usize,
}

impl PageView<'_> {
    pub fn page_count(&self) -> usize {
        self.selection.rows.len().div_ceil(self.page_size.max(1)).max(1)
    }

    /// The requested page clamped into range.
    pub fn current_page(&self) -> usize {
        self.page.clamp(1, self.page_count())
    }

    pub fn visible_rows(&self) -> &[TableRow] {
        let size = self.page_size.max(1);
        let start = (self.current_page() - 1) * size;
        let end = (start + size).min(self.selection.rows.len());
        self.selection.rows.get(start..end).unwrap_or(&[])
    }
}

pub fn render_page(view: &PageView<'_>) -> Result<String, ChartError> {
    let selection = view.selection;
    let department_svg = selection.department_chart.render_svg()?;
    let category_svg = selection.category_chart.render_svg()?;

    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "O2D Dashboard" }
                link rel="stylesheet" href=(STYLESHEET);
                style { "td.nos{background-color:tomato;color:white}" }
            }
            body {
                div.container {
                    br;
                    div.row {
                        div class="col-4" {
                            div.row {
                                h3 style={ (HEADER_STYLE) ";text-align:left" } { "Select Date Range" }
                                (DateRangeForm { view })
                            }
                            br;
                            div.row {
                                h3 style=(HEADER_STYLE) { (selection.department_chart.title) }
                                div id="location-sales" { (PreEscaped(department_svg)) }
                            }
                        }
                        div class="col-8" {
                            h3 style={ (HEADER_STYLE) ";text-align:center" } { "Data from O2D client" }
                            (DataTable { view })
                            (Paginate { view })
                        }
                    }
                    br; br;
                    div.row {
                        div.col {
                            h3 style={ (HEADER_STYLE) ";text-align:center" } { (selection.category_chart.title) }
                            div id="category-graph" { (PreEscaped(category_svg)) }
                        }
                    }
                    br;
                    label id="date-selection-show" style="vertical-align:middle" { (selection.label) }
                }
            }
        }
    };
    Ok(markup.into_string())
}

struct DateRangeForm<'a, 'b> {
    view: &'a PageView<'b>,
}

impl Render for DateRangeForm<'_, '_> {
    fn render(&self) -> Markup {
        let min = self.view.min_date.format("%Y-%m-%d").to_string();
        let start = self.view.selection.start_date.format("%Y-%m-%d").to_string();
        let end = self.view.selection.end_date.format("%Y-%m-%d").to_string();
        html! {
            form id="date-range" method="get" action="/" {
                input type="date" name="start_date" min=(min) value=(start) onchange="this.form.submit()";
                input type="date" name="end_date" min=(min) value=(end) onchange="this.form.submit()";
            }
        }
    }
}

struct DataTable<'a, 'b> {
    view: &'a PageView<'b>,
}

impl Render for DataTable<'_, '_> {
    fn render(&self) -> Markup {
        html! {
            table id="o2d-table" class="table" {
                thead {
                    tr {
                        @for column in TABLE_COLUMNS {
                            th { (column) }
                        }
                    }
                }
                tbody {
                    @for row in self.view.visible_rows() {
                        tr {
                            @for (column, cell) in TABLE_COLUMNS.iter().zip(row.cells()) {
                                @if *column == DESIGN_NO && row.is_nos() {
                                    td.nos { (cell) }
                                } @else {
                                    td { (cell) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Previous/next links that keep the selected range in the query.
struct Paginate<'a, 'b> {
    view: &'a PageView<'b>,
}

impl Render for Paginate<'_, '_> {
    fn render(&self) -> Markup {
        let current = self.view.current_page();
        let count = self.view.page_count();
        let query_prefix = format!(
            "/?start_date={}&end_date={}&page=",
            self.view.selection.start_date.format("%Y-%m-%d"),
            self.view.selection.end_date.format("%Y-%m-%d"),
        );
        html! {
            nav.pagination {
                @if current > 1 {
                    a href={ (query_prefix) (current - 1) } { "<" }
                    " "
                }
                span { (current) " / " (count) }
                @if current < count {
                    " "
                    a href={ (query_prefix) (current + 1) } { ">" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::select;
    use crate::table::{normalize, DateFormat, SalesTable};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn table_with(rows: usize) -> SalesTable {
        let mut grid = vec![vec![
            "Timestamp".to_string(),
            "Design no.".to_string(),
            "Qty".to_string(),
            "NOS".to_string(),
            "Customer Name".to_string(),
        ]];
        for i in 0..rows {
            grid.push(vec![
                "01/08/2023 10:00".to_string(),
                format!("D-{i}"),
                "1".to_string(),
                if i == 0 { "Yes" } else { "No" }.to_string(),
                "A <b> & Co".to_string(),
            ]);
        }
        normalize(&grid, DateFormat::DayFirst).unwrap()
    }

    #[test]
    fn test_pagination_bounds() {
        let table = table_with(23);
        let selection = select(&table, date("2023-08-01"), date("2023-08-01"));
        let mut view = PageView {
            selection: &selection,
            min_date: date("2023-01-01"),
            page: 1,
            page_size: 10,
        };
        assert_eq!(view.page_count(), 3);
        assert_eq!(view.visible_rows().len(), 10);

        view.page = 3;
        assert_eq!(view.visible_rows().len(), 3);
        assert_eq!(view.visible_rows()[0].design_no, "D-20");

        view.page = 99;
        assert_eq!(view.current_page(), 3);
        view.page = 0;
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn test_empty_selection_has_one_page() {
        let selection = select(&SalesTable::default(), date("2023-08-01"), date("2023-08-01"));
        let view = PageView {
            selection: &selection,
            min_date: date("2023-01-01"),
            page: 1,
            page_size: 10,
        };
        assert_eq!(view.page_count(), 1);
        assert!(view.visible_rows().is_empty());
    }

    #[test]
    fn test_render_page_layout() {
        let table = table_with(2);
        let selection = select(&table, date("2023-08-01"), date("2023-08-09"));
        let html = render_page(&PageView {
            selection: &selection,
            min_date: date("2023-01-01"),
            page: 1,
            page_size: 10,
        })
        .unwrap();

        assert!(html.contains("name=\"start_date\" min=\"2023-01-01\" value=\"2023-08-01\""));
        assert!(html.contains("name=\"end_date\" min=\"2023-01-01\" value=\"2023-08-09\""));
        assert!(html.contains("<th>Pretture no.</th>"));
        assert!(html.contains("<td class=\"nos\">D-0</td>"));
        assert!(html.contains("<td>D-1</td>"));
        assert!(html.contains("A &lt;b&gt; &amp; Co"));
        assert!(html.contains("Location-wise Sales"));
        assert!(html.contains("Category-wise Distribution"));
        assert!(html.contains("The selected dates are : ['2023-08-01'"));
        assert!(html.contains("<span>1 / 1</span>"));
    }

    #[test]
    fn test_pagination_links_keep_range() {
        let table = table_with(23);
        let selection = select(&table, date("2023-08-01"), date("2023-08-01"));
        let html = render_page(&PageView {
            selection: &selection,
            min_date: date("2023-01-01"),
            page: 2,
            page_size: 10,
        })
        .unwrap();

        assert!(html.contains("<span>2 / 3</span>"));
        assert!(html.contains("href=\"/?start_date=2023-08-01&amp;end_date=2023-08-01&amp;page=1\""));
        assert!(html.contains("href=\"/?start_date=2023-08-01&amp;end_date=2023-08-01&amp;page=3\""));
    }

    #[test]
    fn test_sheet_text_is_escaped() {
        let grid = vec![
            vec!["Timestamp".to_string(), "Design no.".to_string(), "Qty".to_string()],
            vec![
                "01/08/2023 10:00".to_string(),
                "<script>alert(1)</script>".to_string(),
                "1".to_string(),
            ],
        ];
        let table = normalize(&grid, DateFormat::DayFirst).unwrap();
        let selection = select(&table, date("2023-08-01"), date("2023-08-01"));
        let html = render_page(&PageView {
            selection: &selection,
            min_date: date("2023-01-01"),
            page: 1,
            page_size: 10,
        })
        .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }
}
