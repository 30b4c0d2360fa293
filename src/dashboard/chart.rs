use plotters::prelude::*;
use plotters::style::RGBColor;
use serde::Serialize;

const BAR_COLOR: RGBColor = RGBColor(99, 110, 250);

#[derive(Debug, thiserror::Error)]
#[error("Failed to draw chart '{title}': {message}")]
pub struct ChartError {
    title: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub label: String,
    pub qty: u64,
}

/// A vertical bar chart of summed quantities, one bar per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn total(&self) -> u64 {
        self.bars.iter().map(|b| b.qty).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Render to a standalone SVG document. Bar values are printed above
    /// each bar; a chart without bars draws only its title.
    pub fn render_svg(&self) -> Result<String, ChartError> {
        let mut buffer = String::new();
        {
            let backend = SVGBackend::with_string(&mut buffer, (self.width, self.height));
            self.draw(backend).map_err(|e| ChartError {
                title: self.title.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(buffer)
    }

    fn draw<'a, DB>(&self, backend: DB) -> Result<(), Box<dyn std::error::Error + 'a>>
    where
        DB: DrawingBackend + 'a,
    {
        let root = backend.into_drawing_area();
        root.fill(&WHITE)?;

        if self.bars.is_empty() {
            root.draw(&Text::new(
                self.title.as_str(),
                (20, 20),
                ("sans-serif", 14).into_font(),
            ))?;
            root.present()?;
            return Ok(());
        }

        let count = self.bars.len() as u32;
        let max_qty = self.bars.iter().map(|b| b.qty).max().unwrap_or(0);
        // headroom for the value labels
        let y_top = max_qty + max_qty / 10 + 1;

        let mut chart = ChartBuilder::on(&root)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .margin(10)
            .build_cartesian_2d((0u32..count).into_segmented(), 0u64..y_top)?;

        let names: Vec<&str> = self.bars.iter().map(|b| b.label.as_str()).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_labels(names.len())
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(index) => names
                    .get(*index as usize)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(8)
                .data(self.bars.iter().enumerate().map(|(i, b)| (i as u32, b.qty))),
        )?;

        chart.draw_series(self.bars.iter().enumerate().map(|(i, b)| {
            Text::new(
                b.qty.to_string(),
                (SegmentValue::CenterOf(i as u32), b.qty),
                ("sans-serif", 12).into_font(),
            )
        }))?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(bars: &[(&str, u64)]) -> BarChart {
        BarChart {
            title: "Location-wise Sales".to_string(),
            x_label: "Department".to_string(),
            y_label: "Qty".to_string(),
            width: 500,
            height: 250,
            bars: bars
                .iter()
                .map(|(label, qty)| Bar {
                    label: label.to_string(),
                    qty: *qty,
                })
                .collect(),
        }
    }

    #[test]
    fn test_render_svg_with_bars() {
        let svg = chart(&[("Store A", 5), ("Store B", 3)]).render_svg().unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Store A"));
        assert!(svg.contains("Store B"));
        assert!(svg.contains(">5<"));
    }

    #[test]
    fn test_render_svg_empty_chart() {
        let svg = chart(&[]).render_svg().unwrap();
        assert!(svg.contains("Location-wise Sales"));
        assert!(!svg.contains("Department"));
    }

    #[test]
    fn test_total() {
        assert_eq!(chart(&[("a", 2), ("b", 40)]).total(), 42);
        assert_eq!(chart(&[]).total(), 0);
        assert!(chart(&[]).is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(chart(&[("a", 1)])).unwrap();
        assert_eq!(json["xLabel"], "Department");
        assert_eq!(json["bars"][0]["qty"], 1);
    }
}
