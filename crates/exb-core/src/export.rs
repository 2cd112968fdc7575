//! File-producing renderers: CSV export and the stacked weekly chart.
//!
//! The "no data" decision is made by the caller on the pivoted aggregate;
//! these functions assume there is something to write.

use std::path::Path;

use plotters::prelude::*;

use crate::{errors::Error, report::ChartData, store::CategoryTotal, Result};

/// Fixed segment palette, cycled by user first-seen order.
const PALETTE: [RGBColor; 4] = [
    RGBColor(0x3b, 0x7d, 0xdd),
    RGBColor(0xd9, 0x5c, 0x9b),
    RGBColor(0xfd, 0xba, 0x58),
    RGBColor(0x8b, 0xd1, 0x7c),
];

const CHART_TITLE: &str = "Расходы за неделю по категориям";
const Y_AXIS_LABEL: &str = "Сумма, ₽";

/// Write the all-time aggregate as CSV (`user,category,total`), one row per
/// distinct pair. Rows arrive already sorted by category then user.
pub fn write_spreadsheet(rows: &[CategoryTotal], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;

    writer
        .write_record(["user", "category", "total"])
        .map_err(export_err)?;
    for row in rows {
        let total = format!("{:.2}", row.total);
        writer
            .write_record([row.user.as_str(), row.category.label(), total.as_str()])
            .map_err(export_err)?;
    }
    writer.flush().map_err(|e| Error::Export(e.to_string()))?;

    Ok(())
}

/// Render the stacked weekly bar chart to `path`, overwriting any prior file.
///
/// Categories run along the x-axis; each bar stacks one colored segment per
/// user in first-seen order.
pub fn draw_chart(data: &ChartData, path: &Path) -> Result<()> {
    let n = data.categories.len();
    let stacked_max = data
        .totals
        .iter()
        .map(|per_user| per_user.iter().filter(|v| **v > 0.0).sum::<f64>())
        .fold(0.0f64, f64::max);
    let y_max = if stacked_max > 0.0 { stacked_max * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(90)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)
        .map_err(render_err)?;

    let categories = data.categories.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&move |x: &f64| {
            let nearest = x.round();
            if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
                return String::new();
            }
            categories
                .get(nearest as usize)
                .map(|c| c.label().to_string())
                .unwrap_or_default()
        })
        .y_desc(Y_AXIS_LABEL)
        .draw()
        .map_err(render_err)?;

    let mut base = vec![0.0f64; n];
    for (ui, user) in data.users.iter().enumerate() {
        let color = PALETTE[ui % PALETTE.len()];

        let mut bars = Vec::new();
        for (ci, stack_base) in base.iter_mut().enumerate() {
            let value = data.totals[ci][ui];
            if value <= 0.0 {
                continue;
            }
            let x0 = ci as f64 - 0.35;
            let x1 = ci as f64 + 0.35;
            bars.push(Rectangle::new(
                [(x0, *stack_base), (x1, *stack_base + value)],
                color.filled(),
            ));
            *stack_base += value;
        }

        chart
            .draw_series(bars)
            .map_err(render_err)?
            .label(user.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn export_err(e: csv::Error) -> Error {
    Error::Export(e.to_string())
}

fn render_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn row(user: &str, category: Category, total: f64) -> CategoryTotal {
        CategoryTotal {
            user: user.to_string(),
            category,
            total,
        }
    }

    #[test]
    fn spreadsheet_has_header_and_one_row_per_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        let rows = vec![
            row("Анна", Category::FoodAtHome, 125.5),
            row("Борис", Category::FoodAtHome, 300.0),
            row("Анна", Category::Transport, 60.0),
        ];
        write_spreadsheet(&rows, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "user,category,total");
        assert_eq!(lines[1], "Анна,Еда дома,125.50");
        assert_eq!(lines[2], "Борис,Еда дома,300.00");
        assert_eq!(lines[3], "Анна,Транспорт,60.00");
    }

    #[test]
    fn spreadsheet_with_no_rows_still_writes_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        write_spreadsheet(&[], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "user,category,total");
    }

    #[test]
    fn spreadsheet_write_failure_is_an_export_error() {
        let rows = vec![row("Анна", Category::Other, 1.0)];
        let err = write_spreadsheet(&rows, Path::new("/nonexistent-dir/export.csv")).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }
}
