//! Aggregate-to-presentation logic: text summaries and the chart pivot.
//!
//! Everything here is pure; file writing and drawing live in `export` so
//! this logic is testable without touching the filesystem.

use crate::{
    category::Category,
    store::{CategoryTotal, ReportWindow},
};

pub fn report_header(window: ReportWindow) -> &'static str {
    match window {
        ReportWindow::Day => "📊 Расходы за сегодня:",
        ReportWindow::Week => "📊 Расходы за неделю:",
        ReportWindow::Month => "📊 Расходы за месяц:",
    }
}

pub fn no_data_message(window: ReportWindow) -> &'static str {
    match window {
        ReportWindow::Day => "За сегодня ещё нет расходов.",
        ReportWindow::Week => "За неделю ещё нет расходов.",
        ReportWindow::Month => "Нет расходов за этот месяц.",
    }
}

/// Multi-line summary for a window, or `None` when there is nothing to show.
pub fn render_text_report(window: ReportWindow, rows: &[CategoryTotal]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut out = String::from(report_header(window));
    for row in rows {
        out.push('\n');
        out.push_str(&format!("{}: {} — {:.2} ₽", row.user, row.category, row.total));
    }
    Some(out)
}

/// Category × user matrix for the stacked chart.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartData {
    pub categories: Vec<Category>,
    /// First-seen order; drives the palette assignment.
    pub users: Vec<String>,
    /// `totals[category index][user index]`, missing pairs are zero.
    pub totals: Vec<Vec<f64>>,
}

/// Pivot grouped sums into chart axes, or `None` when there is no data.
pub fn pivot_chart_data(rows: &[CategoryTotal]) -> Option<ChartData> {
    if rows.is_empty() {
        return None;
    }

    let mut categories: Vec<Category> = Vec::new();
    let mut users: Vec<String> = Vec::new();
    for row in rows {
        if !categories.contains(&row.category) {
            categories.push(row.category);
        }
        if !users.iter().any(|u| u == &row.user) {
            users.push(row.user.clone());
        }
    }

    let mut totals = vec![vec![0.0; users.len()]; categories.len()];
    for row in rows {
        let ci = categories.iter().position(|c| *c == row.category);
        let ui = users.iter().position(|u| u == &row.user);
        if let (Some(ci), Some(ui)) = (ci, ui) {
            totals[ci][ui] += row.total;
        }
    }

    Some(ChartData {
        categories,
        users,
        totals,
    })
}
