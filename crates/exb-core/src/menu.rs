//! Fixed command/button labels and keyboard layouts.
//!
//! Routing is exact string equality against these labels, so they are the
//! single source of truth for both the keyboards and the dispatcher.

use crate::{category::Category, messaging::types::ReplyKeyboard};

pub const START: &str = "/start";
pub const ADD_EXPENSE: &str = "Добавить расход";
pub const REPORT_DAY: &str = "Отчет день";
pub const REPORT_WEEK: &str = "Отчет неделя";
pub const REPORT_MONTH: &str = "Отчет месяц";
pub const EXPORT_SPREADSHEET: &str = "Экспорт в CSV";
pub const EXPORT_CHART: &str = "График PNG";

pub const MAIN_MENU_TEXT: &str = "Добро пожаловать! Выберите действие:";

pub fn main_menu() -> ReplyKeyboard {
    ReplyKeyboard::new(vec![
        vec![ADD_EXPENSE.to_string()],
        vec![
            REPORT_MONTH.to_string(),
            REPORT_WEEK.to_string(),
            REPORT_DAY.to_string(),
        ],
        vec![EXPORT_SPREADSHEET.to_string(), EXPORT_CHART.to_string()],
    ])
}

pub fn category_menu() -> ReplyKeyboard {
    ReplyKeyboard::from_labels(Category::ALL.iter().map(|c| c.label().to_string()), 2)
}
