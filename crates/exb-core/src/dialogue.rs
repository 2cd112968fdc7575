//! Guided expense entry flow: category → title → amount.
//!
//! `advance` is a pure transition function; all store writes and outbound
//! replies happen in the dispatcher based on the returned `Outcome`.

use crate::category::Category;

pub const CATEGORY_PROMPT: &str = "Выберите категорию:";
pub const TITLE_PROMPT: &str = "Введите название покупки:";
pub const AMOUNT_PROMPT: &str = "Введите сумму (без руб):";

pub const CATEGORY_RETRY: &str = "Пожалуйста, выберите категорию только из кнопок.";
pub const AMOUNT_RETRY: &str = "Не похоже на число. Проверьте ввод.";

/// Current step of the entry flow; later steps carry the data collected so
/// far, so clearing the state always clears the pending entry with it.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryState {
    Category,
    Title { category: Category },
    Amount { category: Category, title: String },
}

/// A fully collected expense, ready to be stored.
#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub category: Category,
    pub title: String,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Input rejected; state and pending data unchanged, re-prompt.
    Retry(&'static str),
    /// Advance to the next step.
    Next(EntryState, &'static str),
    /// Flow finished; insert the expense and confirm.
    Complete(NewExpense),
}

pub fn advance(state: EntryState, input: &str) -> Outcome {
    match state {
        EntryState::Category => match Category::from_label(input) {
            Some(category) => Outcome::Next(EntryState::Title { category }, TITLE_PROMPT),
            None => Outcome::Retry(CATEGORY_RETRY),
        },
        EntryState::Title { category } => {
            let title = input.trim();
            if title.is_empty() {
                return Outcome::Retry(TITLE_PROMPT);
            }
            Outcome::Next(
                EntryState::Amount {
                    category,
                    title: title.to_string(),
                },
                AMOUNT_PROMPT,
            )
        }
        EntryState::Amount { category, title } => match parse_amount(input) {
            Some(amount) => Outcome::Complete(NewExpense {
                category,
                title,
                amount,
            }),
            None => Outcome::Retry(AMOUNT_RETRY),
        },
    }
}

/// Decimal comma is common on Russian keyboards; normalize before parsing.
pub fn parse_amount(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}
