/// Reply keyboard shown under the input field (button texts come back as
/// plain message text).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

impl ReplyKeyboard {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Lay out labels `per_row` buttons per row.
    pub fn from_labels(labels: impl IntoIterator<Item = String>, per_row: usize) -> Self {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for label in labels {
            match rows.last_mut() {
                Some(row) if row.len() < per_row => row.push(label),
                _ => rows.push(vec![label]),
            }
        }
        Self { rows }
    }
}
