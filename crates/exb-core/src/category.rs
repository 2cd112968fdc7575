use std::fmt;

/// Closed set of expense categories.
///
/// Labels double as the keyboard button texts; category selection only
/// accepts an exact label match, so no free-form strings ever reach the
/// store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    FoodAtHome,
    FoodOut,
    Clothes,
    Kids,
    Transport,
    Utilities,
    HealthBeauty,
    Entertainment,
    Gifts,
    Gadgets,
    Education,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::FoodAtHome,
        Category::FoodOut,
        Category::Clothes,
        Category::Kids,
        Category::Transport,
        Category::Utilities,
        Category::HealthBeauty,
        Category::Entertainment,
        Category::Gifts,
        Category::Gadgets,
        Category::Education,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::FoodAtHome => "Еда дома",
            Category::FoodOut => "Еда вне дома",
            Category::Clothes => "Одежда и обувь",
            Category::Kids => "Детские товары",
            Category::Transport => "Транспорт",
            Category::Utilities => "ЖКХ и жильё",
            Category::HealthBeauty => "Красота и здоровье",
            Category::Entertainment => "Развлечения",
            Category::Gifts => "Подарки",
            Category::Gadgets => "Техника и гаджеты",
            Category::Education => "Образование",
            Category::Other => "Прочее",
        }
    }

    /// Exact label match only; anything else is rejected.
    pub fn from_label(s: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.label() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
