//! Append-only expense store over SQLite.
//!
//! Records are immutable once inserted; the only reads are grouped sums.
//! Validation happens upstream in the entry dialogue, never here.

use chrono::{Duration, Local};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::{category::Category, errors::Error, Result};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user TEXT NOT NULL,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    amount REAL NOT NULL,
    created_at TEXT NOT NULL
)";

const AGG_SINCE_SQL: &str = "
SELECT user, category, SUM(amount) FROM expenses
WHERE created_at >= ?1
GROUP BY user, category
ORDER BY category, user";

const AGG_MONTH_SQL: &str = "
SELECT user, category, SUM(amount) FROM expenses
WHERE strftime('%Y-%m', created_at) = ?1
GROUP BY user, category
ORDER BY category, user";

const AGG_ALL_SQL: &str = "
SELECT user, category, SUM(amount) FROM expenses
GROUP BY user, category
ORDER BY category, user";

/// Time window for aggregate reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportWindow {
    /// Since local midnight today.
    Day,
    /// Since 6 days before now.
    Week,
    /// Current calendar month (local year + month match).
    Month,
}

/// One `(user, category)` grouped sum.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotal {
    pub user: String,
    pub category: Category,
    pub total: f64,
}

/// Expense store with connection pooling.
#[derive(Clone)]
pub struct ExpenseStore {
    pool: DbPool,
}

impl ExpenseStore {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        // Writers from different chats may overlap; let SQLite wait instead
        // of failing with SQLITE_BUSY.
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
        let pool = Pool::builder().max_size(10).build(manager)?;
        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Append one record with a fresh id and the current local timestamp.
    pub fn insert(&self, user: &str, category: Category, title: &str, amount: f64) -> Result<i64> {
        let created_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.insert_row(user, category, title, amount, &created_at)
    }

    fn insert_row(
        &self,
        user: &str,
        category: Category,
        title: &str,
        amount: f64,
        created_at: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expenses (user, category, title, amount, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user, category.label(), title, amount, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Grouped sums for the given window, ordered by category then user.
    pub fn aggregate(&self, window: ReportWindow) -> Result<Vec<CategoryTotal>> {
        let (sql, arg) = match window {
            ReportWindow::Day => (
                AGG_SINCE_SQL,
                format!("{} 00:00:00", Local::now().format("%Y-%m-%d")),
            ),
            ReportWindow::Week => (
                AGG_SINCE_SQL,
                (Local::now() - Duration::days(6))
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
            ),
            ReportWindow::Month => (AGG_MONTH_SQL, Local::now().format("%Y-%m").to_string()),
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![arg], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        collect_totals(rows)
    }

    /// Grouped sums over the full history, ordered by category then user.
    pub fn all_time_aggregate(&self) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(AGG_ALL_SQL)?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        collect_totals(rows)
    }

    /// Backdating hook for window tests; production inserts always stamp now.
    #[cfg(test)]
    pub(crate) fn insert_at(
        &self,
        user: &str,
        category: Category,
        title: &str,
        amount: f64,
        created_at: &str,
    ) -> Result<i64> {
        self.insert_row(user, category, title, amount, created_at)
    }

    /// Throwaway on-disk store for tests (file-backed so pooled connections
    /// share the same database).
    #[cfg(test)]
    pub(crate) fn open_temp() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("exb_test_{}_{id}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        Self::open(&path)
    }
}

fn collect_totals(
    rows: impl Iterator<Item = rusqlite::Result<(String, String, f64)>>,
) -> Result<Vec<CategoryTotal>> {
    let mut out = Vec::new();
    for row in rows {
        let (user, label, total) = row?;
        let category = Category::from_label(&label)
            .ok_or_else(|| Error::InvalidData(format!("unknown category in store: {label}")))?;
        out.push(CategoryTotal {
            user,
            category,
            total,
        });
    }
    Ok(out)
}
