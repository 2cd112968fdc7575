use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed runtime configuration.
///
/// `BOT_TOKEN` and `BOT_PASSWORD` are required; missing either aborts startup
/// before any update is served.
#[derive(Clone, Debug)]
pub struct Config {
    /// Telegram bot API token, passed through to the transport adapter.
    pub bot_token: String,
    /// Shared secret every caller must supply once per process lifetime.
    pub shared_password: String,
    /// SQLite file holding the expense table.
    pub db_path: PathBuf,
    /// Where the CSV export is written before being sent as a document.
    pub export_path: PathBuf,
    /// Fixed chart location, overwritten on every render.
    pub chart_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;
        let shared_password = env_str("BOT_PASSWORD").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_PASSWORD environment variable is required".to_string())
        })?;

        let db_path = env_path("EXPENSES_DB").unwrap_or_else(|| PathBuf::from("expenses.db"));
        let export_path =
            env_path("EXPORT_PATH").unwrap_or_else(|| env::temp_dir().join("expenses_export.csv"));
        let chart_path =
            env_path("CHART_PATH").unwrap_or_else(|| PathBuf::from("expenses_plot.png"));

        Ok(Self {
            bot_token,
            shared_password,
            db_path,
            export_path,
            chart_path,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
