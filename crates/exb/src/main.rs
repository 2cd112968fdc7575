use std::sync::Arc;

use exb_core::{config::Config, store::ExpenseStore};

#[tokio::main]
async fn main() -> Result<(), exb_core::Error> {
    exb_core::logging::init("exb")?;

    let cfg = Arc::new(Config::load()?);
    let store = ExpenseStore::open(&cfg.db_path)?;

    exb_telegram::router::run_polling(cfg, store)
        .await
        .map_err(|e| exb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
