#![deny(warnings)]

use persistence::{default_sqlite_url, init_db, SqliteStore, ASSUMPTIONS_KEY, TRIP_BUDGET_KEY};
use trip_core::{Assumptions, TripBudget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    // Ensure directory exists
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path.filter(|p| !p.starts_with(":memory:")) {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = SqliteStore::new(init_db(&url).await?);
    // Seed defaults so the first load reads a stored record
    if store.get(ASSUMPTIONS_KEY).await?.is_none() {
        store.save(&Assumptions::default()).await?;
    }
    if store.get(TRIP_BUDGET_KEY).await?.is_none() {
        store.save(&TripBudget::default()).await?;
    }
    println!("DB migrated at {}", url);
    Ok(())
}
