//! Seed the price cache from a JSON file.
//!
//! ```json
//! {
//!   "prices": [
//!     {"title": "Large Eggs 12ct", "price": 3.12, "source": "walmart.com",
//!      "external_link": "https://www.walmart.com/ip/145051970"}
//!   ]
//! }
//! ```
//!
//! Rows are appended like live observations; existing rows are never touched.

use std::path::Path;

use serde::Deserialize;

use price_comparer_api::db::{PriceCache, PriceRepository};
use price_comparer_api::models::NewPriceRecord;
use price_comparer_core::Price;

use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
struct SeedFile {
    prices: Vec<SeedPrice>,
}

#[derive(Debug, Deserialize)]
struct SeedPrice {
    title: String,
    price: Price,
    source: String,
    #[serde(alias = "externalLink", alias = "link")]
    external_link: String,
}

impl From<SeedPrice> for NewPriceRecord {
    fn from(row: SeedPrice) -> Self {
        Self {
            title: row.title,
            price: row.price,
            source: row.source,
            external_link: row.external_link,
        }
    }
}

fn parse(text: &str) -> Result<Vec<NewPriceRecord>, CommandError> {
    let file: SeedFile = serde_json::from_str(text)?;
    Ok(file.prices.into_iter().map(NewPriceRecord::from).collect())
}

/// Append every row in `path` to the price cache.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, or an insert fails.
pub async fn prices(path: &Path) -> Result<usize, CommandError> {
    let text = std::fs::read_to_string(path).map_err(|source| CommandError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records = parse(&text)?;

    let repo = PriceRepository::new(connect().await?);
    for record in &records {
        let id = repo.append(record).await?;
        tracing::debug!(%id, title = %record.title, "Seeded price");
    }

    Ok(records.len())
}
