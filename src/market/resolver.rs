use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::PriceQuote;
use crate::api::{decode, Fetch, FetchError, Resource};
use crate::config::{PriceConfig, MAX_PRICE_BATCH};
use crate::models::ItemId;

#[derive(Debug, Clone, Error)]
pub enum PriceError {
    /// The market endpoint could not be reached, including exhausted
    /// throttling retries.
    #[error("price lookup failed: {0}")]
    Unreachable(FetchError),

    /// The market endpoint returned data that could not be interpreted.
    #[error("price data malformed: {0}")]
    Malformed(FetchError),
}

impl From<FetchError> for PriceError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Malformed { .. } => PriceError::Malformed(err),
            _ => PriceError::Unreachable(err),
        }
    }
}

/// One item's listing in a bulk price response.
#[derive(Debug, Deserialize)]
struct PriceListing {
    id: u32,
    #[serde(default)]
    buys: Option<ListingSide>,
    #[serde(default)]
    sells: Option<ListingSide>,
}

#[derive(Debug, Deserialize)]
struct ListingSide {
    unit_price: u32,
    quantity: u32,
}

impl ListingSide {
    /// A side with no standing orders carries no price.
    fn price(&self) -> Option<u32> {
        (self.quantity > 0 && self.unit_price > 0).then_some(self.unit_price)
    }
}

impl From<PriceListing> for PriceQuote {
    fn from(listing: PriceListing) -> Self {
        PriceQuote::new(
            ItemId::new(listing.id),
            listing.buys.as_ref().and_then(ListingSide::price),
            listing.sells.as_ref().and_then(ListingSide::price),
        )
    }
}

/// Resolves current market quotes for a set of item ids.
///
/// The bulk endpoint accepts a bounded number of ids per request; larger
/// sets are split into batches issued concurrently through the shared
/// fetcher and merged back into one mapping.
pub struct PriceResolver {
    fetcher: Arc<dyn Fetch>,
    batch_size: usize,
}

impl PriceResolver {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            batch_size: MAX_PRICE_BATCH,
        }
    }

    pub fn with_config(mut self, config: &PriceConfig) -> Self {
        self.batch_size = config.batch_size.clamp(1, MAX_PRICE_BATCH);
        self
    }

    /// Resolve quotes for every id in `ids`.
    ///
    /// The result is equivalent to one unbounded request: every requested id
    /// is present in the returned mapping. Ids the market does not list come
    /// back as explicit unlisted quotes rather than being dropped, so the
    /// valuation layer can flag them instead of silently valuing at zero.
    pub async fn resolve(
        &self,
        ids: &BTreeSet<ItemId>,
    ) -> Result<BTreeMap<ItemId, PriceQuote>, PriceError> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let all: Vec<ItemId> = ids.iter().copied().collect();
        let batches: Vec<Vec<ItemId>> = all
            .chunks(self.batch_size)
            .map(<[ItemId]>::to_vec)
            .collect();
        debug!(
            ids = all.len(),
            batches = batches.len(),
            "resolving market prices"
        );

        let results = join_all(batches.into_iter().map(|batch| self.fetch_batch(batch))).await;

        let mut quotes = BTreeMap::new();
        for result in results {
            for listing in result? {
                let quote = PriceQuote::from(listing);
                quotes.insert(quote.item_id, quote);
            }
        }
        for id in ids {
            quotes.entry(*id).or_insert_with(|| PriceQuote::unlisted(*id));
        }
        Ok(quotes)
    }

    async fn fetch_batch(&self, batch: Vec<ItemId>) -> Result<Vec<PriceListing>, PriceError> {
        let resource = Resource::Prices(batch);
        match self.fetcher.get(&resource, None).await {
            Ok(value) => Ok(decode(&resource, value)?),
            // The bulk endpoint responds 404 when none of the requested ids
            // has a listing; that is an all-unlisted batch, not a failure.
            Err(FetchError::Malformed { reason, .. }) if reason.starts_with("404") => {
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }
}
