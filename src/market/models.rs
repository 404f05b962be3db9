use serde::{Deserialize, Serialize};

use crate::models::ItemId;

/// Current trading post prices for one item, in copper.
///
/// `None` marks "no market price": the item has no standing listing on that
/// side, or no tradable listing at all. Never encoded as a zero price, so
/// an unpriced item can be told apart from a worthless one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub item_id: ItemId,
    /// Highest standing buy order.
    pub buy_unit_price: Option<u32>,
    /// Lowest standing sell offer.
    pub sell_unit_price: Option<u32>,
}

impl PriceQuote {
    pub fn new(item_id: ItemId, buy_unit_price: Option<u32>, sell_unit_price: Option<u32>) -> Self {
        Self {
            item_id,
            buy_unit_price,
            sell_unit_price,
        }
    }

    /// Quote for an item the market does not list at all.
    pub fn unlisted(item_id: ItemId) -> Self {
        Self {
            item_id,
            buy_unit_price: None,
            sell_unit_price: None,
        }
    }

    pub fn is_listed(&self) -> bool {
        self.buy_unit_price.is_some() || self.sell_unit_price.is_some()
    }
}
