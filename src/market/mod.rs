//! Market pricing: bulk price resolution and diff valuation.

mod models;
mod resolver;
mod valuation;

pub use models::PriceQuote;
pub use resolver::{PriceError, PriceResolver};
pub use valuation::{valuate, CurrencyEntry, ItemEntry, PriceSide, ValuationReport};
