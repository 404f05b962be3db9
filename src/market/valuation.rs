use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PriceQuote;
use crate::models::{CurrencyId, Diff, ItemId};

/// Which side of the market priced an item entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceSide {
    /// Net gain, valued at what selling it would realize.
    Sell,
    /// Net loss, valued at what replacing it would cost.
    Buy,
}

/// One item's contribution to the report.
#[derive(Debug, Clone, Serialize)]
pub struct ItemEntry {
    pub item_id: ItemId,
    pub delta: i64,
    pub side: PriceSide,
    /// Unit price applied. `None` when the item has no market price; the
    /// entry then contributes zero but stays in the breakdown.
    pub unit_price_used: Option<u32>,
    pub value: i64,
}

impl ItemEntry {
    pub fn is_priced(&self) -> bool {
        self.unit_price_used.is_some()
    }
}

/// One currency's contribution to the report.
#[derive(Debug, Clone, Serialize)]
pub struct CurrencyEntry {
    pub currency_id: CurrencyId,
    pub delta: i64,
    /// False when the currency has no fixed conversion to gold; the entry
    /// then contributes zero but stays in the breakdown.
    pub convertible: bool,
    pub value: i64,
}

/// Gold-equivalent valuation of a diff. Immutable once computed; safe to
/// hand to a rendering thread while a new capture runs.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationReport {
    start_captured_at: DateTime<Utc>,
    end_captured_at: DateTime<Utc>,
    items: Vec<ItemEntry>,
    currencies: Vec<CurrencyEntry>,
    total: i64,
}

impl ValuationReport {
    pub fn start_captured_at(&self) -> DateTime<Utc> {
        self.start_captured_at
    }

    pub fn end_captured_at(&self) -> DateTime<Utc> {
        self.end_captured_at
    }

    pub fn items(&self) -> &[ItemEntry] {
        &self.items
    }

    pub fn currencies(&self) -> &[CurrencyEntry] {
        &self.currencies
    }

    /// Grand total in copper, summed over every entry.
    pub fn total(&self) -> i64 {
        self.total
    }
}

/// Fixed gold conversion per currency. Coin is gold itself and converts at
/// face value; no other wallet currency has a market conversion.
fn face_value(currency: CurrencyId, delta: i64) -> Option<i64> {
    (currency == CurrencyId::COIN).then_some(delta)
}

/// Value `diff` at `prices`.
///
/// A positive delta (net gained) is valued at the sell-side unit price,
/// what selling the gained items would realize. A negative delta (net
/// consumed) is valued at the buy-side unit price, what replacing them
/// would cost. Items without a market price and currencies without a gold
/// conversion stay in the breakdown with zero contribution, never silently
/// dropped.
///
/// Prices are applied strictly after the diff is fixed: an item absent from
/// the diff cannot influence the report no matter how its price moved.
pub fn valuate(diff: &Diff, prices: &BTreeMap<ItemId, PriceQuote>) -> ValuationReport {
    let mut total: i64 = 0;

    let items: Vec<ItemEntry> = diff
        .item_deltas()
        .iter()
        .map(|(&item_id, &delta)| {
            let quote = prices.get(&item_id);
            let (side, unit_price) = if delta >= 0 {
                (PriceSide::Sell, quote.and_then(|q| q.sell_unit_price))
            } else {
                (PriceSide::Buy, quote.and_then(|q| q.buy_unit_price))
            };
            let value = unit_price.map_or(0, |price| delta * i64::from(price));
            total += value;
            ItemEntry {
                item_id,
                delta,
                side,
                unit_price_used: unit_price,
                value,
            }
        })
        .collect();

    let currencies: Vec<CurrencyEntry> = diff
        .currency_deltas()
        .iter()
        .map(|(&currency_id, &delta)| match face_value(currency_id, delta) {
            Some(value) => {
                total += value;
                CurrencyEntry {
                    currency_id,
                    delta,
                    convertible: true,
                    value,
                }
            }
            None => CurrencyEntry {
                currency_id,
                delta,
                convertible: false,
                value: 0,
            },
        })
        .collect();

    ValuationReport {
        start_captured_at: diff.start_captured_at(),
        end_captured_at: diff.end_captured_at(),
        items,
        currencies,
        total,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Inventory, Snapshot, Wallet};

    fn snapshot(secs: i64, items: &[(u32, u64)], coins: u64) -> Snapshot {
        let captured_at = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        let items: Inventory = items
            .iter()
            .map(|&(id, quantity)| (ItemId::new(id), quantity))
            .collect();
        let currencies: Wallet = [(CurrencyId::COIN, coins)].into_iter().collect();
        Snapshot::new(captured_at, currencies, items)
    }

    fn quote(id: u32, buy: u32, sell: u32) -> (ItemId, PriceQuote) {
        (
            ItemId::new(id),
            PriceQuote::new(ItemId::new(id), Some(buy), Some(sell)),
        )
    }

    #[test]
    fn gains_use_sell_price_and_losses_use_buy_price() {
        let start = snapshot(0, &[(10, 5), (20, 5)], 0);
        let end = snapshot(60, &[(10, 8), (20, 2)], 0);
        let diff = Diff::between(&start, &end);

        let prices: BTreeMap<ItemId, PriceQuote> =
            [quote(10, 60, 50), quote(20, 60, 50)].into_iter().collect();
        let report = valuate(&diff, &prices);

        let gained = &report.items()[0];
        assert_eq!(gained.delta, 3);
        assert_eq!(gained.side, PriceSide::Sell);
        assert_eq!(gained.unit_price_used, Some(50));
        assert_eq!(gained.value, 3 * 50);

        let consumed = &report.items()[1];
        assert_eq!(consumed.delta, -3);
        assert_eq!(consumed.side, PriceSide::Buy);
        assert_eq!(consumed.unit_price_used, Some(60));
        assert_eq!(consumed.value, -3 * 60);
    }

    #[test]
    fn session_scenario_totals_correctly() {
        // Item X drops from 10 to 4 while gold rises from 1000 to 1500;
        // X trades at buy 60 / sell 50.
        let start = snapshot(0, &[(42, 10)], 1000);
        let end = snapshot(3600, &[(42, 4)], 1500);
        let diff = Diff::between(&start, &end);

        let prices: BTreeMap<ItemId, PriceQuote> = [quote(42, 60, 50)].into_iter().collect();
        let report = valuate(&diff, &prices);

        assert_eq!(report.items().len(), 1);
        assert_eq!(report.items()[0].delta, -6);
        assert_eq!(report.items()[0].value, -360);
        assert_eq!(report.currencies().len(), 1);
        assert_eq!(report.currencies()[0].value, 500);
        assert_eq!(report.total(), 140);
    }

    #[test]
    fn unpriced_items_are_kept_with_zero_contribution() {
        let start = snapshot(0, &[], 0);
        let end = snapshot(60, &[(77, 3)], 0);
        let diff = Diff::between(&start, &end);

        let prices: BTreeMap<ItemId, PriceQuote> =
            [(ItemId::new(77), PriceQuote::unlisted(ItemId::new(77)))]
                .into_iter()
                .collect();
        let report = valuate(&diff, &prices);

        assert_eq!(report.items().len(), 1);
        assert!(!report.items()[0].is_priced());
        assert_eq!(report.items()[0].value, 0);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn missing_quote_is_treated_as_unpriced() {
        let start = snapshot(0, &[(77, 1)], 0);
        let end = snapshot(60, &[(77, 4)], 0);
        let diff = Diff::between(&start, &end);

        let report = valuate(&diff, &BTreeMap::new());
        assert_eq!(report.items().len(), 1);
        assert!(!report.items()[0].is_priced());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn non_coin_currencies_are_flagged_not_valued() {
        let captured_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let start = Snapshot::new(
            captured_at,
            [(CurrencyId::new(2), 1000u64)].into_iter().collect(),
            Inventory::new(),
        );
        let end = Snapshot::new(
            captured_at + chrono::Duration::minutes(5),
            [(CurrencyId::new(2), 4000u64)].into_iter().collect(),
            Inventory::new(),
        );
        let diff = Diff::between(&start, &end);

        let report = valuate(&diff, &BTreeMap::new());
        assert_eq!(report.currencies().len(), 1);
        assert!(!report.currencies()[0].convertible);
        assert_eq!(report.currencies()[0].delta, 3000);
        assert_eq!(report.currencies()[0].value, 0);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn empty_diff_values_to_zero() {
        let snap = snapshot(0, &[(10, 5)], 1000);
        let diff = Diff::between(&snap, &snap);

        let report = valuate(&diff, &BTreeMap::new());
        assert!(report.items().is_empty());
        assert!(report.currencies().is_empty());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn report_carries_both_capture_timestamps() {
        let start = snapshot(0, &[], 100);
        let end = snapshot(60, &[], 200);
        let diff = Diff::between(&start, &end);

        let report = valuate(&diff, &BTreeMap::new());
        assert_eq!(report.start_captured_at(), start.captured_at());
        assert_eq!(report.end_captured_at(), end.captured_at());
    }
}
