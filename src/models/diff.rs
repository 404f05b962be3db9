use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::{CurrencyId, ItemId, Snapshot};

/// Non-zero quantity changes between two snapshots.
///
/// Recomputed per comparison and meaningless apart from the two snapshots it
/// was derived from, so it carries their capture timestamps. Prices play no
/// part in the computation: an item whose market price moved but whose
/// quantity did not can never appear here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    start_captured_at: DateTime<Utc>,
    end_captured_at: DateTime<Utc>,
    item_deltas: BTreeMap<ItemId, i64>,
    currency_deltas: BTreeMap<CurrencyId, i64>,
}

impl Diff {
    /// Compute `end - start`, treating absent ids as zero and keeping only
    /// non-zero deltas.
    ///
    /// Time order is not enforced: comparing snapshots out of order is
    /// accepted and logged at warning level, since the caller may be
    /// deliberately reversing a comparison.
    pub fn between(start: &Snapshot, end: &Snapshot) -> Diff {
        if end.captured_at() < start.captured_at() {
            tracing::warn!(
                start = %start.captured_at(),
                end = %end.captured_at(),
                "end snapshot was captured before start snapshot"
            );
        }

        let item_ids: BTreeSet<ItemId> = start.items().ids().chain(end.items().ids()).collect();
        let item_deltas = item_ids
            .into_iter()
            .filter_map(|id| {
                let delta = end.items().get(id) as i64 - start.items().get(id) as i64;
                (delta != 0).then_some((id, delta))
            })
            .collect();

        let currency_ids: BTreeSet<CurrencyId> = start
            .currencies()
            .ids()
            .chain(end.currencies().ids())
            .collect();
        let currency_deltas = currency_ids
            .into_iter()
            .filter_map(|id| {
                let delta = end.currencies().get(id) as i64 - start.currencies().get(id) as i64;
                (delta != 0).then_some((id, delta))
            })
            .collect();

        Diff {
            start_captured_at: start.captured_at(),
            end_captured_at: end.captured_at(),
            item_deltas,
            currency_deltas,
        }
    }

    pub fn start_captured_at(&self) -> DateTime<Utc> {
        self.start_captured_at
    }

    pub fn end_captured_at(&self) -> DateTime<Utc> {
        self.end_captured_at
    }

    pub fn item_deltas(&self) -> &BTreeMap<ItemId, i64> {
        &self.item_deltas
    }

    pub fn currency_deltas(&self) -> &BTreeMap<CurrencyId, i64> {
        &self.currency_deltas
    }

    /// Ids of every item that changed, for price resolution.
    pub fn changed_item_ids(&self) -> BTreeSet<ItemId> {
        self.item_deltas.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.item_deltas.is_empty() && self.currency_deltas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Inventory, Wallet};

    fn snapshot(secs: i64, items: &[(u32, u64)], currencies: &[(u32, u64)]) -> Snapshot {
        let captured_at = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        let items: Inventory = items
            .iter()
            .map(|&(id, quantity)| (ItemId::new(id), quantity))
            .collect();
        let currencies: Wallet = currencies
            .iter()
            .map(|&(id, amount)| (CurrencyId::new(id), amount))
            .collect();
        Snapshot::new(captured_at, currencies, items)
    }

    #[test]
    fn self_comparison_is_empty() {
        let snap = snapshot(0, &[(100, 10), (200, 3)], &[(1, 5000)]);
        let diff = Diff::between(&snap, &snap);
        assert!(diff.is_empty());
    }

    #[test]
    fn unchanged_quantities_never_appear() {
        let start = snapshot(0, &[(100, 10), (200, 3)], &[(1, 5000)]);
        let end = snapshot(60, &[(100, 10), (200, 7)], &[(1, 5000)]);
        let diff = Diff::between(&start, &end);

        assert!(!diff.item_deltas().contains_key(&ItemId::new(100)));
        assert_eq!(diff.item_deltas()[&ItemId::new(200)], 4);
        assert!(diff.currency_deltas().is_empty());
    }

    #[test]
    fn comparison_is_antisymmetric() {
        let a = snapshot(0, &[(100, 10), (200, 3)], &[(1, 5000), (2, 80)]);
        let b = snapshot(60, &[(100, 4), (300, 6)], &[(1, 9000)]);

        let forward = Diff::between(&a, &b);
        let backward = Diff::between(&b, &a);

        assert_eq!(
            forward.item_deltas().keys().collect::<Vec<_>>(),
            backward.item_deltas().keys().collect::<Vec<_>>()
        );
        for (id, delta) in forward.item_deltas() {
            assert_eq!(backward.item_deltas()[id], -delta);
        }
        for (id, delta) in forward.currency_deltas() {
            assert_eq!(backward.currency_deltas()[id], -delta);
        }
    }

    #[test]
    fn item_absent_from_end_counts_as_zero() {
        let start = snapshot(0, &[(500, 5)], &[]);
        let end = snapshot(60, &[], &[]);
        let diff = Diff::between(&start, &end);

        assert_eq!(diff.item_deltas()[&ItemId::new(500)], -5);
    }

    #[test]
    fn item_absent_from_start_counts_as_zero() {
        let start = snapshot(0, &[], &[]);
        let end = snapshot(60, &[(500, 5)], &[]);
        let diff = Diff::between(&start, &end);

        assert_eq!(diff.item_deltas()[&ItemId::new(500)], 5);
    }

    #[test]
    fn currency_delta_is_signed() {
        let start = snapshot(0, &[], &[(1, 1000)]);
        let end = snapshot(60, &[], &[(1, 1500)]);
        let diff = Diff::between(&start, &end);

        assert_eq!(diff.currency_deltas()[&CurrencyId::COIN], 500);
    }

    #[test]
    fn out_of_order_snapshots_still_diff() {
        let earlier = snapshot(0, &[(100, 1)], &[]);
        let later = snapshot(60, &[(100, 2)], &[]);

        // Reversed argument order is accepted; only the sign flips.
        let diff = Diff::between(&later, &earlier);
        assert_eq!(diff.item_deltas()[&ItemId::new(100)], -1);
    }

    #[test]
    fn changed_item_ids_matches_deltas() {
        let start = snapshot(0, &[(100, 1), (200, 2)], &[]);
        let end = snapshot(60, &[(100, 3), (200, 2)], &[]);
        let diff = Diff::between(&start, &end);

        let ids = diff.changed_item_ids();
        assert!(ids.contains(&ItemId::new(100)));
        assert!(!ids.contains(&ItemId::new(200)));
    }
}
