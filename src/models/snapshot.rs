use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Inventory, Wallet};

/// Immutable aggregate of an account's wallet balances and item quantities
/// at one point in time.
///
/// `captured_at` is the instant the capture *started*; the individual
/// resource fetches complete in any order after it. A snapshot is only ever
/// constructed fully populated - a failed capture produces no snapshot at
/// all.
///
/// Serializable so the persistence layer can write and reload snapshots;
/// this crate performs no file I/O itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    captured_at: DateTime<Utc>,
    currencies: Wallet,
    items: Inventory,
}

impl Snapshot {
    pub fn new(captured_at: DateTime<Utc>, currencies: Wallet, items: Inventory) -> Self {
        Self {
            captured_at,
            currencies,
            items,
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn currencies(&self) -> &Wallet {
        &self.currencies
    }

    pub fn items(&self) -> &Inventory {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{CurrencyId, ItemId};

    #[test]
    fn snapshot_round_trips_through_json() {
        let captured_at = Utc.with_ymd_and_hms(2024, 3, 10, 18, 30, 0).unwrap();
        let snapshot = Snapshot::new(
            captured_at,
            [(CurrencyId::COIN, 125_000)].into_iter().collect(),
            [(ItemId::new(19700), 250), (ItemId::new(24295), 3)]
                .into_iter()
                .collect(),
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.captured_at(), captured_at);
        assert_eq!(back.items().get(ItemId::new(19700)), 250);
    }
}
