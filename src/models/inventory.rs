use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CurrencyId, ItemId};

/// Item quantities merged across storage locations.
///
/// This is the one place the canonical merge rule lives: quantities for the
/// same item id are summed, and zero quantities are never stored. Every
/// ingestion point (bank, material storage, shared inventory, character bags
/// and equipment) funnels through [`Inventory::record`], so the rule cannot
/// drift between resource types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: BTreeMap<ItemId, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of `id` to the running total. Zero quantities are
    /// dropped rather than materialized.
    pub fn record(&mut self, id: ItemId, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let total = self.items.entry(id).or_insert(0);
        *total = total.saturating_add(quantity);
    }

    /// Fold another inventory into this one, summing shared ids.
    pub fn merge(&mut self, other: Inventory) {
        for (id, quantity) in other.items {
            self.record(id, quantity);
        }
    }

    /// Quantity held for `id`; absent ids count as zero.
    pub fn get(&self, id: ItemId) -> u64 {
        self.items.get(&id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u64)> + '_ {
        self.items.iter().map(|(id, quantity)| (*id, *quantity))
    }
}

impl FromIterator<(ItemId, u64)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (ItemId, u64)>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for (id, quantity) in iter {
            inventory.record(id, quantity);
        }
        inventory
    }
}

/// Wallet balances, currency id to amount.
///
/// Same shape and merge rule as [`Inventory`], keyed by currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wallet {
    currencies: BTreeMap<CurrencyId, u64>,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: CurrencyId, amount: u64) {
        if amount == 0 {
            return;
        }
        let total = self.currencies.entry(id).or_insert(0);
        *total = total.saturating_add(amount);
    }

    pub fn merge(&mut self, other: Wallet) {
        for (id, amount) in other.currencies {
            self.record(id, amount);
        }
    }

    pub fn get(&self, id: CurrencyId) -> u64 {
        self.currencies.get(&id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CurrencyId> + '_ {
        self.currencies.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CurrencyId, u64)> + '_ {
        self.currencies.iter().map(|(id, amount)| (*id, *amount))
    }
}

impl FromIterator<(CurrencyId, u64)> for Wallet {
    fn from_iter<I: IntoIterator<Item = (CurrencyId, u64)>>(iter: I) -> Self {
        let mut wallet = Wallet::new();
        for (id, amount) in iter {
            wallet.record(id, amount);
        }
        wallet
    }
}
