//! JSON shapes returned by the account endpoints.
//!
//! Inventory-like payloads are lists of slots with `null` holes for empty
//! positions. A slot's quantity lives under one of three keys depending on
//! the endpoint and item kind; [`Slot::quantity`] is the one place that
//! fallback order is defined. All conversions accumulate through
//! [`Inventory::record`], which owns the canonical merge rule.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{CurrencyId, Inventory, ItemId, Wallet};

#[derive(Debug, Error)]
#[error("slot for item {item_id} has none of charges, count, or value")]
pub(crate) struct BadSlot {
    item_id: u32,
}

/// One occupied slot of a bank tab, material storage, shared inventory, or
/// character bag.
#[derive(Debug, Deserialize)]
pub(crate) struct Slot {
    pub id: u32,
    #[serde(default)]
    pub charges: Option<u64>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub value: Option<u64>,
}

impl Slot {
    /// Charged items report `charges`, stacks report `count`, wallet-style
    /// entries report `value`; checked in that order.
    fn quantity(&self) -> Result<u64, BadSlot> {
        self.charges
            .or(self.count)
            .or(self.value)
            .ok_or(BadSlot { item_id: self.id })
    }
}

/// Sum a slot list into an inventory, skipping `null` holes.
pub(crate) fn slots_to_inventory(
    slots: impl IntoIterator<Item = Option<Slot>>,
) -> Result<Inventory, BadSlot> {
    let mut inventory = Inventory::new();
    for slot in slots.into_iter().flatten() {
        inventory.record(ItemId::new(slot.id), slot.quantity()?);
    }
    Ok(inventory)
}

/// One wallet balance.
#[derive(Debug, Deserialize)]
pub(crate) struct WalletEntry {
    pub id: u32,
    pub value: u64,
}

pub(crate) fn entries_to_wallet(entries: Vec<WalletEntry>) -> Wallet {
    entries
        .into_iter()
        .map(|entry| (CurrencyId::new(entry.id), entry.value))
        .collect()
}

/// A character's bag contents. Bags themselves can be `null` (empty bag
/// slot), as can positions inside a bag.
#[derive(Debug, Deserialize)]
pub(crate) struct CharacterBags {
    #[serde(default)]
    pub bags: Vec<Option<Bag>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Bag {
    #[serde(default)]
    pub inventory: Vec<Option<Slot>>,
}

impl CharacterBags {
    pub fn into_inventory(self) -> Result<Inventory, BadSlot> {
        let mut inventory = Inventory::new();
        for bag in self.bags.into_iter().flatten() {
            inventory.merge(slots_to_inventory(bag.inventory)?);
        }
        Ok(inventory)
    }
}

/// A character's equipped items. Each equipped piece counts once.
#[derive(Debug, Deserialize)]
pub(crate) struct CharacterEquipment {
    #[serde(default)]
    pub equipment: Vec<EquipmentPiece>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EquipmentPiece {
    pub id: u32,
    #[serde(default)]
    pub count: Option<u64>,
}

impl CharacterEquipment {
    pub fn into_inventory(self) -> Inventory {
        let mut inventory = Inventory::new();
        for piece in self.equipment {
            inventory.record(ItemId::new(piece.id), piece.count.unwrap_or(1));
        }
        inventory
    }
}
