//! Inventory and currency collaborator.
//!
//! Unlike the read-only oracles, the inventory is mutated by the battle: item
//! actions consume stock and the rewards calculator deposits currency and
//! drops.

use std::collections::BTreeMap;

use super::ItemId;
use crate::error::{BattleError, ErrorSeverity};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("not enough '{item}': have {available}, need {requested}")]
    Insufficient {
        item: ItemId,
        available: u32,
        requested: u32,
    },
}

impl BattleError for InventoryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Insufficient { .. } => "INVENTORY_INSUFFICIENT",
        }
    }
}

/// Item and currency store shared with the rest of the game.
pub trait InventoryService {
    fn quantity(&self, item: &ItemId) -> u32;

    /// Removes `quantity` units. Fails without side effects when short.
    fn consume(&mut self, item: &ItemId, quantity: u32) -> Result<(), InventoryError>;

    fn deposit_currency(&mut self, amount: u64);

    fn deposit_item(&mut self, item: &ItemId, quantity: u32);
}

/// In-memory inventory backed by a sorted ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LedgerInventory {
    items: BTreeMap<ItemId, u32>,
    currency: u64,
}

impl LedgerInventory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_item(mut self, item: impl Into<ItemId>, quantity: u32) -> Self {
        self.deposit_item(&item.into(), quantity);
        self
    }

    pub fn currency(&self) -> u64 {
        self.currency
    }

    pub fn items(&self) -> impl Iterator<Item = (&ItemId, u32)> {
        self.items.iter().map(|(item, quantity)| (item, *quantity))
    }
}

impl InventoryService for LedgerInventory {
    fn quantity(&self, item: &ItemId) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    fn consume(&mut self, item: &ItemId, quantity: u32) -> Result<(), InventoryError> {
        let available = self.quantity(item);
        if available < quantity {
            return Err(InventoryError::Insufficient {
                item: item.clone(),
                available,
                requested: quantity,
            });
        }
        let left = available - quantity;
        if left == 0 {
            self.items.remove(item);
        } else {
            self.items.insert(item.clone(), left);
        }
        Ok(())
    }

    fn deposit_currency(&mut self, amount: u64) {
        self.currency = self.currency.saturating_add(amount);
    }

    fn deposit_item(&mut self, item: &ItemId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.items.entry(item.clone()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_fails_without_side_effects() {
        let mut ledger = LedgerInventory::new().with_item("potion", 2);
        let potion = ItemId::new("potion");

        let err = ledger.consume(&potion, 3).unwrap_err();
        assert_eq!(
            err,
            InventoryError::Insufficient {
                item: potion.clone(),
                available: 2,
                requested: 3,
            }
        );
        assert_eq!(ledger.quantity(&potion), 2);

        ledger.consume(&potion, 2).unwrap();
        assert_eq!(ledger.quantity(&potion), 0);
        assert_eq!(ledger.items().count(), 0);
    }

    #[test]
    fn deposits_accumulate() {
        let mut ledger = LedgerInventory::new();
        ledger.deposit_currency(40);
        ledger.deposit_currency(2);
        ledger.deposit_item(&ItemId::new("ether"), 1);
        ledger.deposit_item(&ItemId::new("ether"), 2);
        assert_eq!(ledger.currency(), 42);
        assert_eq!(ledger.quantity(&ItemId::new("ether")), 3);
    }
}
