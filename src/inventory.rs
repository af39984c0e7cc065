//! Item records and the inventory that owns them.

use std::collections::{BTreeMap, HashSet};

use crate::Amount;
use crate::machine::{ItemError, ServiceError};

/// Stable handle to an item inside an [`Inventory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

/// A product slot: unique name, fixed price and remaining stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    name: String,
    price: Amount,
    quantity: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, price: Amount, quantity: u32) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Amount {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }

    pub fn decrease_quantity(&mut self) -> Result<(), ItemError> {
        if self.quantity == 0 {
            return Err(ItemError::OutOfStock(self.name.clone()));
        }
        self.quantity -= 1;
        Ok(())
    }

    /// Check the record can be sold: a name to select it by and a price
    /// above zero.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::EmptyName);
        }
        if self.price <= Amount::ZERO {
            return Err(ServiceError::NonPositivePrice {
                name: self.name.clone(),
                price: self.price,
            });
        }
        Ok(())
    }
}

/// Owns item records, keyed by [`ItemId`] in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<ItemId, Item>,
    next_id: u32,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory, validating every record before accepting any.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Result<Self, ServiceError> {
        let items: Vec<Item> = items.into_iter().collect();

        let mut seen = HashSet::new();
        for item in &items {
            item.validate()?;
            if !seen.insert(item.name()) {
                return Err(ServiceError::DuplicateName(item.name().to_string()));
            }
        }

        let mut inventory = Self::new();
        for item in items {
            inventory.insert(item);
        }
        Ok(inventory)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add_item(&mut self, item: Item) -> Result<ItemId, ServiceError> {
        item.validate()?;
        if self.find_item_by_name(item.name()).is_some() {
            return Err(ServiceError::DuplicateName(item.name().to_string()));
        }
        Ok(self.insert(item))
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        self.items.remove(&id)
    }

    pub fn find_item_by_name(&self, name: &str) -> Option<ItemId> {
        self.items
            .iter()
            .find(|(_, item)| item.name() == name)
            .map(|(id, _)| *id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    fn insert(&mut self, item: Item) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, item);
        id
    }
}

/// Canonical names for the selection tokens printed on the machine.
const NAME_MAP: [(&str, &str); 3] = [("WATER", "Water"), ("JUICE", "Juice"), ("SODA", "Soda")];

/// Map a selection token such as `" get-water"` to its item name.
///
/// Matching is case-insensitive, ignores surrounding whitespace and an
/// optional `GET-` prefix. Input that matches nothing is returned unchanged.
pub fn normalize_item_name(input: &str) -> String {
    let key = input.trim().to_ascii_uppercase();
    let key = key.strip_prefix("GET-").unwrap_or(&key);

    NAME_MAP
        .iter()
        .find(|(token, _)| *token == key)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| input.to_string())
}
