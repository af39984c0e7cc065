//! Core domain types for the vending machine.

use std::fmt;

use crate::Amount;
use crate::inventory::Item;
use crate::machine::CoinReserve;

/// A coin face value the machine accepts and dispenses.
///
/// Declaration order is ascending by value, so the derived `Ord` sorts
/// coins the same way their amounts do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Denomination {
    FiveCents,
    TenCents,
    Quarter,
    Unit,
}

impl Denomination {
    /// Every denomination, largest first. This is the order change is
    /// counted out in.
    pub const DESCENDING: [Denomination; 4] = [
        Denomination::Unit,
        Denomination::Quarter,
        Denomination::TenCents,
        Denomination::FiveCents,
    ];

    pub const fn value(self) -> Amount {
        match self {
            Denomination::FiveCents => Amount::from_cents(5),
            Denomination::TenCents => Amount::from_cents(10),
            Denomination::Quarter => Amount::from_cents(25),
            Denomination::Unit => Amount::from_cents(100),
        }
    }

    /// Exact match against the known face values.
    pub fn from_amount(amount: Amount) -> Option<Self> {
        Self::DESCENDING.into_iter().find(|d| d.value() == amount)
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// A command representing the possible inputs of the machine.
#[derive(Debug, Clone)]
pub enum Command {
    /// Put a coin in the slot.
    InsertMoney { amount: Amount },
    /// Hand back everything inserted so far.
    ReturnCoin,
    /// Buy an item; the name goes through normalization first.
    SelectItem { name: String },
    /// Replace the coin reserve and the whole inventory.
    Service {
        reserve: CoinReserve,
        items: Vec<Item>,
    },
}

/// Something that drops out of the machine's tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Item(String),
    Coin(Denomination),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Item(name) => f.write_str(name),
            Output::Coin(coin) => write!(f, "{coin}"),
        }
    }
}
