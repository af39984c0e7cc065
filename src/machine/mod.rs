//! Vending machine orchestration.
//!
//! The machine owns an inventory and a change tray and runs each purchase
//! as one transaction: every check happens before the first mutation, so a
//! refused purchase leaves stock, reserve and balance untouched.
//! Also supports an async stream of customer sessions.

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::inventory::{Inventory, Item, normalize_item_name};
use crate::model::{Command, Denomination, Output};

mod tray;
pub use tray::{Breakdown, ChangeTray, CoinReserve};

mod error;
pub use error::{ItemError, MachineError, ServiceError, TrayError};

/// A completed purchase: the item handed out and the change that came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    pub item: String,
    pub change: Breakdown,
}

impl Sale {
    /// Item name followed by every change coin, largest first.
    pub fn outputs(&self) -> Vec<Output> {
        std::iter::once(Output::Item(self.item.clone()))
            .chain(self.change.coins().map(Output::Coin))
            .collect()
    }
}

/// One line of customer input: the commands to apply in order.
#[derive(Debug, Clone)]
pub struct Session {
    pub line: usize,
    pub commands: Vec<Command>,
}

/// What a session produced, in the order it dropped out of the machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub line: usize,
    pub outputs: Vec<Output>,
}

/// The vending machine.
///
/// Every mutating operation takes `&mut self`, so one machine never has two
/// transactions in flight.
#[derive(Debug, Clone)]
pub struct VendingMachine {
    inventory: Inventory,
    tray: ChangeTray,
}

/// Public API
impl VendingMachine {
    pub fn new(inventory: Inventory, tray: ChangeTray) -> Self {
        Self { inventory, tray }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn tray(&self) -> &ChangeTray {
        &self.tray
    }

    pub fn balance(&self) -> Amount {
        self.tray.balance()
    }

    pub fn insert_money(&mut self, amount: Amount) -> Result<Denomination, MachineError> {
        Ok(self.tray.insert_coin(amount)?)
    }

    pub fn return_coin(&mut self) -> Breakdown {
        self.tray.return_coins()
    }

    /// Sell one unit of the named item:
    /// - Normalize the name and find the item
    /// - Ensure it is in stock and the balance covers the price
    /// - Ensure the reserve can pay the change
    /// - Decrement stock, pay out change, reset the balance
    pub fn select_item(&mut self, name: &str) -> Result<Sale, MachineError> {
        let normalized = normalize_item_name(name);
        let id = self
            .inventory
            .find_item_by_name(&normalized)
            .ok_or_else(|| MachineError::ItemNotFound(normalized.clone()))?;
        let item = self
            .inventory
            .item_mut(id)
            .ok_or_else(|| MachineError::ItemNotFound(normalized.clone()))?;

        if !item.is_in_stock() {
            return Err(ItemError::OutOfStock(normalized).into());
        }

        let price = item.price();
        let balance = self.tray.balance();
        if balance < price {
            return Err(TrayError::InsufficientFunds {
                shortfall: price - balance,
            }
            .into());
        }

        let change = balance - price;
        if !self.tray.has_enough_change(change) {
            return Err(TrayError::ChangeUnavailable(change).into());
        }

        // Nothing has changed up to here. `calculate_change` repeats the
        // check above, so neither commit step can fail.
        item.decrease_quantity()?;
        let breakdown = self.tray.calculate_change(price)?;

        Ok(Sale {
            item: normalized,
            change: breakdown,
        })
    }

    /// Replace the reserve and the whole inventory. The items are validated
    /// first; if any is refused nothing is replaced.
    pub fn service(&mut self, reserve: CoinReserve, items: Vec<Item>) -> Result<(), MachineError> {
        let inventory = Inventory::from_items(items)?;
        self.tray.set_available_change(reserve);
        self.inventory = inventory;
        Ok(())
    }

    /// Apply a single command on top of the current machine state, returning
    /// whatever it dispensed.
    pub fn apply(&mut self, command: Command) -> Result<Vec<Output>, MachineError> {
        match command {
            Command::InsertMoney { amount } => {
                let result = self.insert_money(amount).map(|_| Vec::new());
                Self::log_result("insert", Some(amount), None, &result);
                result
            }
            Command::ReturnCoin => {
                let returned = self.return_coin();
                let result: Result<Vec<Output>, MachineError> =
                    Ok(returned.coins().map(Output::Coin).collect());
                Self::log_result("return", Some(returned.total()), None, &result);
                result
            }
            Command::SelectItem { name } => {
                let result = self.select_item(&name).map(|sale| sale.outputs());
                Self::log_result("select", None, Some(&name), &result);
                result
            }
            Command::Service { reserve, items } => {
                let result = self.service(reserve, items).map(|()| Vec::new());
                Self::log_result("service", Some(reserve.total()), None, &result);
                result
            }
        }
    }

    /// Run the machine over a stream of sessions, returning one receipt per
    /// session. Refused commands are logged and skipped, as is a balance
    /// nobody collected by the end of the stream.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Session> + Unpin) -> Vec<Receipt> {
        let mut receipts = Vec::new();
        while let Some(session) = stream.next().await {
            let mut outputs = Vec::new();
            for command in session.commands {
                match self.apply(command) {
                    Ok(dispensed) => outputs.extend(dispensed),
                    Err(e) => warn!(line = session.line, "{e}"),
                }
            }
            receipts.push(Receipt {
                line: session.line,
                outputs,
            });
        }
        if !self.balance().is_zero() {
            warn!(balance = %self.balance(), "sessions ended with money still inserted");
        }
        receipts
    }
}

/// Private API
impl VendingMachine {
    /// Small helper to log `apply` results
    fn log_result<T, E: std::fmt::Display>(
        command: &str,
        amount: Option<Amount>,
        item: Option<&str>,
        result: &Result<T, E>,
    ) {
        match (result, amount, item) {
            (Ok(_), Some(amt), _) => info!(amount = %amt, "{command} applied"),
            (Ok(_), None, Some(item)) => info!(item, "{command} applied"),
            (Ok(_), None, None) => info!("{command} applied"),
            (Err(e), Some(amt), _) => info!(amount = %amt, reason = %e, "{command} skipped"),
            (Err(e), None, Some(item)) => info!(item, reason = %e, "{command} skipped"),
            (Err(e), None, None) => info!(reason = %e, "{command} skipped"),
        }
    }
}
