//! Error types for vending operations.

use thiserror::Error;

use crate::Amount;

/// Top-level error returned by [`VendingMachine`](super::VendingMachine) operations.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Tray(#[from] TrayError),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error("invalid service items: {0}")]
    InvalidServiceItems(#[from] ServiceError),
}

/// Error raised by the change tray while handling money.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrayError {
    #[error("invalid coin amount: {0}")]
    InvalidCoin(Amount),

    #[error("insufficient funds, need {shortfall} more")]
    InsufficientFunds { shortfall: Amount },

    #[error("not enough change available to return {0}")]
    ChangeUnavailable(Amount),
}

/// Error raised by an item record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("item out of stock: {0}")]
    OutOfStock(String),
}

/// Reasons a servicing payload is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("item name is empty")]
    EmptyName,

    #[error("item {name} has non-positive price {price}")]
    NonPositivePrice { name: String, price: Amount },

    #[error("item {0} is listed more than once")]
    DuplicateName(String),
}
