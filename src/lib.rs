pub mod amount;
pub mod config;
pub mod csv;
pub mod inventory;
pub mod machine;
pub mod model;

pub use amount::Amount;
pub use config::MachineConfig;
pub use inventory::{Inventory, Item, ItemId};
pub use machine::{ChangeTray, CoinReserve, VendingMachine};
pub use model::{Command, Denomination, Output};
