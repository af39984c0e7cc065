//! Machine configuration.
//!
//! Stock and coin reserve are loaded from csv files named by environment
//! variables, with fallback to the classic three-drink machine.

use std::env;

use thiserror::Error;

use crate::csv::{CsvError, read_items, read_reserve};
use crate::inventory::Inventory;
use crate::machine::{ChangeTray, ServiceError};
use crate::{Amount, CoinReserve, Item, VendingMachine};

/// Path to a csv of `name,price,quantity` rows.
pub const ITEMS_VAR: &str = "VENDING_ITEMS";

/// Path to a csv of `coin,count` rows.
pub const RESERVE_VAR: &str = "VENDING_RESERVE";

/// Starting stock and reserve; also the payload of a `SERVICE` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub reserve: CoinReserve,
    pub items: Vec<Item>,
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load {var}: {source}")]
    File { var: &'static str, source: CsvError },

    #[error("invalid stock: {0}")]
    Items(#[from] ServiceError),
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            reserve: CoinReserve::new(),
            items: vec![
                Item::new("Water", Amount::from_cents(65), 10),
                Item::new("Juice", Amount::from_cents(100), 10),
                Item::new("Soda", Amount::from_cents(150), 10),
            ],
        }
    }
}

impl MachineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Unset variables keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ITEMS_VAR) {
            config.items = read_items(&path).map_err(|source| ConfigError::File {
                var: ITEMS_VAR,
                source,
            })?;
        }
        if let Some(path) = lookup(RESERVE_VAR) {
            config.reserve = read_reserve(&path).map_err(|source| ConfigError::File {
                var: RESERVE_VAR,
                source,
            })?;
        }

        // refuse stock the machine could not be serviced with
        Inventory::from_items(config.items.clone())?;

        Ok(config)
    }

    /// Build a machine holding this stock and reserve.
    pub fn build(&self) -> Result<VendingMachine, ServiceError> {
        let inventory = Inventory::from_items(self.items.clone())?;
        Ok(VendingMachine::new(inventory, ChangeTray::new(self.reserve)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Denomination;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_variables() {
        let config = MachineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, MachineConfig::default());
        assert_eq!(config.items.len(), 3);
        assert_eq!(config.reserve.total(), Amount::ZERO);
    }

    #[test]
    fn loads_files_named_by_variables() {
        let items = write_csv("name,price,quantity\nTea,0.75,2\n");
        let reserve = write_csv("coin,count\n0.25,4\n");
        let items_path = items.path().display().to_string();
        let reserve_path = reserve.path().display().to_string();

        let config = MachineConfig::from_lookup(|key| match key {
            ITEMS_VAR => Some(items_path.clone()),
            RESERVE_VAR => Some(reserve_path.clone()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.items, vec![Item::new("Tea", Amount::from_cents(75), 2)]);
        assert_eq!(config.reserve.count(Denomination::Quarter), 4);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = MachineConfig::from_lookup(|key| {
            (key == RESERVE_VAR).then(|| "no/such/reserve.csv".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::File {
                var: RESERVE_VAR,
                ..
            })
        ));
    }

    #[test]
    fn invalid_items_are_refused() {
        let items = write_csv("name,price,quantity\nTea,0.75,2\nTea,0.80,1\n");
        let path = items.path().display().to_string();

        let result = MachineConfig::from_lookup(|key| (key == ITEMS_VAR).then(|| path.clone()));
        assert!(matches!(
            result,
            Err(ConfigError::Items(ServiceError::DuplicateName(_)))
        ));
    }

    #[test]
    fn build_machine() {
        let machine = MachineConfig::default().build().unwrap();
        assert_eq!(machine.inventory().len(), 3);
        assert_eq!(machine.balance(), Amount::ZERO);
    }
}
