use serde::Deserialize;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::amount::AmountError;
use crate::machine::{Receipt, Session};
use crate::{Amount, CoinReserve, Command, Denomination, Item, MachineConfig};

/// Errors that can occur when reading or writing csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("cannot open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: {source}")]
    InvalidAmount { line: usize, source: AmountError },

    #[error("line {line}: {amount} is not a coin")]
    UnknownCoin { line: usize, amount: Amount },

    #[error("failed to write output: {0}")]
    Write(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    name: String,
    price: String,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct ReserveRow {
    coin: String,
    count: u32,
}

fn open(
    builder: &mut csv::ReaderBuilder,
    path: &Path,
) -> Result<csv::Reader<std::fs::File>, CsvError> {
    builder
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })
}

fn parse_amount(line: usize, text: &str) -> Result<Amount, CsvError> {
    text.parse()
        .map_err(|source| CsvError::InvalidAmount { line, source })
}

/// Read customer sessions from a csv file.
///
/// Every line is one session of comma-separated tokens: a decimal amount
/// inserts a coin, `RETURN-COIN` returns the balance, `SERVICE` restocks the
/// machine from `restock`, and anything else selects an item.
pub fn read_sessions(
    path: impl AsRef<Path>,
    restock: MachineConfig,
) -> Result<impl Iterator<Item = Result<Session, CsvError>>, CsvError> {
    let reader = open(
        csv::ReaderBuilder::new().has_headers(false).flexible(true),
        path.as_ref(),
    )?;

    Ok(reader
        .into_records()
        .enumerate()
        .map(move |(idx, result)| -> Result<Session, CsvError> {
            let record = result.map_err(|source| CsvError::Parse {
                line: idx + 1,
                source,
            })?;
            // comment lines are skipped, so take the line from the reader
            let line = record
                .position()
                .map_or(idx + 1, |pos| pos.line() as usize);
            let commands = record
                .iter()
                .filter(|token| !token.is_empty())
                .map(|token| parse_token(line, token, &restock))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Session { line, commands })
        }))
}

fn parse_token(line: usize, token: &str, restock: &MachineConfig) -> Result<Command, CsvError> {
    let looks_numeric = token.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '-');

    match token.to_ascii_uppercase().as_str() {
        "RETURN-COIN" => Ok(Command::ReturnCoin),
        "SERVICE" => Ok(Command::Service {
            reserve: restock.reserve,
            items: restock.items.clone(),
        }),
        _ if looks_numeric => Ok(Command::InsertMoney {
            amount: parse_amount(line, token)?,
        }),
        _ => Ok(Command::SelectItem {
            name: token.to_string(),
        }),
    }
}

/// Read item records (`name,price,quantity`) from a csv file with headers
pub fn read_items(path: impl AsRef<Path>) -> Result<Vec<Item>, CsvError> {
    let reader = open(&mut csv::ReaderBuilder::new(), path.as_ref())?;

    reader
        .into_deserialize::<ItemRow>()
        .enumerate()
        .map(|(idx, result)| -> Result<Item, CsvError> {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let price = parse_amount(line, &row.price)?;
            Ok(Item::new(row.name, price, row.quantity))
        })
        .collect()
}

/// Read coin counts (`coin,count`) from a csv file with headers.
/// Denominations that are not listed hold no coins.
pub fn read_reserve(path: impl AsRef<Path>) -> Result<CoinReserve, CsvError> {
    let reader = open(&mut csv::ReaderBuilder::new(), path.as_ref())?;

    reader
        .into_deserialize::<ReserveRow>()
        .enumerate()
        .map(|(idx, result)| -> Result<(Denomination, u32), CsvError> {
            let line = idx + 2;
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let amount = parse_amount(line, &row.coin)?;
            let coin = Denomination::from_amount(amount)
                .ok_or(CsvError::UnknownCoin { line, amount })?;
            Ok((coin, row.count))
        })
        .collect()
}

/// Write one line per receipt: the session's line number followed by every
/// item and coin it dispensed
pub fn write_receipts(
    receipts: impl IntoIterator<Item = Receipt>,
    out: impl io::Write,
) -> Result<(), CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(out);

    for receipt in receipts {
        let fields = std::iter::once(receipt.line.to_string())
            .chain(receipt.outputs.iter().map(ToString::to_string));
        writer.write_record(fields)?;
    }

    writer.flush().map_err(|e| CsvError::Write(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Output;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn sessions(content: &str) -> Vec<Result<Session, CsvError>> {
        let file = write_csv(content);
        read_sessions(file.path(), MachineConfig::default())
            .unwrap()
            .collect()
    }

    #[test]
    fn read_session_tokens() {
        let results = sessions("1, 0.25, 0.25, GET-SODA\n");
        assert_eq!(results.len(), 1);

        let session = results.into_iter().next().unwrap().unwrap();
        assert_eq!(session.line, 1);
        assert_eq!(session.commands.len(), 4);
        match &session.commands[0] {
            Command::InsertMoney { amount } => assert_eq!(*amount, Amount::from_cents(100)),
            other => panic!("expected insert, got {other:?}"),
        }
        match &session.commands[3] {
            Command::SelectItem { name } => assert_eq!(name, "GET-SODA"),
            other => panic!("expected select, got {other:?}"),
        }
    }

    #[test]
    fn read_return_and_service_keywords() {
        let results = sessions("0.10,return-coin\nSERVICE\n");
        assert_eq!(results.len(), 2);

        let first = results[0].as_ref().unwrap();
        assert!(matches!(first.commands[1], Command::ReturnCoin));

        let second = results[1].as_ref().unwrap();
        match &second.commands[0] {
            Command::Service { reserve, items } => {
                assert_eq!(*reserve, CoinReserve::default());
                assert_eq!(items.len(), 3);
            }
            other => panic!("expected service, got {other:?}"),
        }
    }

    #[test]
    fn read_skips_comments_and_blank_tokens() {
        let results = sessions("# morning\n1,,GET-WATER,\n");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().commands.len(), 2);
    }

    #[test]
    fn read_returns_error_for_bad_amount() {
        let results = sessions("1, GET-WATER\n0.051, GET-WATER\n");
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::InvalidAmount { line: 2, .. }));
    }

    #[tokio::test]
    async fn read_sessions_from_owned_path_moves_into_task() {
        let file = write_csv("1, GET-WATER\nRETURN-COIN\n");
        let path = file.path().display().to_string();
        let sessions = read_sessions(path, MachineConfig::default()).unwrap();

        let lines = tokio::spawn(async move {
            sessions
                .map(|session| session.unwrap().line)
                .collect::<Vec<_>>()
        })
        .await
        .unwrap();

        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn read_sessions_missing_file() {
        let result = read_sessions("does/not/exist.csv", MachineConfig::default());
        assert!(matches!(result, Err(CsvError::Open { .. })));
    }

    #[test]
    fn read_items_file() {
        let file = write_csv("name,price,quantity\nTea,0.75,4\nCoffee, 1.25, 0\n");
        let items = read_items(file.path()).unwrap();
        assert_eq!(
            items,
            vec![
                Item::new("Tea", Amount::from_cents(75), 4),
                Item::new("Coffee", Amount::from_cents(125), 0),
            ]
        );
    }

    #[test]
    fn read_items_reports_line_of_bad_price() {
        let file = write_csv("name,price,quantity\nTea,0.75,4\nCoffee,cheap,1\n");
        let err = read_items(file.path()).unwrap_err();
        assert!(matches!(err, CsvError::InvalidAmount { line: 3, .. }));
    }

    #[test]
    fn read_reserve_file() {
        let file = write_csv("coin,count\n0.25,8\n1.00,2\n");
        let reserve = read_reserve(file.path()).unwrap();
        assert_eq!(reserve.count(Denomination::Quarter), 8);
        assert_eq!(reserve.count(Denomination::Unit), 2);
        assert_eq!(reserve.count(Denomination::FiveCents), 0);
    }

    #[test]
    fn read_reserve_rejects_unknown_coin() {
        let file = write_csv("coin,count\n0.50,8\n");
        let err = read_reserve(file.path()).unwrap_err();
        assert!(matches!(err, CsvError::UnknownCoin { line: 2, .. }));
    }

    #[test]
    fn write_receipt_lines() {
        let receipts = vec![
            Receipt {
                line: 1,
                outputs: vec![
                    Output::Item("Water".to_string()),
                    Output::Coin(Denomination::Quarter),
                    Output::Coin(Denomination::TenCents),
                ],
            },
            Receipt {
                line: 2,
                outputs: Vec::new(),
            },
        ];

        let mut out = Vec::new();
        write_receipts(receipts, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1,Water,0.25,0.10\n2\n");
    }
}
