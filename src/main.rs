use std::{env, io, process};

use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use vending_machine::MachineConfig;
use vending_machine::csv::{read_sessions, write_receipts};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .expect("usage: vending-machine <sessions.csv>");

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = MachineConfig::from_env().unwrap_or_else(|e| {
        error!("{e}");
        process::exit(2);
    });
    let mut machine = config.build().unwrap_or_else(|e| {
        error!("{e}");
        process::exit(2);
    });
    let sessions = read_sessions(path, config).unwrap_or_else(|e| {
        error!("{e}");
        process::exit(2);
    });

    let (session_sender, session_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in sessions {
            match result {
                Ok(session) => {
                    if session_sender.send(session).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    let receipts = machine.run(ReceiverStream::new(session_receiver)).await;

    if let Err(e) = write_receipts(receipts, io::stdout().lock()) {
        error!("{e}");
        process::exit(1);
    }
}
