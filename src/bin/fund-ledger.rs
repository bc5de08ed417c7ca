use std::fs::File;

use anyhow::{Context, Result};
use fund_ledger::bin_utils::Service;
use fund_ledger::oracle::FixedRateOracle;

/// Reference units per native unit answered by the built-in feed, scaled
/// by `10^DEFAULT_FEED_DECIMALS`.
const DEFAULT_FEED_RATE: u128 = 2_000_00000000;
const DEFAULT_FEED_DECIMALS: u32 = 8;

fn main() -> Result<()> {
    let filename = std::env::args()
        .nth(1)
        .context("Expected a file name as the first argument")?;
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;
    let owner = match std::env::args().nth(2) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid owner account `{raw}`"))?,
        None => 0,
    };

    let service = Service {
        owner,
        oracle: Box::new(FixedRateOracle::new(
            DEFAULT_FEED_RATE,
            DEFAULT_FEED_DECIMALS,
        )),
        price_feed_address: "fixed-rate-feed".to_string(),
        input: file,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|line, err| {
            match err {
                fund_ledger::processor::EscrowError::CommandErr(err) => {
                    eprintln!("Error at line {line}: {err}")
                }
                fund_ledger::processor::EscrowError::OracleErr(err) => {
                    eprintln!("Error at line {line}: {err}")
                }
                _ => {
                    // these are not technical errors, so we don't need to print them
                }
            }
        }),
    };
    service.run()
}
