use std::io::Write;

use crate::ledger::AccountId;
use csv::Writer;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub account: AccountId,
    pub contributed: u128,
    pub received: u128,
}

pub fn print_report<W>(
    output: &mut W,
    rows: impl Iterator<Item = ReportRow>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for row in rows {
        if let Err(err) = writer.serialize(row) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
