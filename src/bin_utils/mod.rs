//! This module could be a separate crate on its own, to bootstrap [`fund_ledger`] within binary
//! but for simplicitly purposes, I include this module directly in binary.

use std::collections::HashSet;
use std::io::{Read, Write};

use crate::{
    ledger::AccountId,
    oracle::PriceOracle,
    processor::{EscrowError, EscrowProcessor, in_memory_processor::InMemoryEscrowProcessor},
    transfer::InMemoryBank,
};
use anyhow::Result;
use csv_parser::CsvOperationParser;
use csv_printer::{ReportRow, print_report};
pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w> {
    pub owner: AccountId,
    pub oracle: Box<dyn PriceOracle>,
    pub price_feed_address: String,
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, EscrowError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvOperationParser::new(self.input);

        let mut processor =
            InMemoryEscrowProcessor::new(self.owner, self.oracle, self.price_feed_address);
        let mut bank = InMemoryBank::default();

        for (line, row) in parser {
            if let Err(err) =
                processor.process_operation(row.account, row.op, row.amount, &mut bank)
            {
                (self.error_printer)(line, err);
            }
        }

        // ledger entries first, then accounts that only ever received
        let ledger_accounts: HashSet<AccountId> =
            processor.ledger.balances().map(|(account, _)| account).collect();
        let ledger_rows = processor.ledger.balances().map(|(account, contributed)| ReportRow {
            account,
            contributed,
            received: bank.balance_of(account),
        });
        let bank_rows = bank
            .balances()
            .filter(|(account, _)| !ledger_accounts.contains(account))
            .map(|(account, received)| ReportRow {
                account,
                contributed: 0,
                received,
            });

        print_report(self.output, ledger_rows.chain(bank_rows))
    }
}
