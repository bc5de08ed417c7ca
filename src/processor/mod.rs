use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    command::{EscrowCommandError, OperationKind},
    ledger::{AccountId, LedgerError, NATIVE_DECIMALS},
    oracle::OracleError,
    transfer::{TransferError, ValueTransfer},
};

pub mod in_memory_processor;

/// Smallest accepted contribution, denominated in reference units scaled
/// by `10^NATIVE_DECIMALS` (50 reference units).
pub const MINIMUM_REFERENCE_VALUE: u128 = 50 * 10u128.pow(NATIVE_DECIMALS);

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error(
        "Contribution worth {reference_value} reference base units is below the minimum of {minimum}"
    )]
    InsufficientContribution { reference_value: u128, minimum: u128 },
    #[error("Conversion of {amount} base units to reference value overflowed")]
    ConversionOverflow { amount: u128 },
    #[error(transparent)]
    CommandErr(#[from] EscrowCommandError),
    #[error(transparent)]
    LedgerErr(#[from] LedgerError),
    #[error(transparent)]
    OracleErr(#[from] OracleError),
    #[error(transparent)]
    TransferErr(#[from] TransferError),
}

pub trait EscrowProcessor {
    fn process_operation(
        &mut self,
        caller: AccountId,
        kind: OperationKind,
        amount: Option<Decimal>,
        sink: &mut dyn ValueTransfer,
    ) -> Result<(), EscrowError>;
}
