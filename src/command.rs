use rust_decimal::{
    Decimal,
    prelude::{ToPrimitive, Zero},
};
use serde::Deserialize;
use thiserror::Error;

use crate::ledger::{AccountId, NATIVE_DECIMALS};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Contribute,
    Withdraw,
    CheaperWithdraw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowCommand {
    Contribute { funder: AccountId, amount: u128 },
    Withdraw { caller: AccountId },
    CheaperWithdraw { caller: AccountId },
}

#[derive(Debug, Error)]
pub enum EscrowCommandError {
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: OperationKind },
    #[error("Amount must not be negative")]
    NegativeAmount,
    #[error("Amount carries more than {NATIVE_DECIMALS} fractional digits")]
    ExcessPrecision,
    #[error("Amount does not fit into base units")]
    AmountOutOfRange,
}

impl EscrowCommand {
    pub fn parse(
        caller: AccountId,
        kind: OperationKind,
        amount: Option<Decimal>,
    ) -> Result<Self, EscrowCommandError> {
        match kind {
            OperationKind::Contribute => {
                let Some(amount) = amount else {
                    return Err(EscrowCommandError::AmountRequired { kind });
                };
                Ok(Self::Contribute {
                    funder: caller,
                    amount: to_base_units(amount)?,
                })
            }
            OperationKind::Withdraw => Ok(Self::Withdraw { caller }),
            OperationKind::CheaperWithdraw => Ok(Self::CheaperWithdraw { caller }),
        }
    }
}

/// Scales a human-denominated native amount (e.g. `1.5` units) into an
/// integer count of base units. The core only ever sees the integer.
fn to_base_units(amount: Decimal) -> Result<u128, EscrowCommandError> {
    if amount < Decimal::zero() {
        return Err(EscrowCommandError::NegativeAmount);
    }
    let base = amount
        .checked_mul(Decimal::from(10u64.pow(NATIVE_DECIMALS)))
        .ok_or(EscrowCommandError::AmountOutOfRange)?
        .normalize();
    if base.scale() != 0 {
        return Err(EscrowCommandError::ExcessPrecision);
    }
    base.to_u128().ok_or(EscrowCommandError::AmountOutOfRange)
}
